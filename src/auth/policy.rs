use super::role::Role;

/// What a route demands from the caller before its handler may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Public,
    AuthenticatedAny,
    RequiresRole(Role),
}

/// PathPattern
///
/// `Exact` matches one path. `Prefix` matches the path itself and every
/// sub-path below it, on segment boundaries: `Prefix("/api/recipes")` matches
/// `/api/recipes` and `/api/recipes/42` but not `/api/recipes-archive`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    Prefix(String),
}

impl PathPattern {
    pub fn exact(path: impl Into<String>) -> Self {
        PathPattern::Exact(path.into())
    }

    pub fn prefix(path: impl Into<String>) -> Self {
        PathPattern::Prefix(path.into().trim_end_matches('/').to_string())
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(exact) => path == exact,
            PathPattern::Prefix(prefix) => match path.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pub pattern: PathPattern,
    pub requirement: Requirement,
}

impl AccessRule {
    pub fn new(pattern: PathPattern, requirement: Requirement) -> Self {
        Self {
            pattern,
            requirement,
        }
    }
}

/// AccessPolicy
///
/// An ordered rule table. Precedence is declaration order: the first rule
/// whose pattern matches decides, so an exact rule that must win over a
/// broader prefix has to be declared before it. Paths no rule matches require
/// an authenticated caller.
///
/// The table is immutable once built and is shared read-only by all requests.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule with the lowest precedence so far.
    pub fn rule(mut self, pattern: PathPattern, requirement: Requirement) -> Self {
        self.rules.push(AccessRule::new(pattern, requirement));
        self
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    /// classify
    ///
    /// Returns the requirement of the first matching rule, or
    /// `AuthenticatedAny` when none match. The query string, if any, is ignored.
    pub fn classify(&self, path: &str) -> Requirement {
        let path = path.split('?').next().unwrap_or(path);
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(path))
            .map(|rule| rule.requirement)
            .unwrap_or(Requirement::AuthenticatedAny)
    }

    /// recipe_api
    ///
    /// The route table of this service:
    /// - signup and login are public,
    /// - listing every account is reserved to ADMIN,
    /// - the recipe collection and everything below it is readable by anyone,
    /// - health and API documentation are public,
    /// - anything else needs a valid token.
    pub fn recipe_api() -> Self {
        Self::new()
            .rule(PathPattern::exact("/api/auth/signup"), Requirement::Public)
            .rule(PathPattern::exact("/api/auth/login"), Requirement::Public)
            .rule(
                PathPattern::exact("/api/auth/all-users"),
                Requirement::RequiresRole(Role::Admin),
            )
            .rule(PathPattern::prefix("/api/recipes"), Requirement::Public)
            .rule(PathPattern::exact("/health"), Requirement::Public)
            .rule(PathPattern::prefix("/swagger-ui"), Requirement::Public)
            .rule(PathPattern::prefix("/api-docs"), Requirement::Public)
    }
}
