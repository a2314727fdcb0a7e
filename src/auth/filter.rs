use axum::{
    extract::{OriginalUri, Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{
    policy::{AccessPolicy, Requirement},
    role::Principal,
    token::TokenService,
};

/// RequestAuth
///
/// The request-scoped authentication context. Inserted into the request's
/// extensions by [`auth_filter`] and read by the enforcement step and by
/// handlers. It lives exactly as long as the request it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestAuth {
    pub requirement: Requirement,
    pub principal: Option<Principal>,
}

/// AuthFilter
///
/// Populates [`RequestAuth`] for every inbound request. It classifies the path,
/// validates a bearer token when one is presented and records the resulting
/// principal. It never rejects a request: a missing, malformed, tampered or
/// expired token simply leaves `principal` empty and the decision is taken
/// further down the stack.
#[derive(Clone)]
pub struct AuthFilter {
    tokens: Arc<TokenService>,
    policy: Arc<AccessPolicy>,
}

impl AuthFilter {
    pub fn new(tokens: Arc<TokenService>, policy: Arc<AccessPolicy>) -> Self {
        Self { tokens, policy }
    }

    /// evaluate
    ///
    /// The transport-independent part of the filter. A valid token is always
    /// recorded, even on public routes.
    pub fn evaluate(&self, path: &str, headers: &HeaderMap) -> RequestAuth {
        let requirement = self.policy.classify(path);

        let principal = bearer_token(headers).and_then(|token| {
            match self.tokens.validate(token) {
                Ok(principal) => {
                    tracing::debug!(
                        username = %principal.username,
                        role = %principal.role,
                        "bearer token accepted"
                    );
                    Some(principal)
                }
                Err(reason) => {
                    tracing::debug!(%reason, path, "bearer token ignored");
                    None
                }
            }
        });

        RequestAuth {
            requirement,
            principal,
        }
    }
}

/// auth_filter
///
/// Middleware wrapper around [`AuthFilter::evaluate`]. If the request already
/// carries a [`RequestAuth`] (the filter was layered twice) the existing
/// context is kept untouched, so the principal is populated once per request.
pub async fn auth_filter(
    State(filter): State<AuthFilter>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.extensions().get::<RequestAuth>().is_none() {
        // Nested routers rewrite the uri; classify the path the client asked for.
        let path = request
            .extensions()
            .get::<OriginalUri>()
            .map(|original| original.path().to_owned())
            .unwrap_or_else(|| request.uri().path().to_owned());
        let auth = filter.evaluate(&path, request.headers());
        request.extensions_mut().insert(auth);
    }

    next.run(request).await
}

/// Extracts the token from an `Authorization: Bearer <token>` header. Any other
/// scheme, a non-UTF-8 value or an empty token yields `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .trim();

    if token.is_empty() { None } else { Some(token) }
}
