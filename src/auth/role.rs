use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

/// Role
///
/// The closed set of roles an account can hold. Serialized as `"ADMIN"` /
/// `"CLIENT"` both in tokens and in JSON payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Role {
    Admin,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Client => "CLIENT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role `{0}`; expected ADMIN or CLIENT")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "CLIENT" => Ok(Role::Client),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Principal
///
/// The authenticated identity derived from a valid bearer token. Built by the
/// auth filter once per request and carried in that request's extensions; it
/// is never stored anywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Principal {
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}
