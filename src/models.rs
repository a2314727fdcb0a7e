use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::auth::Role;

// --- Stored Records ---

/// User
///
/// An account as kept by the user repository. `password_hash` is an Argon2 PHC
/// string; the clear password never leaves the signup/login handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Human-facing identifier minted from the "user" sequence (e.g. `2025001`).
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

// --- Request Payloads ---

/// SignupRequest
///
/// Fields default to empty so a missing field is reported the same way as a
/// blank one. `role` defaults to CLIENT.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// --- Response Payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SignupResponse {
    pub message: String,
    pub user_id: String,
    pub role: Role,
}

/// LoginResponse
///
/// `token` goes into `Authorization: Bearer <token>` on later requests.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub user_id: String,
}

/// One row of the admin account listing. Carries no credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
        }
    }
}
