use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Account Router Module
///
/// Mounted under `/api/auth`. Signup and login are public, `all-users` is
/// ADMIN-only and `me` needs any valid token (see `AccessPolicy::recipe_api`).
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        // POST /api/auth/signup
        .route("/signup", post(handlers::signup))
        // POST /api/auth/login
        // Returns the bearer token the other endpoints expect.
        .route("/login", post(handlers::login))
        // GET /api/auth/all-users
        .route("/all-users", get(handlers::all_users))
        // GET /api/auth/me
        .route("/me", get(handlers::me))
}
