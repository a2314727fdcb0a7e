use crate::{
    AppState,
    auth::{Principal, Role},
    error::ApiError,
    models::{LoginRequest, LoginResponse, SignupRequest, SignupResponse, User, UserSummary},
    password,
};
use axum::{Json, extract::State};

/// Sequence namespace used to mint account ids.
pub const USER_SEQUENCE: &str = "user";

// --- Handlers ---

/// signup
///
/// [Public Route] Registers an account.
///
/// The configured admin username always receives ADMIN; anyone else gets the
/// requested role (CLIENT when omitted). The account id comes from the "user"
/// sequence; if the sequence cannot advance, nothing is stored.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Registered", body = SignupResponse),
        (status = 400, description = "Missing field, unknown role or username taken")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<SignupResponse>, ApiError> {
    if payload.username.trim().is_empty() || payload.password.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let role = if payload
        .username
        .eq_ignore_ascii_case(&state.config.admin_username)
    {
        Role::Admin
    } else {
        payload.role.as_deref().unwrap_or("CLIENT").parse::<Role>()?
    };

    if state.users.find_by_username(&payload.username).await?.is_some() {
        return Err(ApiError::UsernameTaken);
    }

    let password_hash =
        password::hash_password(&payload.password).map_err(|_| ApiError::PasswordHash)?;

    let sequence = state.sequences.get_next(USER_SEQUENCE).await?;
    let user_id = format!("{}{:03}", state.config.user_id_prefix, sequence);

    state
        .users
        .create_user(User {
            id: user_id.clone(),
            username: payload.username.clone(),
            password_hash,
            role,
        })
        .await?;

    tracing::info!(username = %payload.username, %role, %user_id, "account registered");

    Ok(Json(SignupResponse {
        message: "User registered successfully".to_string(),
        user_id,
        role,
    }))
}

/// login
///
/// [Public Route] Verifies credentials and returns a bearer token valid for 24 hours.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if payload.username.trim().is_empty() || payload.password.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let user = state
        .users
        .find_by_username(&payload.username)
        .await?
        .filter(|user| password::verify_password(&user.password_hash, &payload.password))
        .ok_or(ApiError::InvalidCredentials)?;

    let token = state.tokens.issue(&user.username, user.role)?;

    tracing::info!(username = %user.username, role = %user.role, "token issued");

    Ok(Json(LoginResponse {
        token,
        role: user.role,
        user_id: user.id,
    }))
}

/// all_users
///
/// [Admin Route] Lists every account. The ADMIN requirement is enforced by the
/// access policy before this handler runs.
#[utoipa::path(
    get,
    path = "/api/auth/all-users",
    responses(
        (status = 200, description = "All accounts", body = [UserSummary]),
        (status = 401, description = "No valid token"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn all_users(
    _admin: Principal,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = state.users.list_users().await?;
    Ok(Json(users.iter().map(UserSummary::from).collect()))
}

/// me
///
/// [Authenticated Route] Echoes the principal resolved from the bearer token.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current principal", body = Principal),
        (status = 401, description = "No valid token")
    )
)]
pub async fn me(principal: Principal) -> Json<Principal> {
    Json(principal)
}
