use axum::{
    Router,
    http::{HeaderName, StatusCode},
    middleware,
    response::Response,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Authentication core: tokens, access policy, per-request filter, enforcement.
pub mod auth;
pub mod sequence;

// Service plumbing around the core.
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;

pub mod routes;
use routes::{auth as auth_routes, system};

// --- Public Re-exports ---

pub use auth::{AccessPolicy, AuthFilter, Principal, Role, TokenService};
pub use config::AppConfig;
pub use repository::{InMemoryUserRepository, PostgresRepository, UserRepositoryState};
pub use sequence::{InMemorySequenceStore, SequenceGenerator, SequenceStoreState};

/// ApiDoc
///
/// OpenAPI document for the account endpoints, served at
/// `/api-docs/openapi.json` and browsable under `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::signup, handlers::login, handlers::all_users, handlers::me),
    components(schemas(
        models::SignupRequest,
        models::SignupResponse,
        models::LoginRequest,
        models::LoginResponse,
        models::UserSummary,
        auth::Principal,
        auth::Role,
    )),
    tags((name = "recipe-api", description = "Recipe API accounts and authentication"))
)]
struct ApiDoc;

/// AppState
///
/// Everything a request may need, shared by all requests. Only the sequence
/// store and the user store hold mutable data, and both synchronise internally.
#[derive(Clone)]
pub struct AppState {
    pub users: UserRepositoryState,
    pub sequences: SequenceGenerator,
    pub tokens: Arc<TokenService>,
    pub policy: Arc<AccessPolicy>,
    pub config: AppConfig,
}

impl AppState {
    /// Wires the given stores with the default access policy and a token
    /// service holding a freshly generated secret.
    pub fn new(config: AppConfig, users: UserRepositoryState, sequences: SequenceStoreState) -> Self {
        Self {
            users,
            sequences: SequenceGenerator::new(sequences),
            tokens: Arc::new(TokenService::generate()),
            policy: Arc::new(AccessPolicy::recipe_api()),
            config,
        }
    }

    /// State backed entirely by process memory.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemorySequenceStore::default()),
        )
    }

    pub fn auth_filter(&self) -> AuthFilter {
        AuthFilter::new(Arc::clone(&self.tokens), Arc::clone(&self.policy))
    }
}

/// create_router
///
/// Assembles the routes and the middleware stack. Per request, from the
/// outside in: CORS, request id, tracing, the auth filter (attaches the
/// principal), enforcement (401/403), then the handler. Filter and enforcement
/// also wrap the fallback, so unknown paths are classified like any other.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(system::system_routes())
        .nest("/api/auth", auth_routes::auth_routes())
        .fallback(not_found)
        // Layers wrap outward: enforcement runs after the filter has populated the context.
        .layer(middleware::from_fn(auth::enforce_access))
        .layer(middleware::from_fn_with_state(
            state.auth_filter(),
            auth::auth_filter,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

async fn not_found() -> Response {
    error::json_error(StatusCode::NOT_FOUND, "not_found", "no such route")
}

/// trace_span_logger
///
/// Span for one HTTP request, tagged with the `x-request-id` set above so every
/// log line of the request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
