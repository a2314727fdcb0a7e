use recipe_api::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::PostgresRepository,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, installs logging, picks the stores and serves HTTP.
/// The token signing secret is generated here, inside `AppState`, so every
/// restart invalidates all outstanding tokens.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load().expect("FATAL: invalid configuration");

    // 2. Logging: RUST_LOG wins, otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "recipe_api=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Stores: Postgres when configured, process memory otherwise.
    let app_state = match config.db_url.clone() {
        Some(db_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&db_url)
                .await
                .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

            let repo = PostgresRepository::new(pool);
            repo.ensure_schema()
                .await
                .expect("FATAL: Failed to create the database schema.");

            let repo = Arc::new(repo);
            AppState::new(config.clone(), repo.clone(), repo)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; accounts and sequences live in memory only");
            AppState::in_memory(config.clone())
        }
    };

    // 4. Router and server
    let app = create_router(app_state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener.");

    tracing::info!("Listening on {}", config.bind_addr);
    tracing::info!("API documentation available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
