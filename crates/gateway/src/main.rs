//! Shelfmark API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Authentication and authorization
//! - Request routing
//! - Observability (logging, metrics)

mod handlers;

use axum::{
    routing::{get, patch, post},
    Extension, Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use shelfmark_common::{auth::JwtManager, config::AppConfig, db::DbPool, metrics};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    init_tracing(&config);

    info!("Starting Shelfmark API Gateway v{}", shelfmark_common::VERSION);

    // Initialize metrics
    if config.observability.metrics_port > 0 {
        PrometheusBuilder::new()
            .with_http_listener(SocketAddr::from((
                [0, 0, 0, 0],
                config.observability.metrics_port,
            )))
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                metrics::LATENCY_BUCKETS,
            )?
            .install()?;
    }
    metrics::register_metrics();

    let config = Arc::new(config);

    // Initialize database connection and apply migrations
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    db.migrate().await?;

    let jwt = Arc::new(JwtManager::new(
        &config.auth.jwt_secret,
        config.auth.jwt_expiration_secs,
    ));

    // Create app state
    let state = AppState {
        config: config.clone(),
        db,
    };

    // Build the router
    let app = create_router(state, jwt);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
fn create_router(state: AppState, jwt: Arc<JwtManager>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = TimeoutLayer::new(state.config.request_timeout());

    let api_routes = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Book endpoints
        .route(
            "/books/",
            get(handlers::books::list_books).post(handlers::books::create_book),
        )
        .route(
            "/books/{id}/",
            get(handlers::books::get_book)
                .put(handlers::books::update_book)
                .patch(handlers::books::partial_update_book)
                .delete(handlers::books::delete_book),
        )
        // Relation endpoints (looked up by book id)
        .route(
            "/relations/{book_id}/",
            patch(handlers::relations::update_relation).put(handlers::relations::update_relation),
        )
        // Auth endpoints
        .route("/auth/", get(handlers::auth::login_page))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login));

    // Compose the app
    Router::new()
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .layer(timeout)
        .layer(Extension(jwt))
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
