//! Server initialization and routing

use crate::config::{AppConfig, ServerConfig};
use crate::middleware::{api_key_auth, log_requests, request_id};
use crate::routes::{api_info, erase, health, history, not_found};
use crate::state::ServerState;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Build the router.
///
/// `/`, `/health`, `/ready` and `/metrics` are public; everything under
/// `/api` goes through [`api_key_auth`].
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let public_routes = Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics));

    let protected_routes = Router::new()
        .route("/api/erase", post(erase::submit_erase))
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .route("/api/erase/status", post(erase::erase_status))
        .route("/api/history", get(history::list_history))
        .route("/api/history/stats", get(history::history_stats))
        .route("/api/history/{token}", get(history::get_call))
        .route("/api/history/{token}/image", get(history::get_call_image))
        .layer(from_fn_with_state(state.clone(), api_key_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Install the global `tracing` subscriber. Safe to call more than once.
pub fn init_tracing(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);

    let result = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(err) = result {
        tracing::debug!(error = %err, "tracing subscriber already installed");
    }
}

/// Start the wmgate HTTP server and block until shutdown.
///
/// ```rust,no_run
/// use server::AppConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = AppConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
///
/// Shuts down gracefully on SIGTERM or Ctrl+C.
pub async fn start_server(config: AppConfig) -> anyhow::Result<()> {
    init_tracing(&config.server);

    let server_config = config.server.clone();
    let addr: SocketAddr = server_config.socket_addr()?;

    tracing::info!(
        store_backend = ?config.store.backend,
        store_path = %config.store.path,
        upload_endpoint = %config.upstream.endpoints.upload,
        benefit_policy = ?config.gateway.benefit_policy,
        "initializing gateway"
    );
    let state = Arc::new(ServerState::new(config)?);
    let app = build_router(state);

    tracing::info!(
        %addr,
        auth = server_config.auth_enabled(),
        api_keys = server_config.api_keys.len(),
        timeout_secs = server_config.timeout_secs,
        max_body_mb = server_config.max_body_size_mb,
        cors = server_config.enable_cors,
        metrics = server_config.metrics_enabled,
        "Starting wmgate server"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
