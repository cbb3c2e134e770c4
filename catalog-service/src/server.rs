//! HTTP server with the standard middleware stack

use axum::Router;
use http::{header, HeaderName, StatusCode};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{
    config::Config,
    error::Result,
    handlers,
    state::AppState,
};

/// Apply the middleware stack to `app`
///
/// Outermost first: panic recovery, request ids, header masking, tracing,
/// body limit, timeout, compression, CORS.
pub fn with_middleware(app: Router, config: &Config) -> Router {
    let body_limit = config.middleware.body_limit_mb * 1024 * 1024;
    let request_id = HeaderName::from_static("x-request-id");

    app.layer(build_cors_layer(config))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(SetSensitiveRequestHeadersLayer::new([
            header::AUTHORIZATION,
            header::COOKIE,
        ]))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(CatchPanicLayer::new())
}

/// The full application: routes plus middleware
pub fn app(state: AppState) -> Router {
    let config = state.config().clone();
    with_middleware(handlers::router(state), &config)
}

/// Serve `state` on the configured port until SIGINT or SIGTERM
pub async fn serve(state: AppState) -> Result<()> {
    let config = state.config().clone();
    let addr = SocketAddr::from(([0, 0, 0, 0], config.service.port));

    tracing::info!("Starting {} on {}", config.service.name, addr);
    log_middleware_config(&config);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn log_middleware_config(config: &Config) {
    tracing::info!("Middleware configuration:");
    tracing::info!("  - Panic recovery: enabled");
    tracing::info!("  - Request ID tracking: enabled");
    tracing::info!("  - Sensitive header masking: enabled");
    tracing::info!(
        "  - Request body limit: {} MB",
        config.middleware.body_limit_mb
    );
    tracing::info!("  - Compression: enabled");
    tracing::info!("  - CORS mode: {}", config.middleware.cors_mode);
    tracing::info!("  - Request timeout: {} seconds", config.service.timeout_secs);
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    match config.middleware.cors_mode.as_str() {
        "permissive" => CorsLayer::permissive(),
        "restrictive" | "disabled" => CorsLayer::new(),
        other => {
            tracing::warn!("Unknown CORS mode: {}, defaulting to permissive", other);
            CorsLayer::permissive()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    tracing::info!("Shutdown signal received, draining requests...");
}
