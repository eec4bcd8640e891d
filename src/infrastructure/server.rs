// Server module - builds the router and runs the HTTP listener

use axum::Router;
use axum::http::Request;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::config::Config;
use super::state::AppState;
use crate::api;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the full router: API routes and the canonical 404 fallback, wrapped
/// in the HTTP layers
pub fn build_router(config: &Config, state: AppState) -> Router {
    let routes = Router::new()
        .nest("/api/v1", api::api_router(state))
        .fallback(api::error::not_found);
    with_http_layers(config, routes)
}

/// Request timeout, tracing, request IDs and CORS.
///
/// Every request gets an `X-Request-Id` (the caller's, or a fresh UUID) that
/// is echoed on the response and recorded on the request span, so error logs
/// emitted while handling it carry `request_id`.
pub fn with_http_layers(config: &Config, router: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = match config.http_timeout() {
        Some(timeout) => router.layer(TimeoutLayer::new(timeout)),
        None => router,
    };

    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
            let request_id = req
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                request_id = %request_id,
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
}

/// Serve until Ctrl-C is received
pub async fn serve(config: &Config, state: AppState) -> std::io::Result<()> {
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(config, state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
