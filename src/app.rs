use axum::{body::Body, routing::get, Router};
use std::{net::SocketAddr, time::Duration};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{field, Span};

use crate::state::AppState;
use crate::{auth, game, news, scripts, stats};

/// Every resource router, mounted under `/api`.
fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(scripts::router())
        .merge(news::router())
        .merge(stats::router())
        .merge(game::router())
        .route("/health", get(|| async { "ok" }))
}

pub fn build_app(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|req: &axum::http::Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %req.method(),
                path = %req.uri().path(),
                status = field::Empty,
            )
        })
        .on_response(|res: &axum::http::Response<Body>, latency: Duration, span: &Span| {
            let status = res.status();
            span.record("status", field::display(status));
            let latency_ms = latency.as_millis() as u64;
            if status.is_server_error() {
                tracing::error!(%status, latency_ms, "response");
            } else if status.is_client_error() {
                tracing::warn!(%status, latency_ms, "response");
            } else {
                tracing::info!(%status, latency_ms, "response");
            }
        });

    Router::new()
        .nest("/api", api_routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(trace)
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port = std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into());
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "scripthub listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received Ctrl+C, shutting down");
            }
        })
        .await?;
    Ok(())
}
