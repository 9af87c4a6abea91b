//! ABOUTME: HTTP+SSE transport (C11): wires every handler module into one
//! ABOUTME: axum router and exposes the `axum::serve` entry point

mod chat;
mod error;
mod evaluation;
mod health;
mod models;
mod monitoring;
mod state;
mod user;

pub use state::AppState;

use axum::Router;
use tower_http::trace::TraceLayer;

/// Assembles the full `/health`, `/chat`, `/models`, `/evaluation/*` and
/// `/monitoring/*` surface from §6 over one shared [`AppState`].
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health::health_handler))
        .route("/models", axum::routing::get(models::list_models))
        .merge(chat::router())
        .merge(evaluation::router())
        .merge(monitoring::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves the assembled router until the process is
/// terminated; mirrors the single-shot `listener -> axum::serve` idiom used
/// throughout the pack's own HTTP services.
pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "ragcore-api listening");
    axum::serve(listener, app).await?;
    Ok(())
}
