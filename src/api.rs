//! HTTP routes: WebSocket endpoint plus read-only session endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::state::{AppState, SessionSnapshot};
use crate::ws;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health))
        .route("/api/session", get(get_session))
        .route("/api/results", get(get_results));

    if let Some(dir) = &state.config.static_dir {
        tracing::info!("Serving static files from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
    .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Current lifecycle state, poll, responses and roster.
///
/// GET /api/session
pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.snapshot().await)
}

/// Tabulated results of the running poll, or of the last ended one.
///
/// GET /api/results
pub async fn get_results(State(state): State<Arc<AppState>>) -> Response {
    match state.results().await {
        Some(results) => Json(results).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No poll has been run yet" })),
        )
            .into_response(),
    }
}
