//! Axum router wiring.
//!
//! A small API surface with admission applied to every route, the 404
//! fallback included.

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::{app_state::AppState, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api", get(api))
        .route("/metrics", get(metrics))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            transport::admission_guard,
        ))
        .with_state(state)
}

async fn root() -> &'static str {
    tracing::info!("hello from gatehouse");
    "hello from gatehouse"
}

async fn health(State(app): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "uptime_secs": app.uptime().as_secs(),
    }))
}

async fn api() -> impl IntoResponse {
    Json(json!({ "message": "gatehouse is running" }))
}

async fn metrics(State(app): State<AppState>) -> String {
    app.metrics()
        .render(&[("gatehouse_uptime_seconds", app.uptime().as_secs())])
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "route not found" })))
}
