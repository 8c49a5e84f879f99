use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::config::AppConfig;

pub mod password;

pub fn create_router(config: &AppConfig) -> Router {
    tracing::debug!("Creating application router");
    Router::new()
        .route("/health", get(health))
        .merge(password::router(config))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
