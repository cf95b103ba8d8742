//! 健康检查与指标快照。
//!
//! - GET /health
//! - GET /metrics

use axum::{Json, response::IntoResponse};
use presence_telemetry::metrics;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

pub async fn get_metrics() -> impl IntoResponse {
    Json(metrics().snapshot())
}
