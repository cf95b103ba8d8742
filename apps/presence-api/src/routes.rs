//! 路由定义
//!
//! - 回调入口：POST /callback
//! - 健康检查：GET /health
//! - 指标快照：GET /metrics

use super::AppState;
use super::handlers::*;
use axum::{
    Router,
    routing::{get, post},
};

/// 创建 API 路由。
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/callback", post(callback))
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
}
