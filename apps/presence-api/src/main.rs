//! Presence 服务入口：配置加载、存储初始化、流水线装配与 HTTP 服务。

mod handlers;
mod routes;

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::{self, Next},
    response::Response,
};
use presence_config::AppConfig;
use presence_pipeline::{Pipeline, PipelineConfig};
use presence_probe::{HttpStatusClient, ProbeConfig};
use presence_storage::{PgObjectStore, connect_pool, init_schema};
use presence_telemetry::{init_tracing, new_request_ids};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{Instrument, info};

/// 各 handler 共享的应用状态。构造一次，显式传递，不设全局单例。
#[derive(Clone)]
pub struct AppState {
    pub callback_tx: mpsc::Sender<i64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置；缺一即失败
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing(config.logger.is_production);

    // Postgres 连接池与单表 DDL
    let pool = connect_pool(&config.postgres.url(), config.postgres.pool_max_conns).await?;
    init_schema(&pool).await?;
    let store = Arc::new(PgObjectStore::new(pool));

    // tester 查询客户端
    let client = Arc::new(HttpStatusClient::new(ProbeConfig {
        tester_host: config.service.http.tester_host.clone(),
        tester_port: config.service.http.tester_port,
        timeout: Duration::from_secs(config.service.http.timeout_sec),
        pool_size: config.service.max_objects_per_request,
    })?);

    // 流水线与一次性的冷启动对账
    let pipeline = Pipeline::spawn(
        PipelineConfig {
            queue_capacity: config.service.max_objects_per_request,
            retention: Duration::from_secs(config.service.retention_policy_sec),
            fetch_concurrency: config.service.max_objects_per_request,
        },
        store,
        client,
    );
    pipeline.reconcile().await;

    let state = AppState {
        callback_tx: pipeline.input(),
    };
    let app = routes::create_api_router()
        .with_state(state)
        // 注入 request_id/trace_id
        .layer(middleware::from_fn(request_context));

    let addr = format!("0.0.0.0:{}", config.service.http.listen_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(target: "presence.server", addr = %addr, "server_started");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // HTTP 入口先停、流水线后停：关停时不再有生产者向队列写入。
    pipeline.shutdown().await;
    info!(target: "presence.server", "server_stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    // 生成 request_id 与 trace_id，并注入请求扩展与日志
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}
