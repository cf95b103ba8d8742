//! Tester 状态查询客户端。
//!
//! 对每个标识发起 `GET http://{host}:{port}/objects/{id}`，把响应体解码为
//! [`ObjectStatus`]。传输失败与解码失败同义于"无信息"：调用方记录日志后
//! 丢弃该标识，已有定时器继续倒计时。

use async_trait::async_trait;
use domain::ObjectStatus;
use std::time::Duration;

/// 查询错误。
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("client build error: {0}")]
    Build(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
}

/// 对象状态查询抽象。
#[async_trait]
pub trait StatusClient: Send + Sync {
    /// 查询单个标识的当前状态。响应体中的 `id` 为准，即使与请求的
    /// 标识不一致。
    async fn fetch_status(&self, id: i64) -> Result<ObjectStatus, ProbeError>;
}

/// HTTP 客户端配置。
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub tester_host: String,
    pub tester_port: u16,
    /// 单次请求超时（TIMEOUT_SEC）。
    pub timeout: Duration,
    /// 对 tester 的连接复用池大小（MAX_OBJECTS_PER_REQUEST）。
    pub pool_size: usize,
}

/// 基于 reqwest 的实现，连接池在任务间共享。
#[derive(Clone)]
pub struct HttpStatusClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStatusClient {
    pub fn new(config: ProbeConfig) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.pool_size)
            .build()
            .map_err(|err| ProbeError::Build(err.to_string()))?;
        Ok(Self {
            client,
            base_url: format!("http://{}:{}", config.tester_host, config.tester_port),
        })
    }

    fn object_url(&self, id: i64) -> String {
        format!("{}/objects/{}", self.base_url, id)
    }
}

#[async_trait]
impl StatusClient for HttpStatusClient {
    async fn fetch_status(&self, id: i64) -> Result<ObjectStatus, ProbeError> {
        let response = self
            .client
            .get(self.object_url(id))
            .send()
            .await
            .map_err(|err| ProbeError::Transport(err.to_string()))?;
        response
            .json::<ObjectStatus>()
            .await
            .map_err(|err| ProbeError::Decode(err.to_string()))
    }
}
