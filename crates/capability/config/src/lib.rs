//! 应用运行配置加载。
//!
//! 所有变量均为必填：任何一个缺失即启动失败（fail-fast）。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub postgres: PostgresConfig,
    pub logger: LoggerConfig,
}

/// 服务与流水线配置。
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// 队列容量与对 tester 的并发上限。
    pub max_objects_per_request: usize,
    /// 未再次确认在线的对象被逐出前的保留秒数。
    pub retention_policy_sec: u64,
    pub http: HttpConfig,
}

/// HTTP 进出口配置。
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub listen_port: u16,
    pub tester_host: String,
    pub tester_port: u16,
    pub timeout_sec: u64,
}

/// 日志配置。
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub is_production: bool,
}

/// Postgres 连接参数。
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub ssl_mode: String,
    pub pool_max_conns: u32,
}

impl PostgresConfig {
    /// 由各参数拼出连接 URL；连接池上限单独交给连接层。
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.database, self.ssl_mode
        )
    }
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            service: ServiceConfig {
                max_objects_per_request: read_usize("MAX_OBJECTS_PER_REQUEST")?,
                retention_policy_sec: read_u64("RETENTION_POLICY_SEC")?,
                http: HttpConfig {
                    listen_port: read_u16("LISTEN_PORT")?,
                    tester_host: read_var("TESTER_HOST")?,
                    tester_port: read_u16("TESTER_PORT")?,
                    timeout_sec: read_u64("TIMEOUT_SEC")?,
                },
            },
            postgres: PostgresConfig {
                user: read_var("POSTGRES_USER")?,
                password: read_var("POSTGRES_PASSWORD")?,
                host: read_var("POSTGRES_HOST")?,
                port: read_u16("POSTGRES_PORT")?,
                database: read_var("POSTGRES_DATABASE")?,
                ssl_mode: read_var("POSTGRES_SSL_MODE")?,
                pool_max_conns: read_u32("POSTGRES_POOL_MAX_CONNS")?,
            },
            logger: LoggerConfig {
                is_production: read_bool("IS_PRODUCTION")?,
            },
        })
    }
}

fn read_var(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key.to_string()))
}

fn read_u64(key: &str) -> Result<u64, ConfigError> {
    let value = read_var(key)?;
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u32(key: &str) -> Result<u32, ConfigError> {
    let value = read_var(key)?;
    value
        .parse::<u32>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u16(key: &str) -> Result<u16, ConfigError> {
    let value = read_var(key)?;
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_usize(key: &str) -> Result<usize, ConfigError> {
    let value = read_var(key)?;
    value
        .parse::<usize>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_bool(key: &str) -> Result<bool, ConfigError> {
    let value = read_var(key)?;
    value
        .parse::<bool>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}
