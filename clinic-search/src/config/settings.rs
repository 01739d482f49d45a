//! Environment configuration, read once at startup.

use std::net::SocketAddr;
use std::time::Duration;

use clinic_search_repository::SearchEngineConfig;
use tracing::warn;

use crate::AppError;

const DEFAULT_ENGINE_NODES: &str = "http://localhost:9200";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
const DEFAULT_SERVER_PORT: u16 = 3000;

/// Connection mode for the search engine at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Abort startup if the engine is still unreachable after the last attempt.
    FailFast,
    /// Start serving anyway and keep retrying in the background.
    Retry,
}

impl ConnectionMode {
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Defaults to "retry" if not set or invalid.
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "retry".to_string())
            .to_lowercase()
            .as_str()
        {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            other => {
                warn!(value = %other, "Invalid ELASTICSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Process-wide switch between the live and the disabled engine.
    pub engine_enabled: bool,
    pub engine: SearchEngineConfig,
    /// Startup connection attempts before giving up or moving on.
    pub max_retries: u32,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
    /// Primary store. `None` leaves the service without record sources.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub server_addr: SocketAddr,
    /// Shared secret for destructive management routes.
    pub operator_token: Option<String>,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `ELASTICSEARCH_ENABLED`: enable the live engine (default: false)
    /// - `ELASTICSEARCH_NODES`: comma-separated node URLs (default: http://localhost:9200)
    /// - `ELASTICSEARCH_USERNAME` / `ELASTICSEARCH_PASSWORD`: basic auth
    /// - `ELASTICSEARCH_TLS_REJECT_UNAUTHORIZED`: validate certificates (default: true)
    /// - `ELASTICSEARCH_REQUEST_TIMEOUT_MS`: per-call timeout (default: 30000)
    /// - `ELASTICSEARCH_MAX_RETRIES`: startup attempts (default: 3)
    /// - `ELASTICSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `ELASTICSEARCH_RETRY_INTERVAL_SECS`: delay between attempts (default: 15)
    /// - `ELASTICSEARCH_SHARDS` / `ELASTICSEARCH_REPLICAS`: index settings (default: 1 / 1)
    /// - `DATABASE_URL`: PostgreSQL primary store (default: unset)
    /// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
    /// - `SERVER_HOST` / `SERVER_PORT`: HTTP bind IP and port (default: 0.0.0.0 / 3000)
    /// - `OPERATOR_TOKEN`: operator secret (default: unset)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let nodes: Vec<String> = text("ELASTICSEARCH_NODES")
            .unwrap_or_else(|| DEFAULT_ENGINE_NODES.to_string())
            .split(',')
            .map(|node| node.trim().to_string())
            .filter(|node| !node.is_empty())
            .collect();
        if nodes.is_empty() {
            return Err(AppError::config("ELASTICSEARCH_NODES must list at least one node"));
        }

        let engine = SearchEngineConfig {
            nodes,
            username: text("ELASTICSEARCH_USERNAME"),
            password: text("ELASTICSEARCH_PASSWORD"),
            reject_unauthorized: parse_bool(
                "ELASTICSEARCH_TLS_REJECT_UNAUTHORIZED",
                text("ELASTICSEARCH_TLS_REJECT_UNAUTHORIZED"),
                true,
            ),
            request_timeout: Duration::from_millis(parse_number(
                "ELASTICSEARCH_REQUEST_TIMEOUT_MS",
                text("ELASTICSEARCH_REQUEST_TIMEOUT_MS"),
                DEFAULT_REQUEST_TIMEOUT_MS,
            )),
            shards: parse_number("ELASTICSEARCH_SHARDS", text("ELASTICSEARCH_SHARDS"), 1),
            replicas: parse_number("ELASTICSEARCH_REPLICAS", text("ELASTICSEARCH_REPLICAS"), 1),
        };

        let host = text("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string());
        let port: u16 = parse_number("SERVER_PORT", text("SERVER_PORT"), DEFAULT_SERVER_PORT);
        let server_addr = format!("{}:{}", host, port)
            .parse::<SocketAddr>()
            .map_err(|e| AppError::config(format!("Invalid server address {}:{}: {}", host, port, e)))?;

        Ok(Self {
            engine_enabled: parse_bool("ELASTICSEARCH_ENABLED", text("ELASTICSEARCH_ENABLED"), false),
            engine,
            max_retries: parse_number(
                "ELASTICSEARCH_MAX_RETRIES",
                text("ELASTICSEARCH_MAX_RETRIES"),
                DEFAULT_MAX_RETRIES,
            )
            .max(1),
            connection_mode: ConnectionMode::parse(text("ELASTICSEARCH_CONNECTION_MODE")),
            retry_interval: Duration::from_secs(parse_number(
                "ELASTICSEARCH_RETRY_INTERVAL_SECS",
                text("ELASTICSEARCH_RETRY_INTERVAL_SECS"),
                DEFAULT_RETRY_INTERVAL_SECS,
            )),
            database_url: text("DATABASE_URL"),
            database_max_connections: parse_number(
                "DATABASE_MAX_CONNECTIONS",
                text("DATABASE_MAX_CONNECTIONS"),
                DEFAULT_DATABASE_MAX_CONNECTIONS,
            ),
            server_addr,
            operator_token: text("OPERATOR_TOKEN"),
        })
    }

    /// Startup connection attempts; at least one even when `max_retries` is 0.
    pub fn startup_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

fn parse_bool(key: &str, value: Option<String>, default: bool) -> bool {
    match value.as_deref().map(str::to_lowercase).as_deref() {
        None => default,
        Some("true" | "1" | "yes") => true,
        Some("false" | "0" | "no") => false,
        Some(other) => {
            warn!(key = %key, value = %other, default = default, "Invalid boolean, using default");
            default
        }
    }
}

fn parse_number<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match value {
        None => default,
        Some(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            warn!(key = %key, value = %raw, default = %default, "Invalid number, using default");
            default
        }),
    }
}
