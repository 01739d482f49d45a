//! Configuration types for the search engine client and the sync service.

use std::time::Duration;

/// Connection settings for the live search engine client.
#[derive(Debug, Clone)]
pub struct SearchEngineConfig {
    /// Engine node URLs. The first node is used for the connection pool.
    pub nodes: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// When false, TLS certificates are not validated.
    pub reject_unauthorized: bool,
    /// Per-call timeout applied at the client boundary.
    pub request_timeout: Duration,
    pub shards: u32,
    pub replicas: u32,
}

impl Default for SearchEngineConfig {
    fn default() -> Self {
        Self {
            nodes: vec!["http://localhost:9200".to_string()],
            username: None,
            password: None,
            reject_unauthorized: true,
            request_timeout: Duration::from_secs(30),
            shards: 1,
            replicas: 1,
        }
    }
}

impl SearchEngineConfig {
    /// Create a config pointing at a single node.
    pub fn single_node(url: impl Into<String>) -> Self {
        Self {
            nodes: vec![url.into()],
            ..Default::default()
        }
    }

    /// Basic-auth credentials, only when both parts are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) if !user.is_empty() => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

/// Configuration for the SyncService.
///
/// Bounds the batch size a caller may request so a single bulk call cannot grow
/// without limit.
#[derive(Debug, Clone)]
pub struct SyncServiceConfig {
    /// Maximum number of documents allowed in a single bulk call.
    ///
    /// Set to `None` to disable the limit. Defaults to 1000.
    pub max_batch_size: Option<usize>,
}

impl Default for SyncServiceConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(1000),
        }
    }
}

impl SyncServiceConfig {
    /// Create a config with no batch size limit.
    pub fn unlimited() -> Self {
        Self {
            max_batch_size: None,
        }
    }

    /// Create a config with a custom batch size limit.
    ///
    /// # Arguments
    ///
    /// * `max_batch_size` - Maximum number of documents allowed in a single bulk call
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
        }
    }
}
