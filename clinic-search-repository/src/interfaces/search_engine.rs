//! Search engine capability trait.
//!
//! One interface with two implementations, chosen once at startup: the live
//! OpenSearch client and `DisabledSearchEngine`. Services never check the enable
//! flag themselves; they call the trait and handle `ServiceDisabled`.

use async_trait::async_trait;
use clinic_search_shared::IndexName;
use serde_json::Value;

use crate::errors::SearchEngineError;
use crate::schema::IndexDefinition;
use crate::types::{BulkOperation, BulkResponse, ClusterHealth, IndexDocumentRequest, ServiceStatus};

/// Abstracts the underlying search engine.
///
/// Health checks (`ping`, `index_exists`) never fail: they degrade to `false`. Every other
/// operation returns `SearchEngineError::ServiceDisabled` when the engine is off and
/// wraps engine failures with the original message otherwise.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Whether the engine is enabled by configuration.
    fn is_enabled(&self) -> bool;

    /// Check connectivity. Returns `false` when disabled or unreachable.
    async fn ping(&self) -> bool;

    /// `{enabled, connected}` snapshot.
    async fn service_status(&self) -> ServiceStatus {
        let enabled = self.is_enabled();
        let connected = enabled && self.ping().await;
        ServiceStatus { enabled, connected }
    }

    async fn cluster_health(&self) -> Result<ClusterHealth, SearchEngineError>;

    /// Create an index from its definition. Fails if it already exists.
    async fn create_index(&self, definition: &IndexDefinition) -> Result<(), SearchEngineError>;

    /// Returns `false` when disabled or when the check fails.
    async fn index_exists(&self, index: IndexName) -> bool;

    async fn delete_index(&self, index: IndexName) -> Result<(), SearchEngineError>;

    /// Index one document and return its id.
    async fn index_document(
        &self,
        request: IndexDocumentRequest,
    ) -> Result<String, SearchEngineError>;

    /// Fetch a document source. `Ok(None)` when it does not exist.
    async fn get_document(
        &self,
        index: IndexName,
        id: &str,
    ) -> Result<Option<Value>, SearchEngineError>;

    /// Merge `partial` into an existing document.
    async fn update_document(
        &self,
        index: IndexName,
        id: &str,
        partial: &Value,
        refresh: bool,
    ) -> Result<(), SearchEngineError>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete_document(
        &self,
        index: IndexName,
        id: &str,
        refresh: bool,
    ) -> Result<(), SearchEngineError>;

    /// Run a raw search body and return the raw engine response.
    async fn search(&self, index: IndexName, body: &Value) -> Result<Value, SearchEngineError>;

    /// Number of documents in the index.
    async fn count(&self, index: IndexName) -> Result<u64, SearchEngineError>;

    /// Execute a bulk call. Item-level failures are reported in the response, not as
    /// an error.
    async fn bulk(
        &self,
        operations: Vec<BulkOperation>,
        refresh: bool,
    ) -> Result<BulkResponse, SearchEngineError>;

    async fn refresh_index(&self, index: IndexName) -> Result<(), SearchEngineError>;

    /// The index mapping (the `mappings` object, without the index-name wrapper).
    async fn get_mapping(&self, index: IndexName) -> Result<Value, SearchEngineError>;

    async fn put_mapping(&self, index: IndexName, mapping: &Value)
        -> Result<(), SearchEngineError>;
}
