//! Search engine stand-in used when search is switched off by configuration.

use async_trait::async_trait;
use clinic_search_shared::IndexName;
use serde_json::Value;
use tracing::debug;

use crate::errors::SearchEngineError;
use crate::interfaces::SearchEngine;
use crate::schema::IndexDefinition;
use crate::types::{BulkOperation, BulkResponse, ClusterHealth, IndexDocumentRequest};

/// A `SearchEngine` that is never enabled.
///
/// Health checks answer `false`; every other operation fails with
/// `SearchEngineError::ServiceDisabled` so callers can take their degradation path.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSearchEngine;

impl DisabledSearchEngine {
    pub fn new() -> Self {
        Self
    }

    fn disabled<T>(operation: &str) -> Result<T, SearchEngineError> {
        debug!(operation, "Search engine disabled, skipping");
        Err(SearchEngineError::ServiceDisabled)
    }
}

#[async_trait]
impl SearchEngine for DisabledSearchEngine {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn ping(&self) -> bool {
        false
    }

    async fn cluster_health(&self) -> Result<ClusterHealth, SearchEngineError> {
        Self::disabled("cluster_health")
    }

    async fn create_index(&self, _definition: &IndexDefinition) -> Result<(), SearchEngineError> {
        Self::disabled("create_index")
    }

    async fn index_exists(&self, _index: IndexName) -> bool {
        false
    }

    async fn delete_index(&self, _index: IndexName) -> Result<(), SearchEngineError> {
        Self::disabled("delete_index")
    }

    async fn index_document(
        &self,
        _request: IndexDocumentRequest,
    ) -> Result<String, SearchEngineError> {
        Self::disabled("index_document")
    }

    async fn get_document(
        &self,
        _index: IndexName,
        _id: &str,
    ) -> Result<Option<Value>, SearchEngineError> {
        Self::disabled("get_document")
    }

    async fn update_document(
        &self,
        _index: IndexName,
        _id: &str,
        _partial: &Value,
        _refresh: bool,
    ) -> Result<(), SearchEngineError> {
        Self::disabled("update_document")
    }

    async fn delete_document(
        &self,
        _index: IndexName,
        _id: &str,
        _refresh: bool,
    ) -> Result<(), SearchEngineError> {
        Self::disabled("delete_document")
    }

    async fn search(&self, _index: IndexName, _body: &Value) -> Result<Value, SearchEngineError> {
        Self::disabled("search")
    }

    async fn count(&self, _index: IndexName) -> Result<u64, SearchEngineError> {
        Self::disabled("count")
    }

    async fn bulk(
        &self,
        _operations: Vec<BulkOperation>,
        _refresh: bool,
    ) -> Result<BulkResponse, SearchEngineError> {
        Self::disabled("bulk")
    }

    async fn refresh_index(&self, _index: IndexName) -> Result<(), SearchEngineError> {
        Self::disabled("refresh_index")
    }

    async fn get_mapping(&self, _index: IndexName) -> Result<Value, SearchEngineError> {
        Self::disabled("get_mapping")
    }

    async fn put_mapping(
        &self,
        _index: IndexName,
        _mapping: &Value,
    ) -> Result<(), SearchEngineError> {
        Self::disabled("put_mapping")
    }
}
