//! Primary-store boundary used by full resyncs and the suggestion fallback.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use clinic_search_shared::IndexName;

use crate::errors::RecordSourceError;
use crate::types::SyncDocument;

/// Reads one entity type from the primary store, already projected into its
/// search document.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Total number of records.
    async fn count(&self) -> Result<u64, RecordSourceError>;

    /// One page of records ordered by primary key.
    async fn fetch_batch(
        &self,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<SyncDocument>, RecordSourceError>;

    /// Values of the primary text field that start with `prefix` (case-sensitive),
    /// ordered alphabetically.
    async fn find_by_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, RecordSourceError>;
}

/// Registry of record sources keyed by index.
#[derive(Clone, Default)]
pub struct RecordSources {
    sources: HashMap<IndexName, Arc<dyn RecordSource>>,
}

impl RecordSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the source for an index, replacing any previous one.
    pub fn with(mut self, index: IndexName, source: Arc<dyn RecordSource>) -> Self {
        self.sources.insert(index, source);
        self
    }

    pub fn get(&self, index: IndexName) -> Option<Arc<dyn RecordSource>> {
        self.sources.get(&index).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }
}
