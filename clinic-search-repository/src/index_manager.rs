//! Index lifecycle management for the fixed set of known indices.

use std::sync::Arc;

use clinic_search_shared::IndexName;
use tracing::{info, instrument, warn};

use crate::errors::SearchEngineError;
use crate::interfaces::SearchEngine;
use crate::schema::IndexDefinition;
use crate::types::IndexCreationReport;

/// Creates, deletes and lists the known indices.
///
/// Never touches an index outside [`IndexName`]: there is no discovery of unknown
/// indices.
pub struct IndexLifecycleManager {
    engine: Arc<dyn SearchEngine>,
    shards: u32,
    replicas: u32,
}

impl IndexLifecycleManager {
    /// Create a new manager.
    ///
    /// # Arguments
    ///
    /// * `engine` - The search engine to manage indices on
    /// * `shards` - Primary shard count for newly created indices
    /// * `replicas` - Replica count for newly created indices
    pub fn new(engine: Arc<dyn SearchEngine>, shards: u32, replicas: u32) -> Self {
        Self {
            engine,
            shards,
            replicas,
        }
    }

    /// The definition used when creating `index`.
    pub fn definition(&self, index: IndexName) -> IndexDefinition {
        IndexDefinition::for_index(index, self.shards, self.replicas)
    }

    fn require_enabled(&self) -> Result<(), SearchEngineError> {
        if self.engine.is_enabled() {
            Ok(())
        } else {
            Err(SearchEngineError::ServiceDisabled)
        }
    }

    /// Create `index` if it does not exist yet.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The index was created
    /// * `Ok(false)` - The index already existed
    /// * `Err(SearchEngineError)` - The engine is disabled or creation failed
    #[instrument(skip(self), fields(index = %index))]
    pub async fn ensure_index(&self, index: IndexName) -> Result<bool, SearchEngineError> {
        self.require_enabled()?;

        if self.engine.index_exists(index).await {
            info!(index = %index, "Index already exists, skipping creation");
            return Ok(false);
        }

        match self.engine.create_index(&self.definition(index)).await {
            Ok(()) => Ok(true),
            // Lost a creation race with another process.
            Err(SearchEngineError::IndexCreationError(msg))
                if msg.contains("resource_already_exists_exception") =>
            {
                info!(index = %index, "Index created concurrently, skipping creation");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Idempotently create the five clinic indices.
    ///
    /// A second call performs no create calls and reports every index as existing.
    #[instrument(skip(self))]
    pub async fn create_clinic_indices(&self) -> Result<IndexCreationReport, SearchEngineError> {
        self.require_enabled()?;

        let mut report = IndexCreationReport::default();
        for index in IndexName::CLINIC_INDICES {
            if self.ensure_index(index).await? {
                report.created.push(index);
            } else {
                report.existing.push(index);
            }
        }

        info!(
            created = report.created.len(),
            existing = report.existing.len(),
            "Clinic indices ready"
        );
        Ok(report)
    }

    /// Create the FAQ index if it does not exist.
    pub async fn create_faq_index(&self) -> Result<bool, SearchEngineError> {
        self.ensure_index(IndexName::Faqs).await
    }

    /// Delete one index. Irreversible.
    #[instrument(skip(self), fields(index = %index))]
    pub async fn delete_index(&self, index: IndexName) -> Result<(), SearchEngineError> {
        self.require_enabled()?;
        warn!(index = %index, "Deleting index");
        self.engine.delete_index(index).await
    }

    /// Delete every clinic index that currently exists. Irreversible.
    ///
    /// Returns the indices that were deleted.
    #[instrument(skip(self))]
    pub async fn delete_clinic_indices(&self) -> Result<Vec<IndexName>, SearchEngineError> {
        self.require_enabled()?;

        let mut deleted = Vec::new();
        for index in IndexName::CLINIC_INDICES {
            if self.engine.index_exists(index).await {
                self.delete_index(index).await?;
                deleted.push(index);
            }
        }
        Ok(deleted)
    }

    /// The clinic indices that currently exist.
    pub async fn get_clinic_indices(&self) -> Result<Vec<IndexName>, SearchEngineError> {
        self.require_enabled()?;

        let mut present = Vec::new();
        for index in IndexName::CLINIC_INDICES {
            if self.engine.index_exists(index).await {
                present.push(index);
            }
        }
        Ok(present)
    }
}
