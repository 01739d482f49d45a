//! Synchronization of primary-store records into the search engine.
//!
//! Full resyncs page through a `RecordSource` and submit one bulk call per batch,
//! sequentially. Failures are isolated per document, per batch and per entity type:
//! a run is best-effort and reports what it could not mirror in `SyncResult.errors`.
//!
//! Single-document mirror operations return `bool` and never propagate errors, so a
//! failed mirror can never block the primary-store write that triggered it.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use clinic_search_shared::{IndexName, IndexSyncStatus, SyncOptions, SyncResult};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::config::SyncServiceConfig;
use crate::errors::SearchEngineError;
use crate::index_manager::IndexLifecycleManager;
use crate::interfaces::{RecordSources, SearchEngine};
use crate::schema::IndexDefinition;
use crate::types::{BulkOperation, IndexDocumentRequest, SyncDocument};

/// Mirrors records into the search engine.
pub struct SyncService {
    engine: Arc<dyn SearchEngine>,
    indices: Arc<IndexLifecycleManager>,
    sources: RecordSources,
    config: SyncServiceConfig,
}

impl SyncService {
    /// Create a new SyncService with default configuration.
    ///
    /// The default configuration includes a batch size limit of 1000 documents.
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        indices: Arc<IndexLifecycleManager>,
        sources: RecordSources,
    ) -> Self {
        Self::with_config(engine, indices, sources, SyncServiceConfig::default())
    }

    /// Create a new SyncService with custom configuration.
    pub fn with_config(
        engine: Arc<dyn SearchEngine>,
        indices: Arc<IndexLifecycleManager>,
        sources: RecordSources,
        config: SyncServiceConfig,
    ) -> Self {
        Self {
            engine,
            indices,
            sources,
            config,
        }
    }

    /// Check the requested batch size against the configured limit.
    fn validate_options(&self, options: &SyncOptions) -> Result<(), SearchEngineError> {
        if options.batch_size == 0 {
            return Err(SearchEngineError::validation("batchSize must be at least 1"));
        }
        if let Some(max) = self.config.max_batch_size {
            if options.batch_size > max {
                return Err(SearchEngineError::batch_size_exceeded(
                    options.batch_size,
                    max,
                ));
            }
        }
        Ok(())
    }

    fn require_enabled(&self) -> Result<(), SearchEngineError> {
        if self.engine.is_enabled() {
            Ok(())
        } else {
            Err(SearchEngineError::ServiceDisabled)
        }
    }

    /// Resync all five clinic entity types concurrently.
    ///
    /// Indices are created first if missing. One entity type failing does not abort
    /// the others: each branch's outcome is captured and merged, errors prefixed by
    /// the index name.
    #[instrument(skip(self, options))]
    pub async fn sync_all_clinic_data(
        &self,
        options: &SyncOptions,
    ) -> Result<SyncResult, SearchEngineError> {
        self.validate_options(options)?;
        let started = Instant::now();

        self.indices.create_clinic_indices().await?;

        let (pets, appointments, users, clinics, health_records) = tokio::join!(
            self.sync_pets(options),
            self.sync_appointments(options),
            self.sync_users(options),
            self.sync_clinics(options),
            self.sync_health_records(options),
        );

        let mut total = SyncResult::new();
        for (index, outcome) in IndexName::CLINIC_INDICES.into_iter().zip([
            pets,
            appointments,
            users,
            clinics,
            health_records,
        ]) {
            let branch = outcome.unwrap_or_else(|e| SyncResult::failed(e.to_string()));
            total.absorb(index.as_str(), branch);
        }
        total.duration_ms = started.elapsed().as_millis() as u64;

        info!(
            processed = total.total_processed,
            synced = total.total_synced,
            errors = total.errors.len(),
            duration_ms = total.duration_ms,
            "Full clinic sync finished"
        );
        Ok(total)
    }

    pub async fn sync_pets(&self, options: &SyncOptions) -> Result<SyncResult, SearchEngineError> {
        self.sync_index(IndexName::Pets, options).await
    }

    pub async fn sync_appointments(
        &self,
        options: &SyncOptions,
    ) -> Result<SyncResult, SearchEngineError> {
        self.sync_index(IndexName::Appointments, options).await
    }

    pub async fn sync_users(&self, options: &SyncOptions) -> Result<SyncResult, SearchEngineError> {
        self.sync_index(IndexName::Users, options).await
    }

    pub async fn sync_clinics(
        &self,
        options: &SyncOptions,
    ) -> Result<SyncResult, SearchEngineError> {
        self.sync_index(IndexName::Clinics, options).await
    }

    pub async fn sync_health_records(
        &self,
        options: &SyncOptions,
    ) -> Result<SyncResult, SearchEngineError> {
        self.sync_index(IndexName::HealthRecords, options).await
    }

    /// Resync one index from its record source.
    ///
    /// Pages through the source in `batch_size` chunks and submits each chunk as one
    /// bulk call; batch N+1 starts only after batch N completes. With `force` the
    /// index is dropped and recreated first. With `refresh` the index is refreshed
    /// once at the end.
    ///
    /// # Returns
    ///
    /// * `Ok(SyncResult)` - Counters and per-document errors for the run
    /// * `Err(SearchEngineError)` - The run could not start (disabled engine, invalid
    ///   options, no registered source, index creation failed)
    #[instrument(skip(self, options), fields(index = %index))]
    pub async fn sync_index(
        &self,
        index: IndexName,
        options: &SyncOptions,
    ) -> Result<SyncResult, SearchEngineError> {
        self.validate_options(options)?;
        self.require_enabled()?;
        let started = Instant::now();

        let source = self.sources.get(index).ok_or_else(|| {
            SearchEngineError::record_source(format!("no record source registered for {}", index))
        })?;

        if options.force {
            info!(index = %index, "Forced sync, recreating index");
            self.indices.delete_index(index).await?;
        }
        self.indices.ensure_index(index).await?;

        let definition = self.indices.definition(index);
        let mut result = SyncResult::new();
        let mut offset: u64 = 0;

        loop {
            let batch = match source.fetch_batch(offset, options.batch_size).await {
                Ok(batch) => batch,
                Err(e) => {
                    error!(index = %index, offset, error = %e, "Failed to fetch records");
                    result.push_error(format!("failed to fetch records at offset {}: {}", offset, e));
                    break;
                }
            };

            if batch.is_empty() {
                break;
            }

            let fetched = batch.len();
            result.total_processed += fetched;
            self.submit_batch(&definition, batch, &mut result).await;

            if fetched < options.batch_size {
                break;
            }
            offset += fetched as u64;
        }

        self.finish_run(index, options, &mut result).await;
        result.duration_ms = started.elapsed().as_millis() as u64;

        if result.success {
            info!(
                index = %index,
                synced = result.total_synced,
                duration_ms = result.duration_ms,
                "Index sync finished"
            );
        } else {
            warn!(
                index = %index,
                processed = result.total_processed,
                synced = result.total_synced,
                failed = result.failed_count(),
                errors = result.errors.len(),
                "Index sync finished with failures"
            );
        }
        Ok(result)
    }

    /// Validate and submit one batch, accumulating into `result`.
    ///
    /// Documents that violate the mapping, lack a projected field or carry an `id`
    /// other than their record id are recorded and never sent. A whole-call
    /// failure marks every submitted document failed; item failures are counted one
    /// by one.
    async fn submit_batch(
        &self,
        definition: &IndexDefinition,
        batch: Vec<SyncDocument>,
        result: &mut SyncResult,
    ) {
        let mut operations = Vec::with_capacity(batch.len());
        for doc in batch {
            match definition.validate_projection(&doc.body) {
                Ok(body_id) if body_id == doc.id => {
                    operations.push(BulkOperation::index(definition.index, doc.id, doc.body))
                }
                Ok(body_id) => result.push_error(format!(
                    "document {}: id field '{}' does not match",
                    doc.id, body_id
                )),
                Err(e) => result.push_error(format!("document {}: {}", doc.id, e)),
            }
        }

        if operations.is_empty() {
            return;
        }

        let ids: Vec<String> = operations.iter().map(|op| op.id().to_string()).collect();
        match self.engine.bulk(operations, false).await {
            Ok(response) => {
                result.total_synced += response.succeeded();
                for item in response.failed_items() {
                    result.push_error(format!(
                        "document {}: {}",
                        item.id,
                        item.error.as_deref().unwrap_or("rejected by engine")
                    ));
                }
            }
            Err(e) => {
                warn!(
                    index = %definition.index,
                    documents = ids.len(),
                    error = %e,
                    "Bulk batch failed"
                );
                for id in ids {
                    result.push_error(format!("document {}: {}", id, e));
                }
            }
        }
    }

    /// Refresh once if requested and stamp the last successful sync time.
    async fn finish_run(&self, index: IndexName, options: &SyncOptions, result: &mut SyncResult) {
        if options.refresh {
            if let Err(e) = self.engine.refresh_index(index).await {
                result.push_error(format!("refresh failed: {}", e));
            }
        }

        if result.success {
            let meta = json!({ "_meta": { "lastSync": Utc::now().to_rfc3339() } });
            if let Err(e) = self.engine.put_mapping(index, &meta).await {
                warn!(index = %index, error = %e, "Failed to record last sync time");
            }
        }
    }

    /// Upsert one document. Returns `true` when mirrored.
    ///
    /// The id defaults to the document's `id` field. An explicit id is written into
    /// the document when it has none; a document whose `id` differs is rejected.
    #[instrument(skip(self, document, options), fields(index = %index))]
    pub async fn sync_document(
        &self,
        index: IndexName,
        mut document: Value,
        id: Option<&str>,
        options: &SyncOptions,
    ) -> bool {
        let body_id = document.get("id").and_then(Value::as_str).map(str::to_string);
        let id = match (id, body_id) {
            (Some(id), Some(body_id)) if id != body_id => {
                error!(index = %index, id = %id, body_id = %body_id, "Document id does not match");
                return false;
            }
            (Some(id), _) => id.to_string(),
            (None, Some(body_id)) => body_id,
            (None, None) => {
                error!(index = %index, "Cannot mirror document without an id");
                return false;
            }
        };

        if let Some(fields) = document.as_object_mut() {
            fields
                .entry("id")
                .or_insert_with(|| Value::String(id.clone()));
        }

        if let Err(e) = self.indices.definition(index).validate_projection(&document) {
            error!(index = %index, id = %id, error = %e, "Document rejected by mapping");
            return false;
        }

        let request = IndexDocumentRequest {
            index,
            id: Some(id.clone()),
            document,
            refresh: options.refresh,
        };
        match self.engine.index_document(request).await {
            Ok(_) => true,
            Err(e) => {
                Self::log_mirror_failure(index, &id, "index", &e);
                false
            }
        }
    }

    /// Merge a partial document into an existing one. Returns `true` when mirrored.
    #[instrument(skip(self, partial, options), fields(index = %index))]
    pub async fn update_document(
        &self,
        index: IndexName,
        id: &str,
        partial: &Value,
        options: &SyncOptions,
    ) -> bool {
        if let Err(e) = self.indices.definition(index).validate_document(partial) {
            error!(index = %index, id = %id, error = %e, "Partial document rejected by mapping");
            return false;
        }
        if partial.get("id").is_some_and(|body_id| body_id.as_str() != Some(id)) {
            error!(index = %index, id = %id, "Partial document cannot change the id");
            return false;
        }

        match self
            .engine
            .update_document(index, id, partial, options.refresh)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                Self::log_mirror_failure(index, id, "update", &e);
                false
            }
        }
    }

    /// Remove one document. Returns `true` when mirrored (including already absent).
    #[instrument(skip(self, options), fields(index = %index))]
    pub async fn delete_document(&self, index: IndexName, id: &str, options: &SyncOptions) -> bool {
        match self.engine.delete_document(index, id, options.refresh).await {
            Ok(()) => true,
            Err(e) => {
                Self::log_mirror_failure(index, id, "delete", &e);
                false
            }
        }
    }

    fn log_mirror_failure(index: IndexName, id: &str, action: &str, err: &SearchEngineError) {
        if err.is_disabled() {
            debug!(index = %index, id = %id, action, "Search disabled, document not mirrored");
        } else {
            error!(index = %index, id = %id, action, error = %err, "Failed to mirror document");
        }
    }

    /// Chunked bulk upsert of arbitrary documents into a known index.
    ///
    /// Each document must carry an `id`. Same partial-failure accounting as
    /// [`SyncService::sync_index`]. The index is created first if missing.
    #[instrument(skip(self, documents, options), fields(index = %index, count = documents.len()))]
    pub async fn bulk_sync_documents(
        &self,
        index: IndexName,
        documents: Vec<Value>,
        options: &SyncOptions,
    ) -> Result<SyncResult, SearchEngineError> {
        self.validate_options(options)?;
        self.require_enabled()?;
        let started = Instant::now();

        self.indices.ensure_index(index).await?;
        let definition = self.indices.definition(index);
        let mut result = SyncResult::new();

        let mut pending = documents.into_iter().peekable();
        while pending.peek().is_some() {
            let mut batch = Vec::with_capacity(options.batch_size);
            for document in pending.by_ref().take(options.batch_size) {
                result.total_processed += 1;
                match document.get("id").and_then(Value::as_str).map(str::to_string) {
                    Some(id) => batch.push(SyncDocument::new(id, document)),
                    None => result.push_error("document without id skipped"),
                }
            }
            self.submit_batch(&definition, batch, &mut result).await;
        }

        self.finish_run(index, options, &mut result).await;
        result.duration_ms = started.elapsed().as_millis() as u64;

        if !result.success {
            warn!(
                index = %index,
                processed = result.total_processed,
                synced = result.total_synced,
                failed = result.failed_count(),
                "Bulk sync finished with failures"
            );
        }
        Ok(result)
    }

    /// Compare the engine document count with the source row count.
    ///
    /// Reports `unknown` when the engine is disabled, no source is registered, or
    /// either count cannot be read.
    #[instrument(skip(self), fields(index = %index))]
    pub async fn get_index_sync_status(&self, index: IndexName) -> IndexSyncStatus {
        if !self.engine.is_enabled() {
            return IndexSyncStatus {
                index,
                document_count: None,
                source_count: None,
                last_sync: None,
                status: IndexSyncStatus::classify(None, None),
            };
        }

        let document_count = match self.engine.count(index).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(index = %index, error = %e, "Failed to count index documents");
                None
            }
        };

        let source_count = match self.sources.get(index) {
            Some(source) => match source.count().await {
                Ok(count) => Some(count),
                Err(e) => {
                    warn!(index = %index, error = %e, "Failed to count source records");
                    None
                }
            },
            None => None,
        };

        let last_sync = self
            .engine
            .get_mapping(index)
            .await
            .ok()
            .and_then(|mapping| {
                mapping
                    .pointer("/_meta/lastSync")
                    .and_then(Value::as_str)
                    .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            })
            .map(|ts| ts.with_timezone(&Utc));

        IndexSyncStatus {
            index,
            document_count,
            source_count,
            last_sync,
            status: IndexSyncStatus::classify(document_count, source_count),
        }
    }
}
