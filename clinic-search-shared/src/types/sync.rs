//! Synchronization request/result value objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::index_name::IndexName;

/// Default number of records per bulk call.
pub const DEFAULT_BATCH_SIZE: usize = 100;

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Options for one sync run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncOptions {
    /// Delete and recreate the index before syncing.
    #[serde(default)]
    pub force: bool,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Refresh the index once the run completes.
    #[serde(default)]
    pub refresh: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            force: false,
            batch_size: DEFAULT_BATCH_SIZE,
            refresh: false,
        }
    }
}

impl SyncOptions {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_refresh(mut self) -> Self {
        self.refresh = true;
        self
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}

/// Outcome of one sync run. Not persisted; logged and returned to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    pub total_processed: usize,
    pub total_synced: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

impl SyncResult {
    /// A successful run that has not processed anything yet.
    pub fn new() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    /// A run that failed before processing anything.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![error.into()],
            ..Default::default()
        }
    }

    /// Record an error; the run is no longer successful.
    pub fn push_error(&mut self, error: impl Into<String>) {
        self.success = false;
        self.errors.push(error.into());
    }

    /// Number of processed documents that were not synced.
    pub fn failed_count(&self) -> usize {
        self.total_processed.saturating_sub(self.total_synced)
    }

    /// Some documents were synced and some were not.
    pub fn is_partial(&self) -> bool {
        !self.success && self.total_synced > 0
    }

    /// Fold another run's counters into this one, prefixing its errors with `label`.
    pub fn absorb(&mut self, label: &str, other: SyncResult) {
        self.total_processed += other.total_processed;
        self.total_synced += other.total_synced;
        self.success &= other.success;
        self.errors
            .extend(other.errors.into_iter().map(|e| format!("{}: {}", label, e)));
    }
}

/// Drift classification between an index and its primary-store table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Synced,
    OutOfSync,
    Unknown,
}

/// Sync status report for one index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexSyncStatus {
    pub index: IndexName,
    pub document_count: Option<u64>,
    pub source_count: Option<u64>,
    pub last_sync: Option<DateTime<Utc>>,
    pub status: SyncState,
}

impl IndexSyncStatus {
    /// Classify from the two counts; unknown if either is missing.
    pub fn classify(document_count: Option<u64>, source_count: Option<u64>) -> SyncState {
        match (document_count, source_count) {
            (Some(docs), Some(rows)) if docs == rows => SyncState::Synced,
            (Some(_), Some(_)) => SyncState::OutOfSync,
            _ => SyncState::Unknown,
        }
    }
}
