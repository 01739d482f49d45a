//! Search engine error types.
//!
//! This module defines the unified error type for every engine-facing operation:
//! low-level transport failures, engine rejections, schema violations caught before
//! a write, and the explicit `ServiceDisabled` signal used when search is switched off.

use thiserror::Error;

use crate::errors::RecordSourceError;

/// Unified errors from search engine operations.
///
/// Engine messages are kept verbatim inside the variant so callers and logs see the
/// original failure.
#[derive(Debug, Clone, Error)]
pub enum SearchEngineError {
    /// The search engine is disabled by configuration.
    #[error("Search service is disabled")]
    ServiceDisabled,

    /// The engine could not be reached.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// An engine call exceeded the configured request timeout.
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Failed to index a document or run a search.
    #[error("Index error: {0}")]
    IndexError(String),

    /// A bulk call failed as a whole.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// Failed to update a document or a mapping.
    #[error("Update error: {0}")]
    UpdateError(String),

    /// Failed to delete a document or an index.
    #[error("Delete error: {0}")]
    DeleteError(String),

    /// Failed to create an index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to parse a response from the engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Document not found.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// A document carries a field its index mapping does not declare.
    #[error("Schema violation in index '{index}': {message}")]
    SchemaViolation { index: String, message: String },

    /// Invalid caller input (bad filter, out-of-range option, missing id).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Batch size exceeds configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },

    /// The primary store failed while feeding a sync or a fallback.
    #[error("Record source error: {0}")]
    RecordSource(String),
}

impl SearchEngineError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index error.
    pub fn index(msg: impl Into<String>) -> Self {
        Self::IndexError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create an update error.
    pub fn update(msg: impl Into<String>) -> Self {
        Self::UpdateError(msg.into())
    }

    /// Create a delete error.
    pub fn delete(msg: impl Into<String>) -> Self {
        Self::DeleteError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a document not found error.
    pub fn document_not_found(index: &str, id: &str) -> Self {
        Self::DocumentNotFound(format!("index={}, id={}", index, id))
    }

    /// Create a schema violation error.
    pub fn schema_violation(index: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::SchemaViolation {
            index: index.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a batch size exceeded error.
    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }

    /// Create a record source error.
    pub fn record_source(msg: impl Into<String>) -> Self {
        Self::RecordSource(msg.into())
    }

    /// True when the engine is switched off by configuration.
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::ServiceDisabled)
    }

    /// True when the engine is enabled but could not serve the request.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ConnectionError(_) | Self::Timeout(_))
    }
}

impl From<RecordSourceError> for SearchEngineError {
    fn from(err: RecordSourceError) -> Self {
        Self::RecordSource(err.to_string())
    }
}
