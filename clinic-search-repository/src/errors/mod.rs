//! Error types for the clinic search repository.
//!
//! `SearchEngineError` is the unified error for engine, sync and query operations;
//! `RecordSourceError` covers the primary-store boundary.

mod record_source_error;
mod search_engine_error;

pub use record_source_error::RecordSourceError;
pub use search_engine_error::SearchEngineError;
