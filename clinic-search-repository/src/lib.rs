//! # Clinic Search Repository
//!
//! Traits and implementations behind clinic search: the `SearchEngine` capability
//! with its OpenSearch and disabled implementations, index schemas and lifecycle,
//! the synchronization engine that mirrors primary-store records, query
//! construction, and the search and suggestion services.

pub mod config;
pub mod disabled;
pub mod errors;
pub mod index_manager;
pub mod interfaces;
pub mod opensearch;
pub mod postgres;
pub mod query;
pub mod schema;
pub mod search_service;
pub mod suggestion_service;
pub mod sync_service;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::{SearchEngineConfig, SyncServiceConfig};
pub use disabled::DisabledSearchEngine;
pub use errors::{RecordSourceError, SearchEngineError};
pub use index_manager::IndexLifecycleManager;
pub use interfaces::{RecordSource, RecordSources, SearchEngine};
pub use opensearch::OpenSearchEngine;
pub use postgres::PostgresRecordSource;
pub use schema::{IndexDefinition, IndexSettings};
pub use search_service::SearchService;
pub use suggestion_service::SuggestionService;
pub use sync_service::SyncService;
pub use types::{
    BulkItemResult, BulkOperation, BulkResponse, ClusterHealth, IndexCreationReport,
    IndexDocumentRequest, ServiceStatus, SyncDocument,
};
