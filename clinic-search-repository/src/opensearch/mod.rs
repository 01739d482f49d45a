//! OpenSearch implementation of the search engine.
//!
//! This module provides the live `SearchEngine` implementation using OpenSearch
//! (wire-compatible with Elasticsearch 7.x) as the backend.

mod provider;

pub use provider::OpenSearchEngine;
