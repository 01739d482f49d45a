//! Interface definitions for the search engine and the primary-store boundary.
//!
//! Both traits are injected as trait objects so the services can run against the
//! live engine, the disabled stub, or test doubles.

mod record_source;
mod search_engine;

pub use record_source::{RecordSource, RecordSources};
pub use search_engine::SearchEngine;
