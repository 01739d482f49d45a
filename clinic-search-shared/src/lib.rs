//! # Clinic Search Shared
//!
//! This crate defines the data structures shared across the clinic search layer:
//! the fixed set of index names, the document projections written to the search
//! engine, and the request/result types of the search, suggestion and sync services.

pub mod types;

pub use types::*;
