//! Query construction and response normalization.

mod builder;
pub mod dsl;
mod entity_queries;
mod response;

pub use builder::{FilterPolicy, QueryBuilder};
pub use entity_queries::{spec_for, EntityQuerySpec, FilterField};
pub use response::{collect_suggestions, extract_total, parse_search_response};
