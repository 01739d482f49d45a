//! Index schemas for the fixed set of known indices.

mod definition;
pub mod mappings;

pub use definition::{IndexDefinition, IndexSettings};
