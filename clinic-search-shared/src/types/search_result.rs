//! Search result types returned by the search and suggestion services.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One hit: the document source plus engine metadata.
///
/// The source is flattened so a serialized hit looks like the document with
/// `_id`, `_score` and `highlight` added.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit<T> {
    #[serde(flatten)]
    pub source: T,

    #[serde(rename = "_id")]
    pub id: String,

    /// Relevance score. Absent when the engine sorted by a field instead of score.
    #[serde(rename = "_score")]
    pub score: Option<f64>,

    /// Highlighted fragments keyed by field name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<HashMap<String, Vec<String>>>,
}

/// A page of hits for one index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult<T> {
    pub hits: Vec<SearchHit<T>>,

    /// Total number of matching documents, which may exceed `hits.len()`.
    pub total: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<Suggestion>>,
}

impl<T> SearchResult<T> {
    /// Create an empty result.
    pub fn empty() -> Self {
        Self {
            hits: Vec::new(),
            total: 0,
            aggregations: None,
            suggestions: None,
        }
    }

    /// Get the number of hits in this page.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Check if this page has no hits.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Document ids of the hits, in rank order.
    pub fn ids(&self) -> Vec<&str> {
        self.hits.iter().map(|hit| hit.id.as_str()).collect()
    }
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub text: String,
    pub score: f64,
}

impl Suggestion {
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// Result of a search across every clinic entity index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSearchResult {
    pub pets: SearchResult<Value>,
    pub appointments: SearchResult<Value>,
    pub users: SearchResult<Value>,
    pub clinics: SearchResult<Value>,
    pub health_records: SearchResult<Value>,

    /// Per-index failure messages, keyed by index name. Failed indices carry an
    /// empty result.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

impl GlobalSearchResult {
    /// Sum of the hits returned across all indices.
    pub fn total_hits(&self) -> usize {
        self.pets.len()
            + self.appointments.len()
            + self.users.len()
            + self.clinics.len()
            + self.health_records.len()
    }
}
