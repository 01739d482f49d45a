//! Autocomplete suggestions with a primary-store fallback.

use std::collections::HashMap;
use std::sync::Arc;

use clinic_search_shared::{IndexName, Suggestion};
use tracing::{debug, instrument, warn};

use crate::errors::SearchEngineError;
use crate::interfaces::{RecordSources, SearchEngine};
use crate::query::{collect_suggestions, QueryBuilder};

pub const DEFAULT_SUGGESTION_SIZE: usize = 5;
pub const MAX_SUGGESTION_SIZE: usize = 20;

/// Lowercase and collapse internal whitespace.
pub fn normalize_suggestion_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Deduplicate by normalized text keeping the higher score, sort by score
/// descending and keep at most `size`.
pub fn merge_suggestions(suggestions: Vec<Suggestion>, size: usize) -> Vec<Suggestion> {
    let mut best: HashMap<String, Suggestion> = HashMap::new();
    for suggestion in suggestions {
        let key = normalize_suggestion_text(&suggestion.text);
        if key.is_empty() {
            continue;
        }
        match best.get(&key) {
            Some(existing) if existing.score >= suggestion.score => {}
            _ => {
                best.insert(key, suggestion);
            }
        }
    }

    let mut merged: Vec<Suggestion> = best.into_values().collect();
    merged.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.text.cmp(&b.text))
    });
    merged.truncate(size);
    merged
}

pub struct SuggestionService {
    engine: Arc<dyn SearchEngine>,
    sources: RecordSources,
}

impl SuggestionService {
    pub fn new(engine: Arc<dyn SearchEngine>, sources: RecordSources) -> Self {
        Self { engine, sources }
    }

    /// Suggestions for `prefix` in `index`.
    ///
    /// Uses the engine's completion and phrase suggesters; when the engine is
    /// disabled or fails, falls back to a prefix match against the record source
    /// with synthetic scores `1.0, 0.9, 0.8, ...`.
    ///
    /// `size` defaults to 5 and is capped at 20.
    #[instrument(skip(self), fields(index = %index))]
    pub async fn get_suggestions(
        &self,
        index: IndexName,
        prefix: &str,
        size: Option<usize>,
    ) -> Result<Vec<Suggestion>, SearchEngineError> {
        let size = size
            .unwrap_or(DEFAULT_SUGGESTION_SIZE)
            .clamp(1, MAX_SUGGESTION_SIZE);
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(SearchEngineError::validation("query must not be empty"));
        }

        let engine_error = if self.engine.is_enabled() {
            let body = QueryBuilder::suggestions(index, prefix, size).to_value();
            match self.engine.search(index, &body).await {
                Ok(response) => {
                    return Ok(merge_suggestions(collect_suggestions(&response), size));
                }
                Err(e) => {
                    warn!(index = %index, error = %e, "Suggestion query failed, using fallback");
                    e
                }
            }
        } else {
            debug!(index = %index, "Search disabled, using suggestion fallback");
            SearchEngineError::ServiceDisabled
        };

        self.fallback(index, prefix, size, engine_error).await
    }

    async fn fallback(
        &self,
        index: IndexName,
        prefix: &str,
        size: usize,
        engine_error: SearchEngineError,
    ) -> Result<Vec<Suggestion>, SearchEngineError> {
        let Some(source) = self.sources.get(index) else {
            return Err(engine_error);
        };

        let names = source.find_by_prefix(prefix, size).await?;
        Ok(names
            .into_iter()
            .enumerate()
            .map(|(i, text)| Suggestion::new(text, 1.0 - i as f64 * 0.1))
            .collect())
    }
}
