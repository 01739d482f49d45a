//! Normalization of raw engine search responses.

use std::collections::HashMap;

use clinic_search_shared::{SearchHit, SearchResult, Suggestion};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::SearchEngineError;

/// Total hit count: `hits.total.value`, else a bare `hits.total`, else 0.
pub fn extract_total(response: &Value) -> u64 {
    let total = &response["hits"]["total"];
    total
        .get("value")
        .and_then(Value::as_u64)
        .or_else(|| total.as_u64())
        .unwrap_or(0)
}

fn parse_hit<T: DeserializeOwned>(hit: &Value) -> Result<SearchHit<T>, SearchEngineError> {
    let id = hit["_id"]
        .as_str()
        .ok_or_else(|| SearchEngineError::parse("hit without _id"))?
        .to_string();
    let source = serde_json::from_value(hit["_source"].clone())
        .map_err(|e| SearchEngineError::parse(format!("hit {}: {}", id, e)))?;
    let highlight = hit
        .get("highlight")
        .map(|h| serde_json::from_value::<HashMap<String, Vec<String>>>(h.clone()))
        .transpose()
        .map_err(|e| SearchEngineError::parse(format!("hit {} highlight: {}", id, e)))?;

    Ok(SearchHit {
        source,
        id,
        score: hit["_score"].as_f64(),
        highlight,
    })
}

/// Convert a raw search response into a `SearchResult`.
pub fn parse_search_response<T: DeserializeOwned>(
    response: &Value,
) -> Result<SearchResult<T>, SearchEngineError> {
    let hits = match response["hits"]["hits"].as_array() {
        Some(hits) => hits.iter().map(parse_hit).collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(SearchResult {
        hits,
        total: extract_total(response),
        aggregations: response.get("aggregations").cloned(),
        suggestions: None,
    })
}

/// Every option of every named suggester in a response, in response order.
///
/// Completion options carry `text` and `_score`; phrase options carry `text` and
/// `score`.
pub fn collect_suggestions(response: &Value) -> Vec<Suggestion> {
    let Some(suggest) = response.get("suggest").and_then(Value::as_object) else {
        return Vec::new();
    };

    suggest
        .values()
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|entry| entry["options"].as_array())
        .flatten()
        .filter_map(|option| {
            let text = option["text"].as_str()?;
            let score = option["_score"]
                .as_f64()
                .or_else(|| option["score"].as_f64())
                .unwrap_or(0.0);
            Some(Suggestion::new(text, score))
        })
        .collect()
}
