//! Request and response types for search engine operations.

use clinic_search_shared::IndexName;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::SearchEngineError;

/// Request to index (create or replace) one document.
///
/// When `id` is `None` the engine assigns one; sync paths always pass the
/// primary-store id.
#[derive(Debug, Clone)]
pub struct IndexDocumentRequest {
    pub index: IndexName,
    pub id: Option<String>,
    pub document: Value,
    /// Make the write visible to search before returning.
    pub refresh: bool,
}

/// One action inside a bulk call.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOperation {
    /// Create or replace the document.
    Index {
        index: IndexName,
        id: String,
        document: Value,
    },
    /// Merge a partial document into an existing one.
    Update {
        index: IndexName,
        id: String,
        partial: Value,
    },
    Delete {
        index: IndexName,
        id: String,
    },
}

impl BulkOperation {
    pub fn index(index: IndexName, id: impl Into<String>, document: Value) -> Self {
        Self::Index {
            index,
            id: id.into(),
            document,
        }
    }

    pub fn delete(index: IndexName, id: impl Into<String>) -> Self {
        Self::Delete {
            index,
            id: id.into(),
        }
    }

    /// The bulk action name.
    pub fn action(&self) -> &'static str {
        match self {
            BulkOperation::Index { .. } => "index",
            BulkOperation::Update { .. } => "update",
            BulkOperation::Delete { .. } => "delete",
        }
    }

    pub fn target(&self) -> IndexName {
        match self {
            BulkOperation::Index { index, .. }
            | BulkOperation::Update { index, .. }
            | BulkOperation::Delete { index, .. } => *index,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            BulkOperation::Index { id, .. }
            | BulkOperation::Update { id, .. }
            | BulkOperation::Delete { id, .. } => id,
        }
    }

    /// The NDJSON lines this operation contributes to a bulk body.
    pub fn to_lines(&self) -> Vec<Value> {
        let header = json!({
            self.action(): { "_index": self.target().as_str(), "_id": self.id() }
        });
        match self {
            BulkOperation::Index { document, .. } => vec![header, document.clone()],
            BulkOperation::Update { partial, .. } => vec![header, json!({ "doc": partial })],
            BulkOperation::Delete { .. } => vec![header],
        }
    }
}

/// Outcome of one bulk action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkItemResult {
    pub action: String,
    pub index: String,
    pub id: String,
    pub status: u16,
    /// Engine error reason when the action failed.
    pub error: Option<String>,
}

impl BulkItemResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status)
    }
}

/// Parsed response of a bulk call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkResponse {
    pub took: u64,
    /// True when at least one item failed.
    pub errors: bool,
    pub items: Vec<BulkItemResult>,
}

impl BulkResponse {
    /// Parse the engine's bulk response body.
    pub fn from_value(body: &Value) -> Result<Self, SearchEngineError> {
        let items = body
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| SearchEngineError::parse("bulk response has no items array"))?;

        let mut parsed = Vec::with_capacity(items.len());
        for item in items {
            let (action, detail) = item
                .as_object()
                .and_then(|obj| obj.iter().next())
                .ok_or_else(|| SearchEngineError::parse("malformed bulk item"))?;

            let error = detail.get("error").map(|e| {
                match (
                    e.get("type").and_then(Value::as_str),
                    e.get("reason").and_then(Value::as_str),
                ) {
                    (Some(kind), Some(reason)) => format!("{}: {}", kind, reason),
                    (None, Some(reason)) => reason.to_string(),
                    _ => e.to_string(),
                }
            });

            parsed.push(BulkItemResult {
                action: action.clone(),
                index: detail
                    .get("_index")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                id: detail
                    .get("_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                status: detail
                    .get("status")
                    .and_then(Value::as_u64)
                    .unwrap_or_default() as u16,
                error,
            });
        }

        Ok(Self {
            took: body.get("took").and_then(Value::as_u64).unwrap_or_default(),
            errors: body
                .get("errors")
                .and_then(Value::as_bool)
                .unwrap_or_else(|| parsed.iter().any(|i| !i.is_success())),
            items: parsed,
        })
    }

    /// Items that failed, in request order.
    pub fn failed_items(&self) -> impl Iterator<Item = &BulkItemResult> {
        self.items.iter().filter(|item| !item.is_success())
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.is_success()).count()
    }
}

/// Cluster health summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterHealth {
    pub cluster_name: String,
    /// `green`, `yellow` or `red`.
    pub status: String,
    pub number_of_nodes: u64,
    pub active_shards: u64,
    pub unassigned_shards: u64,
}

impl ClusterHealth {
    pub fn from_value(body: &Value) -> Self {
        let text = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string()
        };
        let number = |key: &str| body.get(key).and_then(Value::as_u64).unwrap_or_default();

        Self {
            cluster_name: text("cluster_name"),
            status: text("status"),
            number_of_nodes: number("number_of_nodes"),
            active_shards: number("active_shards"),
            unassigned_shards: number("unassigned_shards"),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "green" || self.status == "yellow"
    }
}

/// Whether the engine is switched on and reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub enabled: bool,
    pub connected: bool,
}

/// Outcome of an idempotent index creation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexCreationReport {
    pub created: Vec<IndexName>,
    pub existing: Vec<IndexName>,
}

/// A record projected into its search document, ready for a bulk call.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncDocument {
    /// Primary-store primary key, used as the engine document id.
    pub id: String,
    pub body: Value,
}

impl SyncDocument {
    pub fn new(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }
}
