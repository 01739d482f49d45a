//! In-memory engine and record source shared by the integration tests.
//!
//! `InMemoryEngine` interprets the part of the query DSL the query builder emits:
//! `match_all`, `bool` (must/filter), `multi_match`, `term`, `terms`, `range`,
//! `sort`, `from` and `size`. Multi-match is token equality on lowercased words.

#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use clinic_search_repository::{
    BulkItemResult, BulkOperation, BulkResponse, ClusterHealth, IndexDefinition,
    IndexDocumentRequest, RecordSource, RecordSourceError, SearchEngine, SearchEngineError,
    SyncDocument,
};
use clinic_search_shared::IndexName;
use serde_json::{json, Value};

#[derive(Default)]
struct IndexState {
    mappings: Value,
    documents: BTreeMap<String, Value>,
}

#[derive(Default)]
pub struct InMemoryEngine {
    indices: Mutex<HashMap<IndexName, IndexState>>,
    create_calls: Mutex<usize>,
    bulk_calls: Mutex<usize>,
    failing_bulk_calls: Mutex<HashSet<usize>>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_calls(&self) -> usize {
        *self.create_calls.lock().unwrap()
    }

    /// Bulk call number `n` (1-based) fails as a whole.
    pub fn fail_bulk_call(&self, n: usize) {
        self.failing_bulk_calls.lock().unwrap().insert(n);
    }

    pub fn mappings(&self, index: IndexName) -> Option<Value> {
        self.indices
            .lock()
            .unwrap()
            .get(&index)
            .map(|state| state.mappings.clone())
    }

    fn missing(index: IndexName) -> SearchEngineError {
        SearchEngineError::index(format!("index_not_found_exception: no such index [{}]", index))
    }
}

/// Value at a dotted path, falling back to the parent field for sub-fields such
/// as `name.keyword`.
fn field_value<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let pointer = format!("/{}", path.replace('.', "/"));
    doc.pointer(&pointer)
        .or_else(|| path.split('.').next().and_then(|root| doc.get(root)))
}

fn values_of(doc: &Value, path: &str) -> Vec<Value> {
    match field_value(doc, path) {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(value) => vec![value.clone()],
    }
}

fn words(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect(),
        Value::Array(items) => items.iter().flat_map(words).collect(),
        _ => Vec::new(),
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Relevance score if `doc` matches `query`.
fn evaluate(query: &Value, doc: &Value) -> Option<f64> {
    if query.get("match_all").is_some() {
        return Some(1.0);
    }
    if let Some(clause) = query.get("bool") {
        let mut score = 0.0;
        for must in clause["must"].as_array().into_iter().flatten() {
            score += evaluate(must, doc)?;
        }
        for filter in clause["filter"].as_array().into_iter().flatten() {
            evaluate(filter, doc)?;
        }
        return Some(score.max(1.0));
    }
    if let Some(clause) = query.get("multi_match") {
        let tokens = words(&clause["query"]);
        let mut score = 0.0;
        for field in clause["fields"].as_array().into_iter().flatten() {
            let field = field.as_str().unwrap_or_default();
            let (path, boost) = match field.split_once('^') {
                Some((path, boost)) => (path, boost.parse::<f64>().unwrap_or(1.0)),
                None => (field, 1.0),
            };
            let field_words: Vec<String> = values_of(doc, path).iter().flat_map(words).collect();
            let hits = tokens.iter().filter(|t| field_words.contains(t)).count();
            score += hits as f64 * boost;
        }
        return (score > 0.0).then_some(score);
    }
    if let Some(clause) = query.get("term").and_then(Value::as_object) {
        let (field, expected) = clause.iter().next()?;
        return values_of(doc, field).contains(expected).then_some(0.0);
    }
    if let Some(clause) = query.get("terms").and_then(Value::as_object) {
        let (field, expected) = clause.iter().next()?;
        let expected = expected.as_array()?;
        let actual = values_of(doc, field);
        return expected.iter().any(|v| actual.contains(v)).then_some(0.0);
    }
    if let Some(clause) = query.get("range").and_then(Value::as_object) {
        let (field, bounds) = clause.iter().next()?;
        let actual = field_value(doc, field)?;
        if let Some(gte) = bounds.get("gte") {
            if compare(actual, gte)? == Ordering::Less {
                return None;
            }
        }
        if let Some(lte) = bounds.get("lte") {
            if compare(actual, lte)? == Ordering::Greater {
                return None;
            }
        }
        return Some(0.0);
    }
    None
}

fn sort_hits(hits: &mut [(String, f64, Value)], sort: &[Value]) {
    hits.sort_by(|a, b| {
        for clause in sort {
            let Some((field, spec)) = clause.as_object().and_then(|o| o.iter().next()) else {
                continue;
            };
            let descending = spec["order"] == "desc";
            let ordering = if field == "_score" {
                a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal)
            } else {
                match (field_value(&a.2, field), field_value(&b.2, field)) {
                    (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
                    (Some(_), None) => return Ordering::Less,
                    (None, Some(_)) => return Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            };
            let ordering = if descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        a.0.cmp(&b.0)
    });
}

#[async_trait]
impl SearchEngine for InMemoryEngine {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn ping(&self) -> bool {
        true
    }

    async fn cluster_health(&self) -> Result<ClusterHealth, SearchEngineError> {
        Ok(ClusterHealth::from_value(
            &json!({"cluster_name": "memory", "status": "green", "number_of_nodes": 1}),
        ))
    }

    async fn create_index(&self, definition: &IndexDefinition) -> Result<(), SearchEngineError> {
        *self.create_calls.lock().unwrap() += 1;
        let mut indices = self.indices.lock().unwrap();
        if indices.contains_key(&definition.index) {
            return Err(SearchEngineError::index_creation(format!(
                "resource_already_exists_exception: index [{}] already exists",
                definition.index
            )));
        }
        indices.insert(
            definition.index,
            IndexState {
                mappings: definition.mappings.clone(),
                documents: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn index_exists(&self, index: IndexName) -> bool {
        self.indices.lock().unwrap().contains_key(&index)
    }

    async fn delete_index(&self, index: IndexName) -> Result<(), SearchEngineError> {
        self.indices.lock().unwrap().remove(&index);
        Ok(())
    }

    async fn index_document(
        &self,
        request: IndexDocumentRequest,
    ) -> Result<String, SearchEngineError> {
        let mut indices = self.indices.lock().unwrap();
        let state = indices
            .get_mut(&request.index)
            .ok_or_else(|| Self::missing(request.index))?;
        let id = request
            .id
            .ok_or_else(|| SearchEngineError::validation("in-memory engine requires ids"))?;
        state.documents.insert(id.clone(), request.document);
        Ok(id)
    }

    async fn get_document(
        &self,
        index: IndexName,
        id: &str,
    ) -> Result<Option<Value>, SearchEngineError> {
        let indices = self.indices.lock().unwrap();
        let state = indices.get(&index).ok_or_else(|| Self::missing(index))?;
        Ok(state.documents.get(id).cloned())
    }

    async fn update_document(
        &self,
        index: IndexName,
        id: &str,
        partial: &Value,
        _refresh: bool,
    ) -> Result<(), SearchEngineError> {
        let mut indices = self.indices.lock().unwrap();
        let state = indices.get_mut(&index).ok_or_else(|| Self::missing(index))?;
        let document = state
            .documents
            .get_mut(id)
            .ok_or_else(|| SearchEngineError::document_not_found(index.as_str(), id))?;
        if let (Some(target), Some(fields)) = (document.as_object_mut(), partial.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn delete_document(
        &self,
        index: IndexName,
        id: &str,
        _refresh: bool,
    ) -> Result<(), SearchEngineError> {
        if let Some(state) = self.indices.lock().unwrap().get_mut(&index) {
            state.documents.remove(id);
        }
        Ok(())
    }

    async fn search(&self, index: IndexName, body: &Value) -> Result<Value, SearchEngineError> {
        let indices = self.indices.lock().unwrap();
        let state = indices.get(&index).ok_or_else(|| Self::missing(index))?;

        let mut hits: Vec<(String, f64, Value)> = state
            .documents
            .iter()
            .filter_map(|(id, doc)| {
                evaluate(&body["query"], doc).map(|score| (id.clone(), score, doc.clone()))
            })
            .collect();
        let total = hits.len();

        let sort = body["sort"].as_array().cloned().unwrap_or_default();
        sort_hits(&mut hits, &sort);

        let from = body["from"].as_u64().unwrap_or(0) as usize;
        let size = body["size"].as_u64().unwrap_or(10) as usize;
        let page: Vec<Value> = hits
            .into_iter()
            .skip(from)
            .take(size)
            .map(|(id, score, source)| json!({"_id": id, "_score": score, "_source": source}))
            .collect();

        Ok(json!({
            "took": 1,
            "hits": { "total": { "value": total, "relation": "eq" }, "hits": page }
        }))
    }

    async fn count(&self, index: IndexName) -> Result<u64, SearchEngineError> {
        let indices = self.indices.lock().unwrap();
        let state = indices.get(&index).ok_or_else(|| Self::missing(index))?;
        Ok(state.documents.len() as u64)
    }

    async fn bulk(
        &self,
        operations: Vec<BulkOperation>,
        _refresh: bool,
    ) -> Result<BulkResponse, SearchEngineError> {
        let call = {
            let mut calls = self.bulk_calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        if self.failing_bulk_calls.lock().unwrap().contains(&call) {
            return Err(SearchEngineError::bulk_index("simulated bulk failure"));
        }

        let mut indices = self.indices.lock().unwrap();
        let mut items = Vec::with_capacity(operations.len());
        for op in operations {
            let status = match indices.get_mut(&op.target()) {
                None => 404,
                Some(state) => {
                    match &op {
                        BulkOperation::Index { id, document, .. } => {
                            state.documents.insert(id.clone(), document.clone());
                        }
                        BulkOperation::Update { id, partial, .. } => {
                            if let (Some(Value::Object(target)), Some(fields)) =
                                (state.documents.get_mut(id), partial.as_object())
                            {
                                for (key, value) in fields {
                                    target.insert(key.clone(), value.clone());
                                }
                            }
                        }
                        BulkOperation::Delete { id, .. } => {
                            state.documents.remove(id);
                        }
                    }
                    200
                }
            };
            items.push(BulkItemResult {
                action: op.action().to_string(),
                index: op.target().as_str().to_string(),
                id: op.id().to_string(),
                status,
                error: (status >= 300).then(|| "index_not_found_exception".to_string()),
            });
        }

        Ok(BulkResponse {
            took: 1,
            errors: items.iter().any(|item| !item.is_success()),
            items,
        })
    }

    async fn refresh_index(&self, index: IndexName) -> Result<(), SearchEngineError> {
        if self.index_exists(index).await {
            Ok(())
        } else {
            Err(Self::missing(index))
        }
    }

    async fn get_mapping(&self, index: IndexName) -> Result<Value, SearchEngineError> {
        self.mappings(index).ok_or_else(|| Self::missing(index))
    }

    async fn put_mapping(
        &self,
        index: IndexName,
        mapping: &Value,
    ) -> Result<(), SearchEngineError> {
        let mut indices = self.indices.lock().unwrap();
        let state = indices.get_mut(&index).ok_or_else(|| Self::missing(index))?;
        if let (Some(target), Some(fields)) = (state.mappings.as_object_mut(), mapping.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }
}

/// Record source over a fixed list of documents.
pub struct VecSource {
    documents: Vec<SyncDocument>,
    text_field: &'static str,
}

impl VecSource {
    pub fn new(documents: Vec<Value>, text_field: &'static str) -> Self {
        let documents = documents
            .into_iter()
            .map(|doc| {
                let id = doc["id"].as_str().unwrap_or_default().to_string();
                SyncDocument::new(id, doc)
            })
            .collect();
        Self {
            documents,
            text_field,
        }
    }
}

#[async_trait]
impl RecordSource for VecSource {
    async fn count(&self) -> Result<u64, RecordSourceError> {
        Ok(self.documents.len() as u64)
    }

    async fn fetch_batch(
        &self,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<SyncDocument>, RecordSourceError> {
        Ok(self
            .documents
            .iter()
            .skip(offset as usize)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_by_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, RecordSourceError> {
        let mut values: Vec<String> = self
            .documents
            .iter()
            .filter_map(|doc| doc.body[self.text_field].as_str())
            .filter(|value| value.starts_with(prefix))
            .map(str::to_string)
            .collect();
        values.sort();
        values.dedup();
        values.truncate(limit);
        Ok(values)
    }
}

/// `count` pet documents with ids `pet-001..`, alternating dog/cat.
pub fn pets(count: usize) -> Vec<Value> {
    (1..=count)
        .map(|i| {
            json!({
                "id": format!("pet-{:03}", i),
                "name": format!("Pet {}", i),
                "species": if i % 2 == 0 { "cat" } else { "dog" },
                "status": "active",
                "createdAt": format!("2024-01-{:02}T00:00:00Z", (i % 28) + 1)
            })
        })
        .collect()
}

/// A minimal complete document for any clinic index.
pub fn sample_document(index: IndexName, id: &str) -> Value {
    match index {
        IndexName::Pets => json!({"id": id, "name": "Pet", "species": "dog", "status": "active"}),
        IndexName::Appointments => json!({
            "id": id, "petId": "p1", "ownerId": "u1", "clinicId": "c1",
            "appointmentDate": "2024-05-01T09:00:00Z", "appointmentType": "checkup",
            "status": "scheduled", "priority": "normal"
        }),
        IndexName::Users => json!({
            "id": id, "firstName": "Ana", "lastName": "Silva", "fullName": "Ana Silva",
            "email": "ana@example.com", "role": "owner", "status": "active"
        }),
        IndexName::Clinics => json!({
            "id": id, "name": "Clinic", "isEmergency": false, "status": "active"
        }),
        IndexName::HealthRecords => json!({
            "id": id, "petId": "p1", "recordType": "vaccination", "title": "Rabies",
            "priority": "normal", "status": "active", "recordDate": "2024-03-01T00:00:00Z"
        }),
        IndexName::Faqs => json!({
            "id": id, "question": "Question?", "answer": "Answer", "category": "general",
            "isPublished": true
        }),
    }
}
