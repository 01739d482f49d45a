//! Recording mock engine and record source shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use clinic_search_shared::IndexName;
use serde_json::{json, Value};

use crate::errors::{RecordSourceError, SearchEngineError};
use crate::interfaces::{RecordSource, SearchEngine};
use crate::schema::IndexDefinition;
use crate::types::{
    BulkItemResult, BulkOperation, BulkResponse, ClusterHealth, IndexDocumentRequest,
    SyncDocument,
};

#[derive(Default)]
pub(crate) struct MockEngine {
    indices: Mutex<HashSet<IndexName>>,
    created: Mutex<Vec<IndexName>>,
    create_failure: Mutex<Option<SearchEngineError>>,
    documents: Mutex<HashMap<(IndexName, String), Value>>,
    bulk_calls: Mutex<Vec<Vec<BulkOperation>>>,
    failing_bulk_calls: Mutex<HashSet<usize>>,
    rejected_ids: Mutex<HashSet<String>>,
    searches: Mutex<Vec<(IndexName, Value)>>,
    search_responses: Mutex<HashMap<IndexName, Result<Value, SearchEngineError>>>,
    refreshed: Mutex<Vec<IndexName>>,
    mappings: Mutex<HashMap<IndexName, Value>>,
    fail_writes: AtomicBool,
    unreachable: AtomicBool,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_index(&self, index: IndexName) {
        self.indices.lock().unwrap().insert(index);
    }

    pub fn has_index(&self, index: IndexName) -> bool {
        self.indices.lock().unwrap().contains(&index)
    }

    pub fn created(&self) -> Vec<IndexName> {
        self.created.lock().unwrap().clone()
    }

    /// The next create call fails with `err`.
    pub fn fail_create_with(&self, err: SearchEngineError) {
        *self.create_failure.lock().unwrap() = Some(err);
    }

    /// Bulk call number `n` (1-based) fails as a whole.
    pub fn fail_bulk_call(&self, n: usize) {
        self.failing_bulk_calls.lock().unwrap().insert(n);
    }

    /// Bulk items with this id are rejected individually.
    pub fn reject_id(&self, id: &str) {
        self.rejected_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn bulk_calls(&self) -> Vec<Vec<BulkOperation>> {
        self.bulk_calls.lock().unwrap().clone()
    }

    pub fn respond_to_search(&self, index: IndexName, response: Result<Value, SearchEngineError>) {
        self.search_responses
            .lock()
            .unwrap()
            .insert(index, response);
    }

    pub fn searches(&self) -> Vec<(IndexName, Value)> {
        self.searches.lock().unwrap().clone()
    }

    pub fn refreshed(&self) -> Vec<IndexName> {
        self.refreshed.lock().unwrap().clone()
    }

    pub fn mapping(&self, index: IndexName) -> Option<Value> {
        self.mappings.lock().unwrap().get(&index).cloned()
    }

    pub fn document(&self, index: IndexName, id: &str) -> Option<Value> {
        self.documents
            .lock()
            .unwrap()
            .get(&(index, id.to_string()))
            .cloned()
    }

    pub fn document_count(&self, index: IndexName) -> u64 {
        self.documents
            .lock()
            .unwrap()
            .keys()
            .filter(|(i, _)| *i == index)
            .count() as u64
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check_writes(&self) -> Result<(), SearchEngineError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SearchEngineError::index("mock write failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchEngine for MockEngine {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn ping(&self) -> bool {
        !self.unreachable.load(Ordering::SeqCst)
    }

    async fn cluster_health(&self) -> Result<ClusterHealth, SearchEngineError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(SearchEngineError::connection("connection refused"));
        }
        Ok(ClusterHealth::from_value(&json!({
            "cluster_name": "mock",
            "status": "green",
            "number_of_nodes": 1
        })))
    }

    async fn create_index(&self, definition: &IndexDefinition) -> Result<(), SearchEngineError> {
        if let Some(err) = self.create_failure.lock().unwrap().take() {
            return Err(err);
        }
        self.created.lock().unwrap().push(definition.index);
        self.indices.lock().unwrap().insert(definition.index);
        self.mappings
            .lock()
            .unwrap()
            .insert(definition.index, definition.mappings.clone());
        Ok(())
    }

    async fn index_exists(&self, index: IndexName) -> bool {
        self.has_index(index)
    }

    async fn delete_index(&self, index: IndexName) -> Result<(), SearchEngineError> {
        self.indices.lock().unwrap().remove(&index);
        self.mappings.lock().unwrap().remove(&index);
        self.documents
            .lock()
            .unwrap()
            .retain(|(i, _), _| *i != index);
        Ok(())
    }

    async fn index_document(
        &self,
        request: IndexDocumentRequest,
    ) -> Result<String, SearchEngineError> {
        self.check_writes()?;
        let id = request.id.unwrap_or_else(|| "generated".to_string());
        self.documents
            .lock()
            .unwrap()
            .insert((request.index, id.clone()), request.document);
        Ok(id)
    }

    async fn get_document(
        &self,
        index: IndexName,
        id: &str,
    ) -> Result<Option<Value>, SearchEngineError> {
        Ok(self.document(index, id))
    }

    async fn update_document(
        &self,
        index: IndexName,
        id: &str,
        partial: &Value,
        _refresh: bool,
    ) -> Result<(), SearchEngineError> {
        self.check_writes()?;
        let mut documents = self.documents.lock().unwrap();
        let existing = documents
            .get_mut(&(index, id.to_string()))
            .ok_or_else(|| SearchEngineError::document_not_found(index.as_str(), id))?;
        if let (Some(target), Some(fields)) = (existing.as_object_mut(), partial.as_object()) {
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
        self.check_writes()?;
        self.documents
            .lock()
            .unwrap()
            .remove(&(index, id.to_string()));
        Ok(())
    }

    async fn search(&self, index: IndexName, body: &Value) -> Result<Value, SearchEngineError> {
        self.searches.lock().unwrap().push((index, body.clone()));
        self.search_responses
            .lock()
            .unwrap()
            .get(&index)
            .cloned()
            .unwrap_or_else(|| Ok(json!({"hits": {"total": {"value": 0}, "hits": []}})))
    }

    async fn count(&self, index: IndexName) -> Result<u64, SearchEngineError> {
        Ok(self.document_count(index))
    }

    async fn bulk(
        &self,
        operations: Vec<BulkOperation>,
        _refresh: bool,
    ) -> Result<BulkResponse, SearchEngineError> {
        let call = {
            let mut calls = self.bulk_calls.lock().unwrap();
            calls.push(operations.clone());
            calls.len()
        };

        if self.failing_bulk_calls.lock().unwrap().contains(&call) {
            return Err(SearchEngineError::bulk_index("mock bulk failure"));
        }

        let rejected = self.rejected_ids.lock().unwrap().clone();
        let mut documents = self.documents.lock().unwrap();
        let mut items = Vec::with_capacity(operations.len());
        for op in operations {
            let error = rejected
                .contains(op.id())
                .then(|| "mapper_parsing_exception: rejected".to_string());
            if error.is_none() {
                match &op {
                    BulkOperation::Index {
                        index,
                        id,
                        document,
                    } => {
                        documents.insert((*index, id.clone()), document.clone());
                    }
                    BulkOperation::Update { .. } => {}
                    BulkOperation::Delete { index, id } => {
                        documents.remove(&(*index, id.clone()));
                    }
                }
            }
            items.push(BulkItemResult {
                action: op.action().to_string(),
                index: op.target().as_str().to_string(),
                id: op.id().to_string(),
                status: if error.is_some() { 400 } else { 201 },
                error,
            });
        }

        Ok(BulkResponse {
            took: 1,
            errors: items.iter().any(|item| !item.is_success()),
            items,
        })
    }

    async fn refresh_index(&self, index: IndexName) -> Result<(), SearchEngineError> {
        self.refreshed.lock().unwrap().push(index);
        Ok(())
    }

    async fn get_mapping(&self, index: IndexName) -> Result<Value, SearchEngineError> {
        self.mapping(index)
            .ok_or_else(|| SearchEngineError::index(format!("no such index [{}]", index)))
    }

    async fn put_mapping(
        &self,
        index: IndexName,
        mapping: &Value,
    ) -> Result<(), SearchEngineError> {
        let mut mappings = self.mappings.lock().unwrap();
        let entry = mappings.entry(index).or_insert_with(|| json!({}));
        if let (Some(target), Some(fields)) = (entry.as_object_mut(), mapping.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }
}

/// In-memory record source over a fixed list of documents.
#[derive(Default)]
pub(crate) struct MockSource {
    documents: Vec<SyncDocument>,
    names: Vec<String>,
    fail_at_offset: Option<u64>,
    fail_prefix: bool,
}

impl MockSource {
    /// `count` pet-shaped documents with ids `p1..=pN`.
    pub fn pets(count: usize) -> Self {
        let documents = (1..=count)
            .map(|i| {
                let id = format!("p{}", i);
                SyncDocument::new(
                    id.clone(),
                    json!({"id": id, "name": format!("Pet {}", i), "species": "dog", "status": "active"}),
                )
            })
            .collect();
        Self {
            documents,
            ..Default::default()
        }
    }

    pub fn with_documents(documents: Vec<SyncDocument>) -> Self {
        Self {
            documents,
            ..Default::default()
        }
    }

    pub fn with_names(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn failing_at_offset(mut self, offset: u64) -> Self {
        self.fail_at_offset = Some(offset);
        self
    }

    pub fn failing_prefix_lookups(mut self) -> Self {
        self.fail_prefix = true;
        self
    }
}

#[async_trait]
impl RecordSource for MockSource {
    async fn count(&self) -> Result<u64, RecordSourceError> {
        Ok(self.documents.len() as u64)
    }

    async fn fetch_batch(
        &self,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<SyncDocument>, RecordSourceError> {
        if self.fail_at_offset == Some(offset) {
            return Err(RecordSourceError::Decode {
                id: format!("offset {}", offset),
                message: "mock fetch failure".to_string(),
            });
        }
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
        if self.fail_prefix {
            return Err(RecordSourceError::Decode {
                id: prefix.to_string(),
                message: "mock prefix failure".to_string(),
            });
        }
        let mut names: Vec<String> = self
            .names
            .iter()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect();
        names.sort();
        names.truncate(limit);
        Ok(names)
    }
}
