//! Stub engine for router-level tests.
//!
//! Stores documents per index and answers every search with all documents of the
//! index; query semantics are covered by the repository crate's tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use clinic_search_repository::{
    BulkItemResult, BulkOperation, BulkResponse, ClusterHealth, IndexDefinition,
    IndexDocumentRequest, SearchEngine, SearchEngineError,
};
use clinic_search_shared::IndexName;
use serde_json::{json, Value};

pub struct StubEngine {
    reachable: AtomicBool,
    cluster_status: Mutex<String>,
    indices: Mutex<HashMap<IndexName, (Value, BTreeMap<String, Value>)>>,
}

impl StubEngine {
    pub fn new() -> Self {
        Self {
            reachable: AtomicBool::new(true),
            cluster_status: Mutex::new("yellow".to_string()),
            indices: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn set_cluster_status(&self, status: &str) {
        *self.cluster_status.lock().unwrap() = status.to_string();
    }

    pub fn documents(&self, index: IndexName) -> Vec<Value> {
        self.indices
            .lock()
            .unwrap()
            .get(&index)
            .map(|(_, docs)| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    fn missing(index: IndexName) -> SearchEngineError {
        SearchEngineError::index(format!("index_not_found_exception: no such index [{}]", index))
    }

    fn unreachable(&self) -> Option<SearchEngineError> {
        (!self.reachable.load(Ordering::SeqCst))
            .then(|| SearchEngineError::connection("connection refused"))
    }
}

#[async_trait::async_trait]
impl SearchEngine for StubEngine {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn ping(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    async fn cluster_health(&self) -> Result<ClusterHealth, SearchEngineError> {
        if let Some(err) = self.unreachable() {
            return Err(err);
        }
        let status = self.cluster_status.lock().unwrap().clone();
        Ok(ClusterHealth::from_value(
            &json!({"cluster_name": "stub", "status": status, "number_of_nodes": 1}),
        ))
    }

    async fn create_index(&self, definition: &IndexDefinition) -> Result<(), SearchEngineError> {
        let mut indices = self.indices.lock().unwrap();
        if indices.contains_key(&definition.index) {
            return Err(SearchEngineError::index_creation(
                "resource_already_exists_exception",
            ));
        }
        indices.insert(
            definition.index,
            (definition.mappings.clone(), BTreeMap::new()),
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
        let (_, docs) = indices
            .get_mut(&request.index)
            .ok_or_else(|| Self::missing(request.index))?;
        let id = request.id.unwrap_or_else(|| format!("auto-{}", docs.len() + 1));
        docs.insert(id.clone(), request.document);
        Ok(id)
    }

    async fn get_document(
        &self,
        index: IndexName,
        id: &str,
    ) -> Result<Option<Value>, SearchEngineError> {
        let indices = self.indices.lock().unwrap();
        let (_, docs) = indices.get(&index).ok_or_else(|| Self::missing(index))?;
        Ok(docs.get(id).cloned())
    }

    async fn update_document(
        &self,
        index: IndexName,
        id: &str,
        partial: &Value,
        _refresh: bool,
    ) -> Result<(), SearchEngineError> {
        let mut indices = self.indices.lock().unwrap();
        let (_, docs) = indices.get_mut(&index).ok_or_else(|| Self::missing(index))?;
        let document = docs
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
        if let Some((_, docs)) = self.indices.lock().unwrap().get_mut(&index) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn search(&self, index: IndexName, _body: &Value) -> Result<Value, SearchEngineError> {
        if let Some(err) = self.unreachable() {
            return Err(err);
        }
        let indices = self.indices.lock().unwrap();
        let (_, docs) = indices.get(&index).ok_or_else(|| Self::missing(index))?;
        let hits: Vec<Value> = docs
            .iter()
            .map(|(id, doc)| json!({"_id": id, "_score": 1.0, "_source": doc}))
            .collect();
        Ok(json!({"hits": {"total": {"value": hits.len()}, "hits": hits}}))
    }

    async fn count(&self, index: IndexName) -> Result<u64, SearchEngineError> {
        let indices = self.indices.lock().unwrap();
        let (_, docs) = indices.get(&index).ok_or_else(|| Self::missing(index))?;
        Ok(docs.len() as u64)
    }

    async fn bulk(
        &self,
        operations: Vec<BulkOperation>,
        _refresh: bool,
    ) -> Result<BulkResponse, SearchEngineError> {
        let mut indices = self.indices.lock().unwrap();
        let mut items = Vec::with_capacity(operations.len());
        for op in operations {
            let status = match (indices.get_mut(&op.target()), &op) {
                (Some((_, docs)), BulkOperation::Index { id, document, .. }) => {
                    docs.insert(id.clone(), document.clone());
                    201
                }
                (Some((_, docs)), BulkOperation::Delete { id, .. }) => {
                    docs.remove(id);
                    200
                }
                (Some(_), BulkOperation::Update { .. }) => 200,
                (None, _) => 404,
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
        let indices = self.indices.lock().unwrap();
        let (mappings, _) = indices.get(&index).ok_or_else(|| Self::missing(index))?;
        Ok(mappings.clone())
    }

    async fn put_mapping(
        &self,
        index: IndexName,
        mapping: &Value,
    ) -> Result<(), SearchEngineError> {
        let mut indices = self.indices.lock().unwrap();
        let (mappings, _) = indices.get_mut(&index).ok_or_else(|| Self::missing(index))?;
        if let (Some(target), Some(fields)) = (mappings.as_object_mut(), mapping.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }
}
