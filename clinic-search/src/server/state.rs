// App state for the Axum server
use std::sync::Arc;

use clinic_search_repository::{
    IndexLifecycleManager, RecordSources, SearchEngine, SearchService, SuggestionService,
    SyncService,
};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn SearchEngine>,
    pub indices: Arc<IndexLifecycleManager>,
    pub sync: Arc<SyncService>,
    pub search: Arc<SearchService>,
    pub suggestions: Arc<SuggestionService>,
    /// `None` disables the destructive management routes.
    pub operator_token: Option<String>,
}

impl AppState {
    /// Wire every service over one engine handle and one set of record sources.
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        sources: RecordSources,
        shards: u32,
        replicas: u32,
        operator_token: Option<String>,
    ) -> Self {
        let indices = Arc::new(IndexLifecycleManager::new(engine.clone(), shards, replicas));

        Self {
            sync: Arc::new(SyncService::new(engine.clone(), indices.clone(), sources.clone())),
            search: Arc::new(SearchService::new(engine.clone())),
            suggestions: Arc::new(SuggestionService::new(engine.clone(), sources)),
            indices,
            engine,
            operator_token,
        }
    }
}
