//! Entity search and global search over the clinic indices.
//!
//! Every operation fails fast with `ServiceDisabled` when the engine is switched off,
//! so callers can tell "no results" from "search unavailable".

use std::sync::Arc;

use clinic_search_shared::{
    AppointmentDocument, ClinicDocument, FaqDocument, GlobalSearchResult, HealthRecordDocument,
    IndexName, PetDocument, SearchFilters, SearchOptions, SearchResult, UserDocument,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::errors::SearchEngineError;
use crate::interfaces::SearchEngine;
use crate::query::{parse_search_response, FilterPolicy, QueryBuilder};

/// Per-index cap applied to each branch of a global search.
pub const GLOBAL_SEARCH_CAP: usize = 5;

pub struct SearchService {
    engine: Arc<dyn SearchEngine>,
}

impl SearchService {
    pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
        Self { engine }
    }

    /// Search one index and decode hits as `T`.
    #[instrument(skip(self, filters, options), fields(index = %index))]
    pub async fn search<T: DeserializeOwned>(
        &self,
        index: IndexName,
        query: &str,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<SearchResult<T>, SearchEngineError> {
        self.run(index, query, filters, options, FilterPolicy::Reject)
            .await
    }

    async fn run<T: DeserializeOwned>(
        &self,
        index: IndexName,
        query: &str,
        filters: &SearchFilters,
        options: &SearchOptions,
        policy: FilterPolicy,
    ) -> Result<SearchResult<T>, SearchEngineError> {
        if !self.engine.is_enabled() {
            return Err(SearchEngineError::ServiceDisabled);
        }

        let body = QueryBuilder::search(index, query, filters, options, policy)?;
        let response = self.engine.search(index, &body.to_value()).await?;
        let result = parse_search_response(&response)?;

        debug!(index = %index, total = result.total, hits = result.len(), "Search complete");
        Ok(result)
    }

    pub async fn search_pets(
        &self,
        query: &str,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<SearchResult<PetDocument>, SearchEngineError> {
        self.search(IndexName::Pets, query, filters, options).await
    }

    pub async fn search_appointments(
        &self,
        query: &str,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<SearchResult<AppointmentDocument>, SearchEngineError> {
        self.search(IndexName::Appointments, query, filters, options)
            .await
    }

    pub async fn search_users(
        &self,
        query: &str,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<SearchResult<UserDocument>, SearchEngineError> {
        self.search(IndexName::Users, query, filters, options).await
    }

    pub async fn search_clinics(
        &self,
        query: &str,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<SearchResult<ClinicDocument>, SearchEngineError> {
        self.search(IndexName::Clinics, query, filters, options)
            .await
    }

    pub async fn search_health_records(
        &self,
        query: &str,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<SearchResult<HealthRecordDocument>, SearchEngineError> {
        self.search(IndexName::HealthRecords, query, filters, options)
            .await
    }

    pub async fn search_faqs(
        &self,
        query: &str,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<SearchResult<FaqDocument>, SearchEngineError> {
        self.search(IndexName::Faqs, query, filters, options).await
    }

    /// Search the five clinic indices concurrently.
    ///
    /// Each branch is capped at `min(options.size, 5)` hits and receives only the
    /// filters its index supports. A failing branch yields an empty result and an
    /// entry in `errors`; if every branch fails the first error is returned.
    #[instrument(skip(self, filters, options))]
    pub async fn global_search(
        &self,
        query: &str,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<GlobalSearchResult, SearchEngineError> {
        if !self.engine.is_enabled() {
            return Err(SearchEngineError::ServiceDisabled);
        }

        let mut capped = options.clone();
        capped.size = options.size.min(GLOBAL_SEARCH_CAP);

        let branch = |index: IndexName| self.run::<Value>(index, query, filters, &capped, FilterPolicy::Restrict);
        let (pets, appointments, users, clinics, health_records) = tokio::join!(
            branch(IndexName::Pets),
            branch(IndexName::Appointments),
            branch(IndexName::Users),
            branch(IndexName::Clinics),
            branch(IndexName::HealthRecords),
        );

        let mut errors = std::collections::BTreeMap::new();
        let mut first_error = None;
        let mut settle = |index: IndexName, outcome: Result<SearchResult<Value>, SearchEngineError>| {
            outcome.unwrap_or_else(|e| {
                warn!(index = %index, error = %e, "Global search branch failed");
                errors.insert(index.as_str().to_string(), e.to_string());
                first_error.get_or_insert(e);
                SearchResult::empty()
            })
        };

        let result = GlobalSearchResult {
            pets: settle(IndexName::Pets, pets),
            appointments: settle(IndexName::Appointments, appointments),
            users: settle(IndexName::Users, users),
            clinics: settle(IndexName::Clinics, clinics),
            health_records: settle(IndexName::HealthRecords, health_records),
            errors: Default::default(),
        };

        if errors.len() == IndexName::CLINIC_INDICES.len() {
            if let Some(err) = first_error {
                return Err(err);
            }
        }
        Ok(GlobalSearchResult { errors, ..result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disabled::DisabledSearchEngine;
    use crate::testing::MockEngine;
    use serde_json::json;

    fn pet_hits(count: usize) -> Value {
        let hits: Vec<Value> = (1..=count)
            .map(|i| {
                json!({
                    "_id": format!("p{}", i),
                    "_score": 1.0,
                    "_source": {"id": format!("p{}", i), "name": format!("Pet {}", i), "species": "dog", "status": "active"}
                })
            })
            .collect();
        json!({ "hits": { "total": { "value": count }, "hits": hits } })
    }

    #[tokio::test]
    async fn test_search_pets_decodes_typed_hits() {
        let engine = Arc::new(MockEngine::new());
        engine.respond_to_search(IndexName::Pets, Ok(pet_hits(2)));
        let service = SearchService::new(engine.clone());

        let filters = SearchFilters {
            status: Some(vec!["active".to_string()]),
            ..Default::default()
        };
        let result = service
            .search_pets("dog", &filters, &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(result.total, 2);
        assert_eq!(result.hits[0].source.name, "Pet 1");
        let (index, body) = &engine.searches()[0];
        assert_eq!(*index, IndexName::Pets);
        assert_eq!(body["query"]["bool"]["filter"][0]["terms"]["status"], json!(["active"]));
    }

    #[tokio::test]
    async fn test_engine_errors_propagate_unchanged() {
        let engine = Arc::new(MockEngine::new());
        engine.respond_to_search(
            IndexName::Clinics,
            Err(SearchEngineError::connection("connection refused")),
        );
        let service = SearchService::new(engine);

        let err = service
            .search_clinics("vet", &SearchFilters::default(), &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_disabled_engine_never_returns_empty_results() {
        let service = SearchService::new(Arc::new(DisabledSearchEngine::new()));

        let err = service
            .search_pets("", &SearchFilters::default(), &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_disabled());

        let err = service
            .global_search("", &SearchFilters::default(), &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_disabled());
    }

    #[tokio::test]
    async fn test_global_search_caps_each_branch() {
        let engine = Arc::new(MockEngine::new());
        let service = SearchService::new(engine.clone());

        let options = SearchOptions::default().with_size(100);
        service
            .global_search("max", &SearchFilters::default(), &options)
            .await
            .unwrap();

        let searches = engine.searches();
        assert_eq!(searches.len(), 5);
        assert!(searches.iter().all(|(_, body)| body["size"] == 5));
    }

    #[tokio::test]
    async fn test_global_search_restricts_filters_per_index() {
        let engine = Arc::new(MockEngine::new());
        let service = SearchService::new(engine.clone());

        let filters = SearchFilters {
            priority: Some(vec!["high".to_string()]),
            ..Default::default()
        };
        service
            .global_search("", &filters, &SearchOptions::default())
            .await
            .unwrap();

        for (index, body) in engine.searches() {
            let has_priority = body["query"]["bool"]["filter"]
                .as_array()
                .is_some_and(|f| f.iter().any(|c| c["terms"].get("priority").is_some()));
            let expected = matches!(index, IndexName::Appointments | IndexName::HealthRecords);
            assert_eq!(has_priority, expected, "{index}");
        }
    }

    #[tokio::test]
    async fn test_global_search_isolates_branch_failures() {
        let engine = Arc::new(MockEngine::new());
        engine.respond_to_search(IndexName::Pets, Ok(pet_hits(3)));
        engine.respond_to_search(IndexName::Users, Err(SearchEngineError::Timeout(30_000)));
        let service = SearchService::new(engine);

        let result = service
            .global_search("", &SearchFilters::default(), &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(result.pets.len(), 3);
        assert!(result.users.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors["users"].contains("timed out"));
    }

    #[tokio::test]
    async fn test_global_search_fails_when_every_branch_fails() {
        let engine = Arc::new(MockEngine::new());
        for index in IndexName::CLINIC_INDICES {
            engine.respond_to_search(index, Err(SearchEngineError::connection("down")));
        }
        let service = SearchService::new(engine);

        let err = service
            .global_search("", &SearchFilters::default(), &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }
}
