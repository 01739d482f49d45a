//! OpenSearch engine implementation.
//!
//! This module provides the live implementation of `SearchEngine` using the
//! OpenSearch Rust crate. Every call is bounded by the configured request timeout.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use clinic_search_shared::IndexName;
use opensearch::{
    auth::Credentials,
    cert::CertificateValidation,
    cluster::ClusterHealthParts,
    http::request::JsonBody,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{
        IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesGetMappingParts,
        IndicesPutMappingParts, IndicesRefreshParts,
    },
    params::Refresh,
    BulkParts, CountParts, DeleteParts, GetParts, IndexParts, OpenSearch, SearchParts,
    UpdateParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::SearchEngineConfig;
use crate::errors::SearchEngineError;
use crate::interfaces::SearchEngine;
use crate::schema::IndexDefinition;
use crate::types::{BulkOperation, BulkResponse, ClusterHealth, IndexDocumentRequest};

/// Live search engine backed by OpenSearch.
///
/// # Example
///
/// ```ignore
/// use clinic_search_repository::{OpenSearchEngine, SearchEngineConfig};
///
/// let engine = OpenSearchEngine::new(&SearchEngineConfig::single_node("http://localhost:9200"))?;
/// let connected = engine.ping().await;
/// ```
pub struct OpenSearchEngine {
    client: OpenSearch,
    request_timeout: Duration,
}

fn refresh_param(refresh: bool) -> Refresh {
    if refresh {
        Refresh::True
    } else {
        Refresh::False
    }
}

impl OpenSearchEngine {
    /// Create a new engine client from connection settings.
    ///
    /// # Arguments
    ///
    /// * `config` - Node list, credentials, TLS and timeout settings
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchEngine)` - A client ready to issue requests
    /// * `Err(SearchEngineError)` - If the node URL is invalid or the transport cannot be built
    pub fn new(config: &SearchEngineConfig) -> Result<Self, SearchEngineError> {
        let node = config
            .nodes
            .first()
            .ok_or_else(|| SearchEngineError::connection("no search engine nodes configured"))?;

        if config.nodes.len() > 1 {
            warn!(
                node = %node,
                ignored = config.nodes.len() - 1,
                "Multiple search engine nodes configured, only the first is used"
            );
        }

        let parsed_url =
            Url::parse(node).map_err(|e| SearchEngineError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .timeout(config.request_timeout);

        if !config.reject_unauthorized {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        if let Some((username, password)) = config.credentials() {
            builder = builder.auth(Credentials::Basic(
                username.to_string(),
                password.to_string(),
            ));
        }

        let transport = builder
            .build()
            .map_err(|e| SearchEngineError::connection(e.to_string()))?;

        info!(
            url = %node,
            authenticated = config.credentials().is_some(),
            timeout_ms = config.request_timeout.as_millis() as u64,
            "Created OpenSearch engine client"
        );

        Ok(Self {
            client: OpenSearch::new(transport),
            request_timeout: config.request_timeout,
        })
    }

    /// Bound an engine call by the request timeout.
    async fn execute<T, F>(&self, operation: &str, call: F) -> Result<T, SearchEngineError>
    where
        F: Future<Output = Result<T, SearchEngineError>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = self.request_timeout.as_millis() as u64;
                error!(operation, timeout_ms, "Search engine request timed out");
                Err(SearchEngineError::Timeout(timeout_ms))
            }
        }
    }

    /// Turn a non-2xx response into the operation's error, keeping the engine body.
    async fn check(
        response: Response,
        operation: &str,
        to_error: fn(String) -> SearchEngineError,
    ) -> Result<Response, SearchEngineError> {
        let status = response.status_code();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %error_body, operation, "Search engine request failed");
        Err(to_error(format!(
            "{} failed with status {}: {}",
            operation, status, error_body
        )))
    }

    async fn read_json(response: Response) -> Result<Value, SearchEngineError> {
        response
            .json::<Value>()
            .await
            .map_err(|e| SearchEngineError::parse(e.to_string()))
    }

    fn send_error(operation: &str, err: opensearch::Error) -> SearchEngineError {
        SearchEngineError::connection(format!("{}: {}", operation, err))
    }
}

#[async_trait]
impl SearchEngine for OpenSearchEngine {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn ping(&self) -> bool {
        let result = self
            .execute("ping", async {
                self.client
                    .ping()
                    .send()
                    .await
                    .map_err(|e| Self::send_error("ping", e))
            })
            .await;

        match result {
            Ok(response) => response.status_code().is_success(),
            Err(e) => {
                warn!(error = %e, "Search engine ping failed");
                false
            }
        }
    }

    async fn cluster_health(&self) -> Result<ClusterHealth, SearchEngineError> {
        self.execute("cluster health", async {
            let response = self
                .client
                .cluster()
                .health(ClusterHealthParts::None)
                .send()
                .await
                .map_err(|e| Self::send_error("cluster health", e))?;
            let response =
                Self::check(response, "cluster health", SearchEngineError::ConnectionError).await?;
            let body = Self::read_json(response).await?;
            Ok(ClusterHealth::from_value(&body))
        })
        .await
    }

    async fn create_index(&self, definition: &IndexDefinition) -> Result<(), SearchEngineError> {
        let name = definition.name();
        self.execute("create index", async {
            let response = self
                .client
                .indices()
                .create(IndicesCreateParts::Index(name))
                .body(definition.create_body())
                .send()
                .await
                .map_err(|e| Self::send_error("create index", e))?;
            Self::check(response, "create index", SearchEngineError::IndexCreationError).await?;
            info!(index = %name, "Index created");
            Ok(())
        })
        .await
    }

    async fn index_exists(&self, index: IndexName) -> bool {
        let result = self
            .execute("index exists", async {
                self.client
                    .indices()
                    .exists(IndicesExistsParts::Index(&[index.as_str()]))
                    .send()
                    .await
                    .map_err(|e| Self::send_error("index exists", e))
            })
            .await;

        match result {
            Ok(response) => response.status_code().is_success(),
            Err(e) => {
                warn!(index = %index, error = %e, "Index existence check failed");
                false
            }
        }
    }

    async fn delete_index(&self, index: IndexName) -> Result<(), SearchEngineError> {
        self.execute("delete index", async {
            let response = self
                .client
                .indices()
                .delete(IndicesDeleteParts::Index(&[index.as_str()]))
                .send()
                .await
                .map_err(|e| Self::send_error("delete index", e))?;

            // 404 is acceptable - index may not exist
            if response.status_code().as_u16() == 404 {
                debug!(index = %index, "Index already absent");
                return Ok(());
            }

            Self::check(response, "delete index", SearchEngineError::DeleteError).await?;
            info!(index = %index, "Index deleted");
            Ok(())
        })
        .await
    }

    async fn index_document(
        &self,
        request: IndexDocumentRequest,
    ) -> Result<String, SearchEngineError> {
        let index = request.index.as_str();
        self.execute("index document", async {
            let parts = match request.id.as_deref() {
                Some(id) => IndexParts::IndexId(index, id),
                None => IndexParts::Index(index),
            };

            let response = self
                .client
                .index(parts)
                .body(request.document)
                .refresh(refresh_param(request.refresh))
                .send()
                .await
                .map_err(|e| Self::send_error("index document", e))?;
            let response =
                Self::check(response, "index document", SearchEngineError::IndexError).await?;
            let body = Self::read_json(response).await?;

            let id = body
                .get("_id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or(request.id.clone())
                .ok_or_else(|| SearchEngineError::parse("index response has no _id"))?;

            debug!(index = %index, id = %id, "Document indexed");
            Ok(id)
        })
        .await
    }

    async fn get_document(
        &self,
        index: IndexName,
        id: &str,
    ) -> Result<Option<Value>, SearchEngineError> {
        self.execute("get document", async {
            let response = self
                .client
                .get(GetParts::IndexId(index.as_str(), id))
                .send()
                .await
                .map_err(|e| Self::send_error("get document", e))?;

            if response.status_code().as_u16() == 404 {
                return Ok(None);
            }

            let response =
                Self::check(response, "get document", SearchEngineError::IndexError).await?;
            let body = Self::read_json(response).await?;
            Ok(body.get("_source").cloned())
        })
        .await
    }

    async fn update_document(
        &self,
        index: IndexName,
        id: &str,
        partial: &Value,
        refresh: bool,
    ) -> Result<(), SearchEngineError> {
        self.execute("update document", async {
            let response = self
                .client
                .update(UpdateParts::IndexId(index.as_str(), id))
                .body(json!({ "doc": partial }))
                .refresh(refresh_param(refresh))
                .send()
                .await
                .map_err(|e| Self::send_error("update document", e))?;

            if response.status_code().as_u16() == 404 {
                return Err(SearchEngineError::document_not_found(index.as_str(), id));
            }

            Self::check(response, "update document", SearchEngineError::UpdateError).await?;
            debug!(index = %index, id = %id, "Document updated");
            Ok(())
        })
        .await
    }

    async fn delete_document(
        &self,
        index: IndexName,
        id: &str,
        refresh: bool,
    ) -> Result<(), SearchEngineError> {
        self.execute("delete document", async {
            let response = self
                .client
                .delete(DeleteParts::IndexId(index.as_str(), id))
                .refresh(refresh_param(refresh))
                .send()
                .await
                .map_err(|e| Self::send_error("delete document", e))?;

            // 404 is acceptable - document may not exist
            if response.status_code().as_u16() != 404 {
                Self::check(response, "delete document", SearchEngineError::DeleteError).await?;
            }

            debug!(index = %index, id = %id, "Document deleted");
            Ok(())
        })
        .await
    }

    async fn search(&self, index: IndexName, body: &Value) -> Result<Value, SearchEngineError> {
        self.execute("search", async {
            let response = self
                .client
                .search(SearchParts::Index(&[index.as_str()]))
                .body(body.clone())
                .send()
                .await
                .map_err(|e| Self::send_error("search", e))?;
            let response = Self::check(response, "search", SearchEngineError::IndexError).await?;
            Self::read_json(response).await
        })
        .await
    }

    async fn count(&self, index: IndexName) -> Result<u64, SearchEngineError> {
        self.execute("count", async {
            let response = self
                .client
                .count(CountParts::Index(&[index.as_str()]))
                .send()
                .await
                .map_err(|e| Self::send_error("count", e))?;
            let response = Self::check(response, "count", SearchEngineError::IndexError).await?;
            let body = Self::read_json(response).await?;
            body.get("count")
                .and_then(Value::as_u64)
                .ok_or_else(|| SearchEngineError::parse("count response has no count"))
        })
        .await
    }

    async fn bulk(
        &self,
        operations: Vec<BulkOperation>,
        refresh: bool,
    ) -> Result<BulkResponse, SearchEngineError> {
        if operations.is_empty() {
            return Ok(BulkResponse {
                took: 0,
                errors: false,
                items: Vec::new(),
            });
        }

        let count = operations.len();
        let body: Vec<JsonBody<Value>> = operations
            .iter()
            .flat_map(BulkOperation::to_lines)
            .map(JsonBody::new)
            .collect();

        self.execute("bulk", async {
            let response = self
                .client
                .bulk(BulkParts::None)
                .body(body)
                .refresh(refresh_param(refresh))
                .send()
                .await
                .map_err(|e| Self::send_error("bulk", e))?;
            let response = Self::check(response, "bulk", SearchEngineError::BulkIndexError).await?;
            let body = Self::read_json(response).await?;
            let parsed = BulkResponse::from_value(&body)?;

            if parsed.errors {
                warn!(
                    operations = count,
                    failed = parsed.failed_items().count(),
                    "Bulk request completed with item failures"
                );
            } else {
                debug!(operations = count, took = parsed.took, "Bulk request completed");
            }
            Ok(parsed)
        })
        .await
    }

    async fn refresh_index(&self, index: IndexName) -> Result<(), SearchEngineError> {
        self.execute("refresh index", async {
            let response = self
                .client
                .indices()
                .refresh(IndicesRefreshParts::Index(&[index.as_str()]))
                .send()
                .await
                .map_err(|e| Self::send_error("refresh index", e))?;
            Self::check(response, "refresh index", SearchEngineError::IndexError).await?;
            debug!(index = %index, "Index refreshed");
            Ok(())
        })
        .await
    }

    async fn get_mapping(&self, index: IndexName) -> Result<Value, SearchEngineError> {
        self.execute("get mapping", async {
            let response = self
                .client
                .indices()
                .get_mapping(IndicesGetMappingParts::Index(&[index.as_str()]))
                .send()
                .await
                .map_err(|e| Self::send_error("get mapping", e))?;
            let response =
                Self::check(response, "get mapping", SearchEngineError::IndexError).await?;
            let body = Self::read_json(response).await?;
            body.get(index.as_str())
                .and_then(|entry| entry.get("mappings"))
                .cloned()
                .ok_or_else(|| SearchEngineError::parse("mapping response has no mappings"))
        })
        .await
    }

    async fn put_mapping(
        &self,
        index: IndexName,
        mapping: &Value,
    ) -> Result<(), SearchEngineError> {
        self.execute("put mapping", async {
            let response = self
                .client
                .indices()
                .put_mapping(IndicesPutMappingParts::Index(&[index.as_str()]))
                .body(mapping.clone())
                .send()
                .await
                .map_err(|e| Self::send_error("put mapping", e))?;
            Self::check(response, "put mapping", SearchEngineError::UpdateError).await?;
            Ok(())
        })
        .await
    }
}
