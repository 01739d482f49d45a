//! Index and sync management endpoints under `/elasticsearch/management`.

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use clinic_search_repository::SearchEngineError;
use clinic_search_shared::{IndexName, SyncOptions};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{json_body, optional_json_body, parse_clinic_index, parse_index, query_params};
use crate::server::response;
use crate::server::state::AppState;
use crate::ApiError;

/// Header carrying the operator secret for destructive routes.
pub const OPERATOR_TOKEN_HEADER: &str = "x-operator-token";

/// Query parameters of the single-document mirror routes.
#[derive(Debug, Default, Deserialize)]
pub struct MirrorParams {
    #[serde(default)]
    pub refresh: bool,
}

impl MirrorParams {
    fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            refresh: self.refresh,
            ..Default::default()
        }
    }
}

/// Body of `POST /sync/bulk/:indexName`.
#[derive(Debug, Deserialize)]
pub struct BulkSyncRequest {
    pub documents: Vec<Value>,
    #[serde(default)]
    pub options: SyncOptions,
}

fn require_operator(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.operator_token.as_deref() else {
        return Err(ApiError::forbidden(
            "Destructive operations are disabled: no operator token configured",
        ));
    };

    match headers
        .get(OPERATOR_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        Some(token) if tokens_match(token, expected) => Ok(()),
        _ => Err(ApiError::forbidden("Missing or invalid operator token")),
    }
}

/// Byte comparison that does not stop at the first difference.
fn tokens_match(given: &str, expected: &str) -> bool {
    let (given, expected) = (given.as_bytes(), expected.as_bytes());
    given.len() == expected.len()
        && given
            .iter()
            .zip(expected)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

/// Single-document mirror calls report only a bool, so disabled is checked up front.
fn require_enabled(state: &AppState) -> Result<(), ApiError> {
    if state.engine.is_enabled() {
        Ok(())
    } else {
        Err(SearchEngineError::ServiceDisabled.into())
    }
}

// ============================================================================
// Indices
// ============================================================================

pub async fn create_indices(State(state): State<AppState>) -> Result<Response, ApiError> {
    let report = state.indices.create_clinic_indices().await?;
    let message = format!(
        "{} indices created, {} already existed",
        report.created.len(),
        report.existing.len()
    );
    Ok(response::ok_with_message(report, message))
}

pub async fn create_faq_index(State(state): State<AppState>) -> Result<Response, ApiError> {
    let created = state.indices.create_faq_index().await?;
    let message = if created {
        "FAQ index created"
    } else {
        "FAQ index already exists"
    };
    Ok(response::ok_with_message(
        json!({ "index": IndexName::Faqs, "created": created }),
        message,
    ))
}

pub async fn list_indices(State(state): State<AppState>) -> Result<Response, ApiError> {
    let indices = state.indices.get_clinic_indices().await?;
    Ok(response::ok(indices))
}

pub async fn delete_index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(index_name): Path<String>,
) -> Result<Response, ApiError> {
    require_operator(&state, &headers)?;
    let index = parse_index(&index_name)?;

    warn!(index = %index, "Operator requested index deletion");
    state.indices.delete_index(index).await?;
    Ok(response::ok_with_message(
        json!({ "deleted": [index] }),
        format!("Index {} deleted", index),
    ))
}

pub async fn delete_all_indices(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    require_operator(&state, &headers)?;

    warn!("Operator requested deletion of all clinic indices");
    let deleted = state.indices.delete_clinic_indices().await?;
    let message = format!("{} indices deleted", deleted.len());
    Ok(response::ok_with_message(json!({ "deleted": deleted }), message))
}

// ============================================================================
// Sync
// ============================================================================

pub async fn sync_all(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let options: SyncOptions = optional_json_body(&body)?;
    info!(
        force = options.force,
        batch_size = options.batch_size,
        "Full clinic resync requested"
    );

    let result = state.sync.sync_all_clinic_data(&options).await?;
    Ok(response::sync_outcome(result))
}

pub async fn sync_index(
    State(state): State<AppState>,
    Path(index_name): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let index = parse_clinic_index(&index_name)?;
    let options: SyncOptions = optional_json_body(&body)?;
    info!(
        index = %index,
        force = options.force,
        batch_size = options.batch_size,
        "Index resync requested"
    );

    let result = state.sync.sync_index(index, &options).await?;
    Ok(response::sync_outcome(result))
}

pub async fn bulk_sync(
    State(state): State<AppState>,
    Path(index_name): Path<String>,
    payload: Result<Json<BulkSyncRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let index = parse_index(&index_name)?;
    let request = json_body(payload)?;

    let result = state
        .sync
        .bulk_sync_documents(index, request.documents, &request.options)
        .await?;
    Ok(response::sync_outcome(result))
}

pub async fn sync_status(
    State(state): State<AppState>,
    Path(index_name): Path<String>,
) -> Result<Response, ApiError> {
    let index = parse_index(&index_name)?;
    let status = state.sync.get_index_sync_status(index).await;
    Ok(response::ok(status))
}

// ============================================================================
// Single documents
// ============================================================================

pub async fn sync_document(
    State(state): State<AppState>,
    Path((index_name, document_id)): Path<(String, String)>,
    params: Result<Query<MirrorParams>, QueryRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let index = parse_index(&index_name)?;
    let params = query_params(params)?;
    let document = json_body(payload)?;
    if !document.is_object() {
        return Err(ApiError::bad_request("Document must be a JSON object"));
    }
    require_enabled(&state)?;

    if state
        .sync
        .sync_document(index, document, Some(&document_id), &params.sync_options())
        .await
    {
        Ok(response::ok_with_message(
            json!({ "index": index, "id": document_id }),
            "Document synced",
        ))
    } else {
        Err(SearchEngineError::index(format!(
            "Failed to sync document {} in index {}",
            document_id, index
        ))
        .into())
    }
}

pub async fn update_document(
    State(state): State<AppState>,
    Path((index_name, document_id)): Path<(String, String)>,
    params: Result<Query<MirrorParams>, QueryRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let index = parse_index(&index_name)?;
    let params = query_params(params)?;
    let partial = json_body(payload)?;
    if !partial.is_object() {
        return Err(ApiError::bad_request("Partial document must be a JSON object"));
    }
    require_enabled(&state)?;

    if state
        .sync
        .update_document(index, &document_id, &partial, &params.sync_options())
        .await
    {
        Ok(response::ok_with_message(
            json!({ "index": index, "id": document_id }),
            "Document updated",
        ))
    } else {
        Err(SearchEngineError::update(format!(
            "Failed to update document {} in index {}",
            document_id, index
        ))
        .into())
    }
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path((index_name, document_id)): Path<(String, String)>,
    params: Result<Query<MirrorParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let index = parse_index(&index_name)?;
    let params = query_params(params)?;
    require_enabled(&state)?;

    if state
        .sync
        .delete_document(index, &document_id, &params.sync_options())
        .await
    {
        Ok(response::ok_with_message(
            json!({ "index": index, "id": document_id }),
            "Document deleted",
        ))
    } else {
        Err(SearchEngineError::delete(format!(
            "Failed to delete document {} in index {}",
            document_id, index
        ))
        .into())
    }
}
