// HTTP request handlers
pub mod health;
pub mod management;
pub mod search;

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use clinic_search_shared::IndexName;
use serde::de::DeserializeOwned;

use crate::ApiError;

/// Unwrap query parameters, answering malformed ones with the error envelope.
fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(params)| params)
        .map_err(|e| ApiError::bad_request(format!("Invalid query parameters: {}", e.body_text())))
}

/// Unwrap a required JSON body, answering malformed ones with the error envelope.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(body)| body)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e.body_text())))
}

/// Parse a JSON body that may be absent, falling back to the type's default.
fn optional_json_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))
}

/// Any known index, including FAQs.
fn parse_index(name: &str) -> Result<IndexName, ApiError> {
    name.parse::<IndexName>()
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

/// One of the five clinic indices.
fn parse_clinic_index(name: &str) -> Result<IndexName, ApiError> {
    match name.parse::<IndexName>() {
        Ok(index) if index.is_clinic_index() => Ok(index),
        _ => {
            let allowed: Vec<&str> = IndexName::CLINIC_INDICES
                .iter()
                .map(IndexName::as_str)
                .collect();
            Err(ApiError::bad_request(format!(
                "Invalid index name '{}'. Must be one of: {}",
                name,
                allowed.join(", ")
            )))
        }
    }
}
