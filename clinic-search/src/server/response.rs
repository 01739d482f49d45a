//! The JSON envelope every endpoint answers with:
//! `{status, data?, message?, error?, timestamp}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use clinic_search_shared::SyncResult;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Error,
    PartialSuccess,
}

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

fn respond<T: Serialize>(
    code: StatusCode,
    status: ResponseStatus,
    data: Option<T>,
    message: Option<String>,
    error: Option<String>,
) -> Response {
    let envelope = Envelope {
        status,
        data,
        message,
        error,
        timestamp: Utc::now(),
    };
    (code, Json(envelope)).into_response()
}

/// 200 with `data`.
pub fn ok<T: Serialize>(data: T) -> Response {
    respond(StatusCode::OK, ResponseStatus::Success, Some(data), None, None)
}

/// 200 with `data` and a human-readable message.
pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    respond(
        StatusCode::OK,
        ResponseStatus::Success,
        Some(data),
        Some(message.into()),
        None,
    )
}

/// An error envelope without data.
pub fn error(code: StatusCode, message: impl Into<String>, kind: &str) -> Response {
    respond::<()>(
        code,
        ResponseStatus::Error,
        None,
        Some(message.into()),
        Some(kind.to_string()),
    )
}

/// An error envelope that still carries diagnostic data.
pub fn error_with_data<T: Serialize>(
    code: StatusCode,
    data: T,
    message: impl Into<String>,
    kind: &str,
) -> Response {
    respond(
        code,
        ResponseStatus::Error,
        Some(data),
        Some(message.into()),
        Some(kind.to_string()),
    )
}

/// Map a sync run to 200 (all synced), 206 (some synced) or 500 (nothing synced).
pub fn sync_outcome(result: SyncResult) -> Response {
    if result.success {
        let message = format!("Synced {} documents", result.total_synced);
        return ok_with_message(result, message);
    }

    if result.is_partial() {
        let message = format!(
            "Synced {} of {} documents with {} errors",
            result.total_synced,
            result.total_processed,
            result.errors.len()
        );
        return respond(
            StatusCode::PARTIAL_CONTENT,
            ResponseStatus::PartialSuccess,
            Some(result),
            Some(message),
            None,
        );
    }

    let message = result
        .errors
        .first()
        .cloned()
        .unwrap_or_else(|| "Sync failed".to_string());
    error_with_data(StatusCode::INTERNAL_SERVER_ERROR, result, message, "sync_failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(processed: usize, synced: usize, errors: &[&str]) -> SyncResult {
        let mut result = SyncResult::new();
        result.total_processed = processed;
        result.total_synced = synced;
        for e in errors {
            result.push_error(*e);
        }
        result
    }

    #[test]
    fn test_sync_outcome_status_codes() {
        assert_eq!(sync_outcome(result(10, 10, &[])).status(), StatusCode::OK);
        assert_eq!(
            sync_outcome(result(250, 150, &["batch 2 failed"])).status(),
            StatusCode::PARTIAL_CONTENT
        );
        assert_eq!(
            sync_outcome(result(100, 0, &["batch 1 failed"])).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_envelope_omits_empty_fields() {
        let envelope = Envelope::<()> {
            status: ResponseStatus::PartialSuccess,
            data: None,
            message: None,
            error: None,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["status"], "partial_success");
        assert!(json.get("data").is_none());
        assert!(json.get("error").is_none());
        assert!(json["timestamp"].is_string());
    }
}
