//! Public search endpoints under `/elasticsearch/search`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query, State};
use axum::response::Response;
use chrono::{DateTime, Utc};
use clinic_search_shared::{
    DateRange, GlobalSearchRequest, IndexName, SearchFilters, SearchOptions, SortField,
    SortOrder,
};
use serde::Deserialize;
use serde_json::json;

use super::{json_body, parse_index, query_params};
use crate::server::response;
use crate::server::state::AppState;
use crate::ApiError;

/// Query parameters of the per-entity search routes.
///
/// List-valued filters are comma-separated; dates are RFC 3339.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub query: Option<String>,
    pub clinic_id: Option<String>,
    pub user_id: Option<String>,
    pub pet_id: Option<String>,
    pub status: Option<String>,
    pub tags: Option<String>,
    pub priority: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub size: Option<usize>,
    pub from: Option<usize>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub highlight: Option<bool>,
    pub aggregations: Option<bool>,
}

/// A parsed search request.
#[derive(Debug, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub filters: SearchFilters,
    pub options: SearchOptions,
}

fn split_list(value: Option<String>) -> Option<Vec<String>> {
    let items: Vec<String> = value?
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    (!items.is_empty()).then_some(items)
}

fn parse_date(name: &str, value: Option<String>) -> Result<Option<DateTime<Utc>>, ApiError> {
    value
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw.trim())
                .map(|date| date.with_timezone(&Utc))
                .map_err(|e| {
                    ApiError::bad_request(format!("{} must be an RFC 3339 date: {}", name, e))
                })
        })
        .transpose()
}

fn parse_sort_order(value: Option<String>) -> Result<SortOrder, ApiError> {
    match value.as_deref().map(str::to_lowercase).as_deref() {
        None => Ok(SortOrder::default()),
        Some("asc") => Ok(SortOrder::Asc),
        Some("desc") => Ok(SortOrder::Desc),
        Some(other) => Err(ApiError::bad_request(format!(
            "sortOrder must be 'asc' or 'desc', got '{}'",
            other
        ))),
    }
}

impl SearchParams {
    /// Validate and convert into filters and options. `query` is required but may be
    /// empty.
    pub fn into_request(self) -> Result<SearchRequest, ApiError> {
        let query = self
            .query
            .ok_or_else(|| ApiError::bad_request("Query parameter 'query' is required"))?;

        let start = parse_date("startDate", self.start_date)?;
        let end = parse_date("endDate", self.end_date)?;
        let date_range = (start.is_some() || end.is_some()).then_some(DateRange { start, end });

        let filters = SearchFilters {
            clinic_id: self.clinic_id,
            user_id: self.user_id,
            pet_id: self.pet_id,
            status: split_list(self.status),
            tags: split_list(self.tags),
            priority: split_list(self.priority),
            date_range,
        };

        let order = parse_sort_order(self.sort_order)?;
        let defaults = SearchOptions::default();
        let options = SearchOptions {
            size: self.size.unwrap_or(defaults.size),
            from: self.from.unwrap_or(defaults.from),
            sort: self
                .sort_field
                .filter(|field| !field.trim().is_empty())
                .map(|field| vec![SortField::new(field.trim(), order)]),
            highlight: self.highlight.unwrap_or(false),
            aggregations: self.aggregations.unwrap_or(false),
        };

        Ok(SearchRequest {
            query,
            filters,
            options,
        })
    }
}

/// Query parameters of the suggestion route.
#[derive(Debug, Default, Deserialize)]
pub struct SuggestionParams {
    pub query: Option<String>,
    pub index: Option<String>,
    pub size: Option<usize>,
}

fn search_request(
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<SearchRequest, ApiError> {
    query_params(params)?.into_request()
}

pub async fn search_pets(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let request = search_request(params)?;
    let result = state
        .search
        .search_pets(&request.query, &request.filters, &request.options)
        .await?;
    Ok(response::ok(result))
}

pub async fn search_appointments(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let request = search_request(params)?;
    let result = state
        .search
        .search_appointments(&request.query, &request.filters, &request.options)
        .await?;
    Ok(response::ok(result))
}

pub async fn search_users(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let request = search_request(params)?;
    let result = state
        .search
        .search_users(&request.query, &request.filters, &request.options)
        .await?;
    Ok(response::ok(result))
}

pub async fn search_clinics(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let request = search_request(params)?;
    let result = state
        .search
        .search_clinics(&request.query, &request.filters, &request.options)
        .await?;
    Ok(response::ok(result))
}

pub async fn search_health_records(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let request = search_request(params)?;
    let result = state
        .search
        .search_health_records(&request.query, &request.filters, &request.options)
        .await?;
    Ok(response::ok(result))
}

pub async fn search_faqs(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let request = search_request(params)?;
    let result = state
        .search
        .search_faqs(&request.query, &request.filters, &request.options)
        .await?;
    Ok(response::ok(result))
}

pub async fn global_search(
    State(state): State<AppState>,
    payload: Result<Json<GlobalSearchRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = json_body(payload)?;
    let result = state
        .search
        .global_search(&request.query, &request.filters, &request.options)
        .await?;

    if result.errors.is_empty() {
        Ok(response::ok(result))
    } else {
        let message = format!("{} entity searches failed", result.errors.len());
        Ok(response::ok_with_message(result, message))
    }
}

pub async fn suggestions(
    State(state): State<AppState>,
    params: Result<Query<SuggestionParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let params = query_params(params)?;
    let (Some(query), Some(index_name)) = (params.query, params.index) else {
        return Err(ApiError::bad_request(
            "Query parameters 'query' and 'index' are required",
        ));
    };
    let index: IndexName = parse_index(&index_name)?;

    let suggestions = state
        .suggestions
        .get_suggestions(index, &query, params.size)
        .await?;
    Ok(response::ok(json!({
        "index": index,
        "query": query,
        "suggestions": suggestions,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_required_but_may_be_empty() {
        let err = SearchParams::default().into_request().unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

        let request = SearchParams {
            query: Some(String::new()),
            ..Default::default()
        }
        .into_request()
        .unwrap();
        assert_eq!(request.query, "");
        assert_eq!(request.filters, SearchFilters::default());
        assert_eq!(request.options, SearchOptions::default());
    }

    #[test]
    fn test_lists_and_dates() {
        let request = SearchParams {
            query: Some("buddy".to_string()),
            status: Some("active, inactive,".to_string()),
            tags: Some(" ".to_string()),
            start_date: Some("2024-01-01T00:00:00Z".to_string()),
            ..Default::default()
        }
        .into_request()
        .unwrap();

        assert_eq!(
            request.filters.status,
            Some(vec!["active".to_string(), "inactive".to_string()])
        );
        assert!(request.filters.tags.is_none());
        let range = request.filters.date_range.unwrap();
        assert_eq!(range.start.map(|d| d.to_rfc3339()), Some("2024-01-01T00:00:00+00:00".to_string()));
        assert!(range.end.is_none());
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let err = SearchParams {
            query: Some("x".to_string()),
            end_date: Some("yesterday".to_string()),
            ..Default::default()
        }
        .into_request()
        .unwrap_err();
        assert!(err.to_string().contains("endDate"));
    }

    #[test]
    fn test_sort_params_build_one_clause() {
        let request = SearchParams {
            query: Some("x".to_string()),
            sort_field: Some("name.keyword".to_string()),
            sort_order: Some("DESC".to_string()),
            size: Some(20),
            from: Some(40),
            highlight: Some(true),
            ..Default::default()
        }
        .into_request()
        .unwrap();

        assert_eq!(
            request.options.sort,
            Some(vec![SortField::new("name.keyword", SortOrder::Desc)])
        );
        assert_eq!((request.options.size, request.options.from), (20, 40));
        assert!(request.options.highlight);

        let err = SearchParams {
            query: Some("x".to_string()),
            sort_field: Some("name".to_string()),
            sort_order: Some("sideways".to_string()),
            ..Default::default()
        }
        .into_request()
        .unwrap_err();
        assert!(err.to_string().contains("sortOrder"));
    }
}
