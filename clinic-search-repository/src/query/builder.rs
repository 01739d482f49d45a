//! Translation of `(query, filters, options)` into engine search bodies.

use clinic_search_shared::{FilterKind, IndexName, SearchFilters, SearchOptions};
use serde_json::json;

use super::dsl::{Bounds, Highlight, Query, SearchBody, SortClause, Suggester};
use super::entity_queries::{spec_for, EntityQuerySpec};
use crate::errors::SearchEngineError;
use crate::schema::mappings::SUGGEST_SUBFIELD;

/// How filters the index does not support are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPolicy {
    /// Reject the request with a validation error.
    Reject,
    /// Drop them silently. Used by global search.
    Restrict,
}

pub struct QueryBuilder;

impl QueryBuilder {
    /// Build the search body for one index.
    ///
    /// # Returns
    ///
    /// * `Ok(SearchBody)` - The body to send
    /// * `Err(SearchEngineError::ValidationError)` - Out-of-range options, an inverted
    ///   date range, or (under `FilterPolicy::Reject`) a filter the index does not support
    pub fn search(
        index: IndexName,
        query: &str,
        filters: &SearchFilters,
        options: &SearchOptions,
        policy: FilterPolicy,
    ) -> Result<SearchBody, SearchEngineError> {
        options.validate().map_err(SearchEngineError::validation)?;
        filters.validate().map_err(SearchEngineError::validation)?;

        let spec = spec_for(index);
        let supported = spec.supported_filters();
        let filters = match policy {
            FilterPolicy::Reject => {
                if let Some(kind) = filters
                    .populated()
                    .into_iter()
                    .find(|kind| !supported.contains(kind))
                {
                    return Err(SearchEngineError::validation(format!(
                        "filter '{}' is not supported for index '{}'",
                        kind.as_str(),
                        index
                    )));
                }
                filters.clone()
            }
            FilterPolicy::Restrict => filters.restricted_to(&supported),
        };

        let mut body = SearchBody::new(Self::bool_query(spec, query, &filters));
        body.from = options.from;
        body.size = options.size;
        body.sort = match &options.sort {
            Some(sort) => sort
                .iter()
                .map(|s| SortClause::new(s.field.clone(), s.order.as_str()))
                .collect(),
            None => spec.default_sort_clauses(),
        };
        if options.highlight {
            body.highlight = Some(Highlight {
                fields: spec.highlight_fields.to_vec(),
            });
        }
        if options.aggregations {
            body.aggregations = spec.aggregations();
        }
        Ok(body)
    }

    fn bool_query(spec: &EntityQuerySpec, query: &str, filters: &SearchFilters) -> Query {
        let mut must = Vec::new();
        let query = query.trim();
        if !query.is_empty() {
            must.push(Query::MultiMatch {
                query: query.to_string(),
                fields: spec.search_fields.iter().map(|f| f.to_string()).collect(),
            });
        }

        let mut filter = Vec::new();
        for field in spec.filters {
            if !filters.is_populated(field.kind) {
                continue;
            }
            let clause = match field.kind {
                FilterKind::ClinicId => filters.clinic_id.clone().map(|v| Query::term(field.field, v)),
                FilterKind::UserId => filters.user_id.clone().map(|v| Query::term(field.field, v)),
                FilterKind::PetId => filters.pet_id.clone().map(|v| Query::term(field.field, v)),
                FilterKind::Status => filters.status.clone().map(|v| Query::terms(field.field, v)),
                FilterKind::Tags => filters.tags.clone().map(|v| Query::terms(field.field, v)),
                FilterKind::Priority => {
                    filters.priority.clone().map(|v| Query::terms(field.field, v))
                }
                FilterKind::DateRange => None,
            };
            filter.extend(clause);
        }

        if let (Some(date_field), Some(range)) = (spec.date_field, &filters.date_range) {
            if !range.is_open() {
                filter.push(Query::Range {
                    field: date_field.to_string(),
                    bounds: Bounds {
                        gte: range.start.map(|d| json!(d.to_rfc3339())),
                        lte: range.end.map(|d| json!(d.to_rfc3339())),
                    },
                });
            }
        }

        if must.is_empty() && filter.is_empty() {
            Query::MatchAll
        } else {
            Query::Bool { must, filter }
        }
    }

    /// Build a size-0 body carrying a completion and a phrase suggester.
    pub fn suggestions(index: IndexName, prefix: &str, size: usize) -> SearchBody {
        let field = spec_for(index).suggest_field;
        let mut body = SearchBody::new(Query::MatchAll);
        body.size = 0;
        body.suggest = vec![
            (
                "completion",
                Suggester::Completion {
                    prefix: prefix.to_string(),
                    field: format!("{}.{}", field, SUGGEST_SUBFIELD),
                    size,
                },
            ),
            (
                "phrase",
                Suggester::Phrase {
                    text: prefix.to_string(),
                    field: field.to_string(),
                    size,
                },
            ),
        ];
        body
    }
}
