//! Search request types: structured filters, pagination/sort options and the
//! global-search request body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest page size a caller may request.
pub const MAX_SEARCH_SIZE: usize = 100;

/// Deepest result the engine will page to (`from + size`).
pub const MAX_RESULT_WINDOW: usize = 10_000;

/// The structured filters a caller can populate.
///
/// Not every filter is meaningful for every index; the query builder checks which
/// ones an index supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    ClinicId,
    UserId,
    PetId,
    Status,
    Tags,
    Priority,
    DateRange,
}

impl FilterKind {
    /// The filter name as it appears in requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::ClinicId => "clinicId",
            FilterKind::UserId => "userId",
            FilterKind::PetId => "petId",
            FilterKind::Status => "status",
            FilterKind::Tags => "tags",
            FilterKind::Priority => "priority",
            FilterKind::DateRange => "dateRange",
        }
    }
}

/// An inclusive date window. Either bound may be open.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// True when neither bound is set.
    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Structured filters applied as unscored `filter` clauses.
///
/// A filter only produces a clause when it is populated: `None` and empty lists
/// are treated the same way.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinic_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

fn non_empty_str(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn non_empty_list(value: &Option<Vec<String>>) -> bool {
    value.as_ref().is_some_and(|v| !v.is_empty())
}

impl SearchFilters {
    /// Returns true if the given filter carries a value.
    pub fn is_populated(&self, kind: FilterKind) -> bool {
        match kind {
            FilterKind::ClinicId => non_empty_str(&self.clinic_id),
            FilterKind::UserId => non_empty_str(&self.user_id),
            FilterKind::PetId => non_empty_str(&self.pet_id),
            FilterKind::Status => non_empty_list(&self.status),
            FilterKind::Tags => non_empty_list(&self.tags),
            FilterKind::Priority => non_empty_list(&self.priority),
            FilterKind::DateRange => self.date_range.as_ref().is_some_and(|r| !r.is_open()),
        }
    }

    /// Every populated filter, in declaration order.
    pub fn populated(&self) -> Vec<FilterKind> {
        [
            FilterKind::ClinicId,
            FilterKind::UserId,
            FilterKind::PetId,
            FilterKind::Status,
            FilterKind::Tags,
            FilterKind::Priority,
            FilterKind::DateRange,
        ]
        .into_iter()
        .filter(|kind| self.is_populated(*kind))
        .collect()
    }

    /// Copy of these filters keeping only the kinds in `supported`.
    pub fn restricted_to(&self, supported: &[FilterKind]) -> SearchFilters {
        let keep = |kind: FilterKind| supported.contains(&kind);
        SearchFilters {
            clinic_id: self.clinic_id.clone().filter(|_| keep(FilterKind::ClinicId)),
            user_id: self.user_id.clone().filter(|_| keep(FilterKind::UserId)),
            pet_id: self.pet_id.clone().filter(|_| keep(FilterKind::PetId)),
            status: self.status.clone().filter(|_| keep(FilterKind::Status)),
            tags: self.tags.clone().filter(|_| keep(FilterKind::Tags)),
            priority: self.priority.clone().filter(|_| keep(FilterKind::Priority)),
            date_range: self.date_range.clone().filter(|_| keep(FilterKind::DateRange)),
        }
    }

    /// Validate the filter values themselves (not their applicability to an index).
    pub fn validate(&self) -> Result<(), String> {
        if let Some(range) = &self.date_range {
            if let (Some(start), Some(end)) = (range.start, range.end) {
                if start > end {
                    return Err("dateRange start must not be after end".to_string());
                }
            }
        }
        Ok(())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// One caller-supplied sort key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SortField {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortField {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

fn default_size() -> usize {
    10
}

/// Pagination, sort and result decoration options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    /// Page size. Default is 10, maximum is 100.
    #[serde(default = "default_size")]
    pub size: usize,

    /// Offset of the first hit. Default is 0.
    #[serde(default)]
    pub from: usize,

    /// Replaces the index's default sort entirely when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<SortField>>,

    #[serde(default)]
    pub highlight: bool,

    #[serde(default)]
    pub aggregations: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            size: default_size(),
            from: 0,
            sort: None,
            highlight: false,
            aggregations: false,
        }
    }
}

impl SearchOptions {
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn with_from(mut self, from: usize) -> Self {
        self.from = from;
        self
    }

    pub fn with_sort(mut self, sort: Vec<SortField>) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_highlight(mut self) -> Self {
        self.highlight = true;
        self
    }

    pub fn with_aggregations(mut self) -> Self {
        self.aggregations = true;
        self
    }

    /// Validate pagination bounds.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.size > MAX_SEARCH_SIZE {
            return Err(format!("size must be at most {}", MAX_SEARCH_SIZE));
        }

        if self
            .from
            .checked_add(self.size)
            .map_or(true, |end| end > MAX_RESULT_WINDOW)
        {
            return Err(format!(
                "from + size must be at most {}",
                MAX_RESULT_WINDOW
            ));
        }

        if let Some(sort) = &self.sort {
            if sort.iter().any(|s| s.field.trim().is_empty()) {
                return Err("sort field cannot be empty".to_string());
            }
        }

        Ok(())
    }
}

/// Body of a global (all-entity) search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalSearchRequest {
    pub query: String,
    #[serde(default)]
    pub filters: SearchFilters,
    #[serde(default)]
    pub options: SearchOptions,
}
