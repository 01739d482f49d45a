//! Per-index query capabilities: which fields are searched, filtered, sorted,
//! highlighted, aggregated and suggested from.

use clinic_search_shared::{FilterKind, IndexName};

use super::dsl::{Aggregation, RangeBucket, SortClause};

/// A filter kind and the document field it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterField {
    pub kind: FilterKind,
    pub field: &'static str,
}

const fn filter(kind: FilterKind, field: &'static str) -> FilterField {
    FilterField { kind, field }
}

/// Query capabilities of one index.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityQuerySpec {
    pub index: IndexName,
    /// Multi-match fields, with optional `^boost`.
    pub search_fields: &'static [&'static str],
    pub highlight_fields: &'static [&'static str],
    /// `(field, order)` pairs applied when the caller supplies no sort.
    pub default_sort: &'static [(&'static str, &'static str)],
    /// Term filters. `dateRange` is handled through `date_field`.
    pub filters: &'static [FilterField],
    pub date_field: Option<&'static str>,
    /// Main analysed field; its `suggest` sub-field feeds completion.
    pub suggest_field: &'static str,
}

impl EntityQuerySpec {
    /// The filter kinds this index accepts.
    pub fn supported_filters(&self) -> Vec<FilterKind> {
        let mut kinds: Vec<FilterKind> = self.filters.iter().map(|f| f.kind).collect();
        if self.date_field.is_some() {
            kinds.push(FilterKind::DateRange);
        }
        kinds
    }

    pub fn default_sort_clauses(&self) -> Vec<SortClause> {
        self.default_sort
            .iter()
            .map(|(field, order)| SortClause::new(*field, *order))
            .collect()
    }

    /// The fixed aggregations requested when the caller asks for them.
    pub fn aggregations(&self) -> Vec<(&'static str, Aggregation)> {
        let terms = |field| Aggregation::Terms { field, size: 20 };
        let bucket = |key, from, to| RangeBucket { key, from, to };
        match self.index {
            IndexName::Pets => vec![
                ("species", terms("species.keyword")),
                ("status", terms("status")),
                ("tags", terms("tags")),
                (
                    "age",
                    Aggregation::Range {
                        field: "age",
                        ranges: vec![
                            bucket("0-1", None, Some(1.0)),
                            bucket("1-5", Some(1.0), Some(5.0)),
                            bucket("5-10", Some(5.0), Some(10.0)),
                            bucket("10+", Some(10.0), None),
                        ],
                    },
                ),
            ],
            IndexName::Appointments => vec![
                ("status", terms("status")),
                ("priority", terms("priority")),
                ("appointmentType", terms("appointmentType")),
                (
                    "appointmentsOverTime",
                    Aggregation::DateHistogram {
                        field: "appointmentDate",
                        interval: "month",
                    },
                ),
            ],
            IndexName::Users => vec![("role", terms("role")), ("status", terms("status"))],
            IndexName::Clinics => vec![
                ("services", terms("services.keyword")),
                ("specialties", terms("specialties.keyword")),
                ("isEmergency", terms("isEmergency")),
                (
                    "rating",
                    Aggregation::Range {
                        field: "rating",
                        ranges: vec![
                            bucket("0-3", None, Some(3.0)),
                            bucket("3-4", Some(3.0), Some(4.0)),
                            bucket("4-5", Some(4.0), None),
                        ],
                    },
                ),
            ],
            IndexName::HealthRecords => vec![
                ("recordType", terms("recordType")),
                ("priority", terms("priority")),
                (
                    "recordsOverTime",
                    Aggregation::DateHistogram {
                        field: "recordDate",
                        interval: "month",
                    },
                ),
            ],
            IndexName::Faqs => vec![("category", terms("category")), ("tags", terms("tags"))],
        }
    }
}

static PETS: EntityQuerySpec = EntityQuerySpec {
    index: IndexName::Pets,
    search_fields: &["name^3", "breed^2", "description", "species"],
    highlight_fields: &["name", "breed", "description"],
    default_sort: &[("createdAt", "desc")],
    filters: &[
        filter(FilterKind::ClinicId, "clinicId"),
        filter(FilterKind::UserId, "ownerId"),
        filter(FilterKind::Status, "status"),
        filter(FilterKind::Tags, "tags"),
    ],
    date_field: Some("createdAt"),
    suggest_field: "name",
};

static APPOINTMENTS: EntityQuerySpec = EntityQuerySpec {
    index: IndexName::Appointments,
    search_fields: &[
        "petName^2",
        "reason^2",
        "notes",
        "ownerName",
        "clinicName",
        "veterinarianName",
    ],
    highlight_fields: &["petName", "reason", "notes"],
    default_sort: &[("appointmentDate", "asc")],
    filters: &[
        filter(FilterKind::ClinicId, "clinicId"),
        filter(FilterKind::UserId, "ownerId"),
        filter(FilterKind::PetId, "petId"),
        filter(FilterKind::Status, "status"),
        filter(FilterKind::Tags, "tags"),
        filter(FilterKind::Priority, "priority"),
    ],
    date_field: Some("appointmentDate"),
    suggest_field: "petName",
};

static USERS: EntityQuerySpec = EntityQuerySpec {
    index: IndexName::Users,
    search_fields: &["fullName^3", "firstName^2", "lastName^2", "email", "city"],
    highlight_fields: &["fullName", "email"],
    default_sort: &[("createdAt", "desc")],
    filters: &[
        filter(FilterKind::ClinicId, "clinicId"),
        filter(FilterKind::Status, "status"),
    ],
    date_field: Some("createdAt"),
    suggest_field: "fullName",
};

static CLINICS: EntityQuerySpec = EntityQuerySpec {
    index: IndexName::Clinics,
    search_fields: &[
        "name^3",
        "description",
        "services^2",
        "specialties^2",
        "address.city",
    ],
    highlight_fields: &["name", "description", "services"],
    default_sort: &[("rating", "desc"), ("name.keyword", "asc")],
    filters: &[
        filter(FilterKind::ClinicId, "id"),
        filter(FilterKind::Status, "status"),
        filter(FilterKind::Tags, "tags"),
    ],
    date_field: None,
    suggest_field: "name",
};

static HEALTH_RECORDS: EntityQuerySpec = EntityQuerySpec {
    index: IndexName::HealthRecords,
    search_fields: &[
        "title^3",
        "diagnosis^2",
        "treatment^2",
        "description",
        "medications",
        "petName",
    ],
    highlight_fields: &["title", "diagnosis", "treatment", "description"],
    default_sort: &[("recordDate", "desc")],
    filters: &[
        filter(FilterKind::ClinicId, "clinicId"),
        filter(FilterKind::UserId, "ownerId"),
        filter(FilterKind::PetId, "petId"),
        filter(FilterKind::Status, "status"),
        filter(FilterKind::Tags, "tags"),
        filter(FilterKind::Priority, "priority"),
    ],
    date_field: Some("recordDate"),
    suggest_field: "title",
};

static FAQS: EntityQuerySpec = EntityQuerySpec {
    index: IndexName::Faqs,
    search_fields: &["question^3", "question.autocomplete^2", "answer"],
    highlight_fields: &["question", "answer"],
    default_sort: &[("_score", "desc"), ("helpfulCount", "desc")],
    filters: &[filter(FilterKind::Tags, "tags")],
    date_field: None,
    suggest_field: "question",
};

/// Query capabilities for `index`.
pub fn spec_for(index: IndexName) -> &'static EntityQuerySpec {
    match index {
        IndexName::Pets => &PETS,
        IndexName::Appointments => &APPOINTMENTS,
        IndexName::Users => &USERS,
        IndexName::Clinics => &CLINICS,
        IndexName::HealthRecords => &HEALTH_RECORDS,
        IndexName::Faqs => &FAQS,
    }
}
