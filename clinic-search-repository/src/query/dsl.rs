//! Typed subset of the engine query DSL.
//!
//! Only the clause kinds the query builder emits are modelled. Each type renders
//! itself to engine JSON with `to_value`.

use serde_json::{json, Map, Value};

/// Lower and upper bounds of a range clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bounds {
    pub gte: Option<Value>,
    pub lte: Option<Value>,
}

/// A query clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Scored `must` clauses plus unscored `filter` clauses.
    Bool { must: Vec<Query>, filter: Vec<Query> },
    /// `best_fields` multi-match with `fuzziness: AUTO`. Fields may carry `^boost`.
    MultiMatch { query: String, fields: Vec<String> },
    Term { field: String, value: Value },
    Terms { field: String, values: Vec<String> },
    Range { field: String, bounds: Bounds },
    MatchAll,
}

impl Query {
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn terms(field: impl Into<String>, values: Vec<String>) -> Self {
        Query::Terms {
            field: field.into(),
            values,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Query::Bool { must, filter } => {
                let mut clause = Map::new();
                if !must.is_empty() {
                    clause.insert(
                        "must".to_string(),
                        Value::Array(must.iter().map(Query::to_value).collect()),
                    );
                }
                if !filter.is_empty() {
                    clause.insert(
                        "filter".to_string(),
                        Value::Array(filter.iter().map(Query::to_value).collect()),
                    );
                }
                json!({ "bool": clause })
            }
            Query::MultiMatch { query, fields } => json!({
                "multi_match": {
                    "query": query,
                    "fields": fields,
                    "type": "best_fields",
                    "fuzziness": "AUTO"
                }
            }),
            Query::Term { field, value } => json!({ "term": { field.as_str(): value } }),
            Query::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
            Query::Range { field, bounds } => {
                let mut range = Map::new();
                if let Some(gte) = &bounds.gte {
                    range.insert("gte".to_string(), gte.clone());
                }
                if let Some(lte) = &bounds.lte {
                    range.insert("lte".to_string(), lte.clone());
                }
                json!({ "range": { field.as_str(): range } })
            }
            Query::MatchAll => json!({ "match_all": {} }),
        }
    }
}

/// One bucket of a range aggregation. Either end may be open.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeBucket {
    pub key: &'static str,
    pub from: Option<f64>,
    pub to: Option<f64>,
}

/// A named aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    Terms { field: &'static str, size: usize },
    Range { field: &'static str, ranges: Vec<RangeBucket> },
    DateHistogram { field: &'static str, interval: &'static str },
}

impl Aggregation {
    pub fn to_value(&self) -> Value {
        match self {
            Aggregation::Terms { field, size } => {
                json!({ "terms": { "field": field, "size": size } })
            }
            Aggregation::Range { field, ranges } => {
                let ranges: Vec<Value> = ranges
                    .iter()
                    .map(|bucket| {
                        let mut range = Map::new();
                        range.insert("key".to_string(), json!(bucket.key));
                        if let Some(from) = bucket.from {
                            range.insert("from".to_string(), json!(from));
                        }
                        if let Some(to) = bucket.to {
                            range.insert("to".to_string(), json!(to));
                        }
                        Value::Object(range)
                    })
                    .collect();
                json!({ "range": { "field": field, "ranges": ranges } })
            }
            Aggregation::DateHistogram { field, interval } => json!({
                "date_histogram": { "field": field, "calendar_interval": interval }
            }),
        }
    }
}

/// Highlight request over a fixed set of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub fields: Vec<&'static str>,
}

impl Highlight {
    pub const PRE_TAG: &'static str = "<mark>";
    pub const POST_TAG: &'static str = "</mark>";

    pub fn to_value(&self) -> Value {
        let fields: Map<String, Value> = self
            .fields
            .iter()
            .map(|field| (field.to_string(), json!({})))
            .collect();
        json!({
            "pre_tags": [Self::PRE_TAG],
            "post_tags": [Self::POST_TAG],
            "fields": fields
        })
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct SortClause {
    pub field: String,
    pub order: &'static str,
}

impl SortClause {
    pub fn new(field: impl Into<String>, order: &'static str) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    pub fn to_value(&self) -> Value {
        json!({ self.field.as_str(): { "order": self.order } })
    }
}

/// A named suggester.
#[derive(Debug, Clone, PartialEq)]
pub enum Suggester {
    /// Prefix completion on a completion sub-field.
    Completion { prefix: String, field: String, size: usize },
    /// Edit-distance correction on an analysed field.
    Phrase { text: String, field: String, size: usize },
}

impl Suggester {
    pub fn to_value(&self) -> Value {
        match self {
            Suggester::Completion {
                prefix,
                field,
                size,
            } => json!({
                "prefix": prefix,
                "completion": {
                    "field": field,
                    "size": size,
                    "skip_duplicates": true
                }
            }),
            Suggester::Phrase { text, field, size } => json!({
                "text": text,
                "phrase": {
                    "field": field,
                    "size": size,
                    "gram_size": 1,
                    "direct_generator": [{ "field": field, "suggest_mode": "always" }]
                }
            }),
        }
    }
}

/// A complete search request body.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchBody {
    pub query: Query,
    pub from: usize,
    pub size: usize,
    pub sort: Vec<SortClause>,
    pub highlight: Option<Highlight>,
    pub aggregations: Vec<(&'static str, Aggregation)>,
    pub suggest: Vec<(&'static str, Suggester)>,
}

impl SearchBody {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            from: 0,
            size: 10,
            sort: Vec::new(),
            highlight: None,
            aggregations: Vec::new(),
            suggest: Vec::new(),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut body = json!({
            "query": self.query.to_value(),
            "from": self.from,
            "size": self.size,
            "track_total_hits": true
        });

        if !self.sort.is_empty() {
            body["sort"] = Value::Array(self.sort.iter().map(SortClause::to_value).collect());
        }
        if let Some(highlight) = &self.highlight {
            body["highlight"] = highlight.to_value();
        }
        if !self.aggregations.is_empty() {
            let aggs: Map<String, Value> = self
                .aggregations
                .iter()
                .map(|(name, agg)| (name.to_string(), agg.to_value()))
                .collect();
            body["aggs"] = Value::Object(aggs);
        }
        if !self.suggest.is_empty() {
            let suggest: Map<String, Value> = self
                .suggest
                .iter()
                .map(|(name, suggester)| (name.to_string(), suggester.to_value()))
                .collect();
            body["suggest"] = Value::Object(suggest);
        }
        body
    }
}
