//! Index mappings and analysis settings for every known index.
//!
//! All mappings are `dynamic: strict`. Free-text fields get a `keyword` sub-field for
//! exact match and sorting; fields that drive relevance also get `search` and
//! `english` sub-fields. The primary text field of each index carries a `suggest`
//! completion sub-field used by the suggestion service.

use clinic_search_shared::IndexName;
use serde_json::{json, Map, Value};

/// Name of the completion sub-field.
pub const SUGGEST_SUBFIELD: &str = "suggest";

fn keyword() -> Value {
    json!({ "type": "keyword" })
}

fn date() -> Value {
    json!({ "type": "date" })
}

fn integer() -> Value {
    json!({ "type": "integer" })
}

fn float() -> Value {
    json!({ "type": "float" })
}

fn boolean() -> Value {
    json!({ "type": "boolean" })
}

/// Text analysed with `search_analyzer` plus a `keyword` sub-field.
fn text_with_keyword() -> Value {
    json!({
        "type": "text",
        "analyzer": "search_analyzer",
        "fields": {
            "keyword": { "type": "keyword", "ignore_above": 256 }
        }
    })
}

/// Text used for relevance: keyword, search and english sub-fields.
fn searchable_text() -> Value {
    json!({
        "type": "text",
        "analyzer": "search_analyzer",
        "fields": {
            "keyword": { "type": "keyword", "ignore_above": 256 },
            "search": { "type": "text", "analyzer": "search_analyzer" },
            "english": { "type": "text", "analyzer": "english" }
        }
    })
}

/// Searchable text that also feeds the completion suggester.
fn suggestable_text() -> Value {
    let mut field = searchable_text();
    field["fields"][SUGGEST_SUBFIELD] = json!({
        "type": "completion",
        "analyzer": "simple",
        "preserve_separators": true,
        "preserve_position_increments": true,
        "max_input_length": 50
    });
    field
}

fn object(properties: Value) -> Value {
    json!({ "type": "object", "properties": properties })
}

fn strict(properties: Value) -> Value {
    json!({ "dynamic": "strict", "properties": properties })
}

/// Analysis settings shared by every index.
pub fn base_analysis() -> Value {
    json!({
        "analyzer": {
            "search_analyzer": {
                "type": "custom",
                "tokenizer": "standard",
                "filter": ["lowercase", "asciifolding"]
            }
        }
    })
}

/// Analysis settings for the FAQ index: the base set plus edge-ngram autocomplete.
pub fn faq_analysis() -> Value {
    let mut analysis = base_analysis();
    analysis["filter"] = json!({
        "autocomplete_filter": {
            "type": "edge_ngram",
            "min_gram": 2,
            "max_gram": 20
        }
    });

    if let Some(analyzers) = analysis["analyzer"].as_object_mut() {
        analyzers.insert(
            "autocomplete".to_string(),
            json!({
                "type": "custom",
                "tokenizer": "standard",
                "filter": ["lowercase", "asciifolding", "autocomplete_filter"]
            }),
        );
        analyzers.insert(
            "autocomplete_search".to_string(),
            json!({
                "type": "custom",
                "tokenizer": "standard",
                "filter": ["lowercase", "asciifolding"]
            }),
        );
    }
    analysis
}

/// Analysis settings for an index.
pub fn analysis_for(index: IndexName) -> Value {
    match index {
        IndexName::Faqs => faq_analysis(),
        _ => base_analysis(),
    }
}

/// The strict mapping for an index.
pub fn mapping_for(index: IndexName) -> Value {
    match index {
        IndexName::Pets => pets_mapping(),
        IndexName::Appointments => appointments_mapping(),
        IndexName::Users => users_mapping(),
        IndexName::Clinics => clinics_mapping(),
        IndexName::HealthRecords => health_records_mapping(),
        IndexName::Faqs => faqs_mapping(),
    }
}

fn pets_mapping() -> Value {
    strict(json!({
        "id": keyword(),
        "name": suggestable_text(),
        "species": text_with_keyword(),
        "breed": searchable_text(),
        "description": searchable_text(),
        "age": float(),
        "gender": keyword(),
        "color": text_with_keyword(),
        "weight": float(),
        "microchipId": keyword(),
        "status": keyword(),
        "tags": keyword(),
        "ownerId": keyword(),
        "clinicId": keyword(),
        "createdAt": date(),
        "updatedAt": date()
    }))
}

fn appointments_mapping() -> Value {
    strict(json!({
        "id": keyword(),
        "petId": keyword(),
        "petName": suggestable_text(),
        "ownerId": keyword(),
        "ownerName": text_with_keyword(),
        "clinicId": keyword(),
        "clinicName": text_with_keyword(),
        "veterinarianName": text_with_keyword(),
        "appointmentDate": date(),
        "durationMinutes": integer(),
        "appointmentType": keyword(),
        "reason": searchable_text(),
        "notes": searchable_text(),
        "status": keyword(),
        "priority": keyword(),
        "tags": keyword(),
        "createdAt": date(),
        "updatedAt": date()
    }))
}

fn users_mapping() -> Value {
    strict(json!({
        "id": keyword(),
        "firstName": text_with_keyword(),
        "lastName": text_with_keyword(),
        "fullName": suggestable_text(),
        "email": text_with_keyword(),
        "phone": keyword(),
        "role": keyword(),
        "status": keyword(),
        "clinicId": keyword(),
        "city": text_with_keyword(),
        "createdAt": date(),
        "updatedAt": date()
    }))
}

fn clinics_mapping() -> Value {
    strict(json!({
        "id": keyword(),
        "name": suggestable_text(),
        "description": searchable_text(),
        "address": object(json!({
            "street": text_with_keyword(),
            "city": text_with_keyword(),
            "state": keyword(),
            "postalCode": keyword(),
            "country": keyword()
        })),
        "location": { "type": "geo_point" },
        "phone": keyword(),
        "email": keyword(),
        "website": { "type": "keyword", "index": false },
        "services": text_with_keyword(),
        "specialties": text_with_keyword(),
        "tags": keyword(),
        "rating": float(),
        "reviewCount": integer(),
        "isEmergency": boolean(),
        "status": keyword(),
        "createdAt": date(),
        "updatedAt": date()
    }))
}

fn health_records_mapping() -> Value {
    strict(json!({
        "id": keyword(),
        "petId": keyword(),
        "petName": text_with_keyword(),
        "ownerId": keyword(),
        "clinicId": keyword(),
        "veterinarianName": text_with_keyword(),
        "recordType": keyword(),
        "title": suggestable_text(),
        "description": searchable_text(),
        "diagnosis": searchable_text(),
        "treatment": searchable_text(),
        "medications": text_with_keyword(),
        "tags": keyword(),
        "priority": keyword(),
        "status": keyword(),
        "recordDate": date(),
        "followUpDate": date(),
        "createdAt": date(),
        "updatedAt": date()
    }))
}

fn faqs_mapping() -> Value {
    let mut question = suggestable_text();
    question["fields"]["autocomplete"] = json!({
        "type": "text",
        "analyzer": "autocomplete",
        "search_analyzer": "autocomplete_search"
    });

    let mut properties = Map::new();
    properties.insert("id".to_string(), keyword());
    properties.insert("question".to_string(), question);
    properties.insert("answer".to_string(), searchable_text());
    properties.insert("category".to_string(), keyword());
    properties.insert("tags".to_string(), keyword());
    properties.insert("language".to_string(), keyword());
    properties.insert("isPublished".to_string(), boolean());
    properties.insert("viewCount".to_string(), integer());
    properties.insert("helpfulCount".to_string(), integer());
    properties.insert("createdAt".to_string(), date());
    properties.insert("updatedAt".to_string(), date());

    strict(Value::Object(properties))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mapping_is_strict_and_maps_id() {
        for index in IndexName::ALL {
            let mapping = mapping_for(index);
            assert_eq!(mapping["dynamic"], "strict", "{} is not strict", index);
            assert_eq!(mapping["properties"]["id"]["type"], "keyword");
            assert!(mapping["properties"]["createdAt"].is_object());
        }
    }

    #[test]
    fn test_text_fields_have_keyword_subfield() {
        let pets = mapping_for(IndexName::Pets);
        assert_eq!(pets["properties"]["name"]["fields"]["keyword"]["type"], "keyword");
        assert_eq!(pets["properties"]["breed"]["fields"]["english"]["analyzer"], "english");
    }

    #[test]
    fn test_each_index_has_a_completion_field() {
        let primary = [
            (IndexName::Pets, "name"),
            (IndexName::Appointments, "petName"),
            (IndexName::Users, "fullName"),
            (IndexName::Clinics, "name"),
            (IndexName::HealthRecords, "title"),
            (IndexName::Faqs, "question"),
        ];
        for (index, field) in primary {
            let mapping = mapping_for(index);
            assert_eq!(
                mapping["properties"][field]["fields"][SUGGEST_SUBFIELD]["type"],
                "completion",
                "{} {}",
                index,
                field
            );
        }
    }

    #[test]
    fn test_clinic_location_is_geo_point() {
        let clinics = mapping_for(IndexName::Clinics);
        assert_eq!(clinics["properties"]["location"]["type"], "geo_point");
        assert_eq!(clinics["properties"]["address"]["type"], "object");
    }

    #[test]
    fn test_faq_autocomplete_analysis() {
        let analysis = analysis_for(IndexName::Faqs);
        assert_eq!(analysis["filter"]["autocomplete_filter"]["type"], "edge_ngram");
        assert_eq!(analysis["filter"]["autocomplete_filter"]["min_gram"], 2);
        assert_eq!(analysis["filter"]["autocomplete_filter"]["max_gram"], 20);
        assert!(analysis["analyzer"]["autocomplete"].is_object());
        assert!(analysis["analyzer"]["autocomplete_search"].is_object());

        let faqs = mapping_for(IndexName::Faqs);
        assert_eq!(
            faqs["properties"]["question"]["fields"]["autocomplete"]["analyzer"],
            "autocomplete"
        );

        assert!(analysis_for(IndexName::Pets).get("filter").is_none());
    }
}
