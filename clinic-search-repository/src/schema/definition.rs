//! Index definitions: settings plus strict mapping for one known index.

use clinic_search_shared::{
    AppointmentDocument, ClinicDocument, FaqDocument, HealthRecordDocument, IndexName,
    IndexableDocument, PetDocument, UserDocument,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::errors::SearchEngineError;
use crate::schema::mappings;

/// Shard, replica, refresh and analysis settings for one index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSettings {
    pub shards: u32,
    pub replicas: u32,
    pub refresh_interval: String,
    pub analysis: Value,
}

/// Everything needed to create one index. Immutable once the index exists; schema
/// changes go through delete and recreate.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub index: IndexName,
    pub settings: IndexSettings,
    pub mappings: Value,
}

impl IndexDefinition {
    /// Build the definition for a known index.
    pub fn for_index(index: IndexName, shards: u32, replicas: u32) -> Self {
        Self {
            index,
            settings: IndexSettings {
                shards,
                replicas,
                refresh_interval: "1s".to_string(),
                analysis: mappings::analysis_for(index),
            },
            mappings: mappings::mapping_for(index),
        }
    }

    pub fn name(&self) -> &'static str {
        self.index.as_str()
    }

    /// Body of the create-index request.
    pub fn create_body(&self) -> Value {
        json!({
            "settings": {
                "number_of_shards": self.settings.shards,
                "number_of_replicas": self.settings.replicas,
                "refresh_interval": self.settings.refresh_interval,
                "analysis": self.settings.analysis
            },
            "mappings": self.mappings
        })
    }

    /// Reject a document carrying any field the mapping does not declare.
    ///
    /// Nested objects are checked against their own `properties`, arrays element by
    /// element. The error names the first offending field by its dotted path.
    pub fn validate_document(&self, document: &Value) -> Result<(), SearchEngineError> {
        let fields = document.as_object().ok_or_else(|| {
            SearchEngineError::schema_violation(self.name(), "document must be a JSON object")
        })?;

        let properties = self.mappings.get("properties").and_then(Value::as_object);
        match properties {
            Some(properties) => self.check_object(fields, properties, ""),
            None => Ok(()),
        }
    }

    /// Check that a full document is both mapped and a complete projection of its
    /// index, and return its `id`.
    ///
    /// Searches decode every hit into the typed projection, so a document missing a
    /// required field must never reach the engine.
    pub fn validate_projection(&self, document: &Value) -> Result<String, SearchEngineError> {
        self.validate_document(document)?;
        match self.index {
            IndexName::Pets => decode_projection::<PetDocument>(document),
            IndexName::Appointments => decode_projection::<AppointmentDocument>(document),
            IndexName::Users => decode_projection::<UserDocument>(document),
            IndexName::Clinics => decode_projection::<ClinicDocument>(document),
            IndexName::HealthRecords => decode_projection::<HealthRecordDocument>(document),
            IndexName::Faqs => decode_projection::<FaqDocument>(document),
        }
    }

    fn check_object(
        &self,
        fields: &Map<String, Value>,
        properties: &Map<String, Value>,
        prefix: &str,
    ) -> Result<(), SearchEngineError> {
        for (key, value) in fields {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };

            let mapping = properties.get(key).ok_or_else(|| {
                SearchEngineError::schema_violation(
                    self.name(),
                    format!("field '{}' is not declared in the mapping", path),
                )
            })?;

            if let Some(nested) = mapping.get("properties").and_then(Value::as_object) {
                self.check_nested(value, nested, &path)?;
            }
        }
        Ok(())
    }

    fn check_nested(
        &self,
        value: &Value,
        properties: &Map<String, Value>,
        path: &str,
    ) -> Result<(), SearchEngineError> {
        match value {
            Value::Object(fields) => self.check_object(fields, properties, path),
            Value::Array(items) => items
                .iter()
                .try_for_each(|item| self.check_nested(item, properties, path)),
            Value::Null => Ok(()),
            _ => Err(SearchEngineError::schema_violation(
                self.name(),
                format!("field '{}' must be an object", path),
            )),
        }
    }
}

fn decode_projection<T>(document: &Value) -> Result<String, SearchEngineError>
where
    T: IndexableDocument + DeserializeOwned,
{
    let projection: T = serde_json::from_value(document.clone()).map_err(|e| {
        SearchEngineError::schema_violation(T::INDEX.as_str(), format!("invalid document: {}", e))
    })?;
    Ok(projection.document_id().to_string())
}
