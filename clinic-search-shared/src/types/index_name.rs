//! The fixed set of search indices known to the synchronization layer.
//!
//! Index names are never discovered at runtime. Everything that creates, writes to
//! or queries an index goes through [`IndexName`], so an index outside this set can
//! never be created by this layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A known search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexName {
    Pets,
    Appointments,
    Users,
    Clinics,
    HealthRecords,
    Faqs,
}

impl IndexName {
    /// The five entity indices mirrored from the clinic's primary store.
    pub const CLINIC_INDICES: [IndexName; 5] = [
        IndexName::Pets,
        IndexName::Appointments,
        IndexName::Users,
        IndexName::Clinics,
        IndexName::HealthRecords,
    ];

    /// Every index this layer knows how to build.
    pub const ALL: [IndexName; 6] = [
        IndexName::Pets,
        IndexName::Appointments,
        IndexName::Users,
        IndexName::Clinics,
        IndexName::HealthRecords,
        IndexName::Faqs,
    ];

    /// The index name as stored in the search engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexName::Pets => "pets",
            IndexName::Appointments => "appointments",
            IndexName::Users => "users",
            IndexName::Clinics => "clinics",
            IndexName::HealthRecords => "health-records",
            IndexName::Faqs => "faqs",
        }
    }

    /// Returns true for the five clinic entity indices.
    pub fn is_clinic_index(&self) -> bool {
        !matches!(self, IndexName::Faqs)
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownIndexName(pub String);

impl fmt::Display for UnknownIndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown index name '{}'", self.0)
    }
}

impl std::error::Error for UnknownIndexName {}

impl FromStr for IndexName {
    type Err = UnknownIndexName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IndexName::ALL
            .iter()
            .copied()
            .find(|index| index.as_str() == s)
            .ok_or_else(|| UnknownIndexName(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        for index in IndexName::ALL {
            assert_eq!(index.as_str().parse::<IndexName>().unwrap(), index);
        }
    }

    #[test]
    fn test_parse_unknown_name() {
        let err = "owners".parse::<IndexName>().unwrap_err();
        assert_eq!(err, UnknownIndexName("owners".to_string()));
        assert!("healthRecords".parse::<IndexName>().is_err());
    }

    #[test]
    fn test_clinic_indices_exclude_faqs() {
        assert_eq!(IndexName::CLINIC_INDICES.len(), 5);
        assert!(!IndexName::CLINIC_INDICES.contains(&IndexName::Faqs));
        assert!(!IndexName::Faqs.is_clinic_index());
        assert!(IndexName::HealthRecords.is_clinic_index());
    }

    #[test]
    fn test_serde_uses_engine_names() {
        let json = serde_json::to_string(&IndexName::HealthRecords).unwrap();
        assert_eq!(json, "\"health-records\"");
    }
}
