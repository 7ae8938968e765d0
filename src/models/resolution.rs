//! Output of a zone resolution call.

use serde::{Deserialize, Serialize};

/// Message shown to customers when a point is outside every zone
pub const NOT_SERVICEABLE_MESSAGE: &str =
    "location not serviceable, please pick a point within a highlighted zone";

/// The zone and area a point was matched to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMatch {
    pub zone_name: String,
    pub area_name: String,
}

/// An unmatched area close enough to suggest to the customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyCandidate {
    pub area_name: String,
    pub zone_name: String,
    /// Rounded to 2 decimal places
    pub distance_km: f64,
}

/// Result of resolving a coordinate against a catalog.
///
/// `matched` and a non-empty `nearby` never appear together: candidate
/// collection stops at the first match.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolutionResult {
    #[serde(rename = "match")]
    pub matched: Option<ResolutionMatch>,
    pub nearby: Vec<NearbyCandidate>,
}

impl ResolutionResult {
    pub fn matched(zone_name: &str, area_name: &str) -> Self {
        Self {
            matched: Some(ResolutionMatch {
                zone_name: zone_name.to_string(),
                area_name: area_name.to_string(),
            }),
            nearby: Vec::new(),
        }
    }

    pub fn unmatched(nearby: Vec<NearbyCandidate>) -> Self {
        Self {
            matched: None,
            nearby,
        }
    }

    pub fn is_serviceable(&self) -> bool {
        self.matched.is_some()
    }

    /// Customer-facing message for an unmatched result
    pub fn message(&self) -> Option<&'static str> {
        if self.is_serviceable() {
            None
        } else {
            Some(NOT_SERVICEABLE_MESSAGE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_match_serialization() {
        let result = ResolutionResult::matched("Lahore", "DHA Phase 5");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "match": {"zoneName": "Lahore", "areaName": "DHA Phase 5"},
                "nearby": []
            })
        );
        assert!(result.message().is_none());
    }

    #[test]
    fn test_unmatched_serialization() {
        let result = ResolutionResult::unmatched(vec![NearbyCandidate {
            area_name: "Model Town".to_string(),
            zone_name: "Lahore".to_string(),
            distance_km: 2.5,
        }]);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "match": null,
                "nearby": [{"areaName": "Model Town", "zoneName": "Lahore", "distanceKm": 2.5}]
            })
        );
        assert!(!result.is_serviceable());
        assert_eq!(result.message(), Some(NOT_SERVICEABLE_MESSAGE));
    }

    #[test]
    fn test_default_is_empty_unmatched() {
        let result = ResolutionResult::default();
        assert!(result.matched.is_none());
        assert!(result.nearby.is_empty());
    }
}
