//! Place lookup used by the zone-authoring flow.
//!
//! The resolver never touches this module; it only consumes coordinates.

mod nominatim;

pub use nominatim::NominatimClient;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{BoundingBox, Coordinate};

/// One autocomplete suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSuggestion {
    /// Opaque reference accepted by `place_details`
    pub place_ref: String,
    pub description: String,
}

/// Resolved place with the geometry needed to author an area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub place_ref: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub centroid: Coordinate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingBox>,
}

/// Search, details and reverse lookups against an external place service
#[allow(async_fn_in_trait)]
pub trait GeocodingClient {
    async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>>;

    async fn place_details(&self, place_ref: &str) -> Result<PlaceDetails>;

    /// Formatted address for a point, if the service knows one
    async fn reverse_geocode(&self, point: Coordinate) -> Result<Option<String>>;
}
