//! Error types for zone resolution and the surrounding plumbing.

use thiserror::Error;

/// Errors surfaced by the zone engine.
///
/// An empty catalog is deliberately not represented here: it resolves to a
/// normal "no match" result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ZoneError {
    /// Latitude/longitude is NaN, infinite or out of range.
    #[error("invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },

    /// A configured area failed validation. Logged and skipped during resolution.
    #[error("malformed area '{area}' in zone '{zone}': {reason}")]
    MalformedArea {
        zone: String,
        area: String,
        reason: String,
    },

    /// Southwest corner is not below/left of the northeast corner.
    #[error("invalid bounding box: {0}")]
    InvalidBounds(String),

    /// Resolver tunables out of range, from config or a request override.
    #[error("invalid resolve options: {0}")]
    InvalidOptions(String),

    /// Catalog file could not be read or parsed.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Upstream place lookup failed.
    #[error("geocoding error: {0}")]
    Geocoding(String),

    /// No catalog snapshot has been published yet.
    #[error("zone catalog not loaded yet")]
    NotReady,
}

pub type Result<T> = std::result::Result<T, ZoneError>;
