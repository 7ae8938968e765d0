//! Core data models for the zone engine.

pub mod resolution;
pub mod zone;

pub use resolution::{NearbyCandidate, ResolutionMatch, ResolutionResult, NOT_SERVICEABLE_MESSAGE};
pub use zone::{Area, BoundingBox, Coordinate, Zone};
