//! Geozone - delivery-zone resolution for storefront checkout
//!
//! This library provides the zone engine and shared types for the query and author binaries.

pub mod config;
pub mod error;
pub mod geocoding;
pub mod models;
pub mod zones;

pub use error::{Result, ZoneError};
pub use models::{Area, BoundingBox, Coordinate, ResolutionResult, Zone};
pub use zones::{ResolveOptions, ZoneCatalog, ZoneResolver};
