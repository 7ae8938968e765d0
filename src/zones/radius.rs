//! Service radius estimation for newly authored areas.

use super::geometry::{haversine_km, round2};
use crate::error::Result;
use crate::models::{BoundingBox, Coordinate};

/// Approximate service radius of an area from its centroid and bounding box.
///
/// Distance from the centroid to the northeast corner, rounded to 2 decimals.
/// For a centroid near the middle of the box this is the farthest corner, so
/// the circle slightly over-covers the place.
pub fn estimate_radius_km(centroid: Coordinate, bounds: &BoundingBox) -> Result<f64> {
    bounds.validate()?;
    Ok(round2(haversine_km(centroid, bounds.northeast)?))
}
