//! Distance and containment primitives.

use crate::error::Result;
use crate::models::{BoundingBox, Coordinate};

/// Earth radius used for all great-circle distances
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometres
pub fn haversine_km(a: Coordinate, b: Coordinate) -> Result<f64> {
    a.validate()?;
    b.validate()?;

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Clamp guards against h drifting just above 1.0 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    Ok(EARTH_RADIUS_KM * c)
}

/// Boundary-inclusive min/max containment. Does not handle boxes crossing
/// the anti-meridian.
pub fn contains_box(bounds: &BoundingBox, p: Coordinate) -> bool {
    bounds.southwest.lat <= p.lat
        && p.lat <= bounds.northeast.lat
        && bounds.southwest.lng <= p.lng
        && p.lng <= bounds.northeast.lng
}

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
