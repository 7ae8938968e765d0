//! Configured delivery zones and the geographic primitives they are built from.

use geo::{BoundingRect, MultiPoint, Point, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ZoneError};

/// Geographic point in degrees (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting NaN and out-of-range values
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        let c = Self { lat, lng };
        c.validate()?;
        Ok(c)
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ZoneError::InvalidCoordinate {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Self {
        Point::new(c.lng, c.lat)
    }
}

impl From<Point<f64>> for Coordinate {
    fn from(p: Point<f64>) -> Self {
        Self {
            lat: p.y(),
            lng: p.x(),
        }
    }
}

/// Axis-aligned box. No anti-meridian wraparound: `southwest` must be
/// component-wise <= `northeast`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub southwest: Coordinate,
    pub northeast: Coordinate,
}

impl BoundingBox {
    /// Build a box, rejecting invalid corners and inverted extents
    pub fn new(southwest: Coordinate, northeast: Coordinate) -> Result<Self> {
        let b = Self {
            southwest,
            northeast,
        };
        b.validate()?;
        Ok(b)
    }

    pub fn validate(&self) -> Result<()> {
        self.southwest.validate()?;
        self.northeast.validate()?;
        if self.southwest.lat > self.northeast.lat {
            return Err(ZoneError::InvalidBounds(format!(
                "southwest lat {} is north of northeast lat {}",
                self.southwest.lat, self.northeast.lat
            )));
        }
        if self.southwest.lng > self.northeast.lng {
            return Err(ZoneError::InvalidBounds(format!(
                "southwest lng {} is east of northeast lng {}",
                self.southwest.lng, self.northeast.lng
            )));
        }
        Ok(())
    }

    /// True when a corner pair is swapped, as with a box drawn across the
    /// 180th meridian. Containment never matches such a box.
    pub fn is_inverted(&self) -> bool {
        self.southwest.lat > self.northeast.lat || self.southwest.lng > self.northeast.lng
    }

    fn from_rect(rect: Rect<f64>) -> Self {
        Self {
            southwest: Point::<f64>::from(rect.min()).into(),
            northeast: Point::<f64>::from(rect.max()).into(),
        }
    }
}

/// A serviceable locality ("society") inside a zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub name: String,

    /// Identifier of the place this area was authored from (e.g. an OSM ref)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,

    pub centroid: Coordinate,

    /// Takes priority over the radius when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingBox>,

    /// Service radius; unset or zero falls back to the resolver default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_km: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Area {
    pub fn new(name: impl Into<String>, centroid: Coordinate) -> Self {
        Self {
            name: name.into(),
            external_ref: None,
            centroid,
            bounds: None,
            radius_km: None,
            address: None,
        }
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_radius_km(mut self, radius_km: f64) -> Self {
        self.radius_km = Some(radius_km);
        self
    }

    /// Radius used for circle containment: the configured one if positive,
    /// otherwise `default_km`.
    pub fn effective_radius_km(&self, default_km: f64) -> f64 {
        match self.radius_km {
            Some(r) if r > 0.0 => r,
            _ => default_km,
        }
    }

    /// Check the numeric configuration of this area. Swapped bounds corners
    /// are not malformed; see [`BoundingBox::is_inverted`].
    pub fn validate(&self, zone: &str) -> Result<()> {
        let malformed = |reason: String| ZoneError::MalformedArea {
            zone: zone.to_string(),
            area: self.name.clone(),
            reason,
        };

        if !self.centroid.is_valid() {
            return Err(malformed(format!(
                "centroid ({}, {}) is not a valid coordinate",
                self.centroid.lat, self.centroid.lng
            )));
        }
        if let Some(bounds) = &self.bounds {
            for corner in [bounds.southwest, bounds.northeast] {
                if !corner.is_valid() {
                    return Err(malformed(format!(
                        "bounds corner ({}, {}) is not a valid coordinate",
                        corner.lat, corner.lng
                    )));
                }
            }
        }
        if let Some(r) = self.radius_km {
            if !r.is_finite() || r < 0.0 {
                return Err(malformed(format!("radius_km {} must be finite and >= 0", r)));
            }
        }
        Ok(())
    }
}

fn default_active() -> bool {
    true
}

/// A delivery zone (a city) holding its areas in configured order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default)]
    pub display_order: i32,

    #[serde(default)]
    pub areas: Vec<Area>,
}

impl Zone {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            display_order: 0,
            areas: Vec::new(),
        }
    }

    pub fn with_area(mut self, area: Area) -> Self {
        self.areas.push(area);
        self
    }

    /// Box covering every valid centroid and bounding box of the zone's areas.
    ///
    /// Used by map clients to highlight the serviceable region. Circles are
    /// not expanded into the extent.
    pub fn extent(&self) -> Option<BoundingBox> {
        let mut points: Vec<Point<f64>> = Vec::new();
        for area in &self.areas {
            if area.validate(&self.name).is_err() {
                continue;
            }
            points.push(area.centroid.into());
            if let Some(bounds) = &area.bounds {
                points.push(bounds.southwest.into());
                points.push(bounds.northeast.into());
            }
        }
        MultiPoint::new(points)
            .bounding_rect()
            .map(BoundingBox::from_rect)
    }
}
