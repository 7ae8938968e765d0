//! Point-to-zone resolution.
//!
//! Zones are scanned in catalog order and areas in stored order; the first
//! area containing the point wins. Without a match, nearby areas are returned
//! nearest first.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::geometry::{contains_box, haversine_km, round2};
use super::ZoneCatalog;
use crate::error::{Result, ZoneError};
use crate::models::{Coordinate, NearbyCandidate, ResolutionResult};

pub const DEFAULT_AREA_RADIUS_KM: f64 = 2.0;
pub const NEARBY_THRESHOLD_KM: f64 = 10.0;
pub const MAX_NEARBY_RESULTS: usize = 5;

/// Slack applied to radius comparisons so points on the circle edge match
pub const BOUNDARY_TOLERANCE_KM: f64 = 1e-6;

/// Tunables for a resolution call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Radius for areas with neither bounds nor a positive radius
    pub default_area_radius_km: f64,
    /// Unmatched areas within this distance are suggested
    pub nearby_threshold_km: f64,
    pub max_nearby_results: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            default_area_radius_km: DEFAULT_AREA_RADIUS_KM,
            nearby_threshold_km: NEARBY_THRESHOLD_KM,
            max_nearby_results: MAX_NEARBY_RESULTS,
        }
    }
}

impl ResolveOptions {
    /// The default radius must be positive and the nearby threshold non-negative.
    pub fn validate(&self) -> Result<()> {
        let r = self.default_area_radius_km;
        if !r.is_finite() || r <= 0.0 {
            return Err(ZoneError::InvalidOptions(format!(
                "default_area_radius_km must be positive, got {}",
                r
            )));
        }
        let t = self.nearby_threshold_km;
        if !t.is_finite() || t < 0.0 {
            return Err(ZoneError::InvalidOptions(format!(
                "nearby_threshold_km must be non-negative, got {}",
                t
            )));
        }
        Ok(())
    }
}

/// Resolves coordinates against catalog snapshots
#[derive(Debug, Clone, Default)]
pub struct ZoneResolver {
    options: ResolveOptions,
}

impl ZoneResolver {
    pub fn new(options: ResolveOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn resolve(&self, catalog: &ZoneCatalog, point: Coordinate) -> Result<ResolutionResult> {
        resolve(catalog, point, &self.options)
    }
}

/// Resolve `point` to the first containing area, or rank nearby areas.
///
/// Fails only for an invalid `point`. Malformed areas are logged and skipped.
pub fn resolve(
    catalog: &ZoneCatalog,
    point: Coordinate,
    opts: &ResolveOptions,
) -> Result<ResolutionResult> {
    point.validate()?;

    let mut candidates: Vec<NearbyCandidate> = Vec::new();

    for zone in catalog.zones() {
        for area in &zone.areas {
            if let Err(e) = area.validate(&zone.name) {
                warn!("Skipping area: {}", e);
                continue;
            }

            if let Some(bounds) = &area.bounds {
                if bounds.is_inverted() {
                    warn!(
                        "Bounds of {}/{} have swapped corners; checking radius only",
                        zone.name, area.name
                    );
                } else if contains_box(bounds, point) {
                    debug!(
                        "({}, {}) inside bounds of {}/{}",
                        point.lat, point.lng, zone.name, area.name
                    );
                    return Ok(ResolutionResult::matched(&zone.name, &area.name));
                }
            }

            let distance = haversine_km(area.centroid, point)?;
            let radius = area.effective_radius_km(opts.default_area_radius_km);

            if distance <= radius + BOUNDARY_TOLERANCE_KM {
                debug!(
                    "({}, {}) within {:.3} km of {}/{} (radius {} km)",
                    point.lat, point.lng, distance, zone.name, area.name, radius
                );
                return Ok(ResolutionResult::matched(&zone.name, &area.name));
            }

            if distance <= opts.nearby_threshold_km {
                candidates.push(NearbyCandidate {
                    area_name: area.name.clone(),
                    zone_name: zone.name.clone(),
                    distance_km: round2(distance),
                });
            }
        }
    }

    // Stable: equal distances keep catalog order
    candidates.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    candidates.truncate(opts.max_nearby_results);

    debug!(
        "({}, {}) unmatched, {} nearby candidates",
        point.lat,
        point.lng,
        candidates.len()
    );

    Ok(ResolutionResult::unmatched(candidates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Area, BoundingBox, Zone};
    use crate::zones::geometry::EARTH_RADIUS_KM;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate { lat, lng }
    }

    /// Point `km` due north of `c`
    fn north_of(c: Coordinate, km: f64) -> Coordinate {
        coord(c.lat + (km / EARTH_RADIUS_KM).to_degrees(), c.lng)
    }

    fn dha() -> Area {
        Area::new("DHA Phase 5", coord(31.4697, 74.4216)).with_bounds(BoundingBox {
            southwest: coord(31.460, 74.410),
            northeast: coord(31.480, 74.430),
        })
    }

    fn model_town() -> Area {
        Area::new("Model Town", coord(31.48, 74.33))
    }

    fn lahore() -> ZoneCatalog {
        ZoneCatalog::new(vec![Zone::new("Lahore")
            .with_area(dha())
            .with_area(model_town())])
    }

    fn run(catalog: &ZoneCatalog, p: Coordinate) -> ResolutionResult {
        resolve(catalog, p, &ResolveOptions::default()).unwrap()
    }

    fn assert_matched(result: &ResolutionResult, zone: &str, area: &str) {
        let m = result.matched.as_ref().expect("expected a match");
        assert_eq!(m.zone_name, zone);
        assert_eq!(m.area_name, area);
        assert!(result.nearby.is_empty());
    }

    #[test]
    fn test_dha_scenario() {
        let catalog = lahore();
        assert_matched(&run(&catalog, coord(31.470, 74.420)), "Lahore", "DHA Phase 5");

        let karachi = run(&catalog, coord(24.8607, 67.0011));
        assert!(karachi.matched.is_none());
        assert!(karachi.nearby.is_empty());
    }

    #[test]
    fn test_model_town_default_radius() {
        let catalog = lahore();
        let centroid = model_town().centroid;

        assert_matched(&run(&catalog, north_of(centroid, 1.5)), "Lahore", "Model Town");

        let outside = run(&catalog, north_of(centroid, 2.5));
        assert!(outside.matched.is_none());
        let suggestion = outside
            .nearby
            .iter()
            .find(|c| c.area_name == "Model Town")
            .expect("Model Town should be suggested");
        assert_eq!(suggestion.zone_name, "Lahore");
        assert_eq!(suggestion.distance_km, 2.5);
    }

    #[test]
    fn test_bounds_take_priority_over_radius() {
        // Corner of the box, ~1.2 km from the centroid, far outside the tiny radius
        let catalog = ZoneCatalog::new(vec![
            Zone::new("Lahore").with_area(dha().with_radius_km(0.01))
        ]);
        assert_matched(&run(&catalog, coord(31.461, 74.429)), "Lahore", "DHA Phase 5");
    }

    #[test]
    fn test_radius_checked_when_outside_bounds() {
        let centroid = coord(31.4697, 74.4216);
        let catalog = ZoneCatalog::new(vec![Zone::new("Lahore").with_area(dha().with_radius_km(5.0))]);
        // North of the box but within 5 km of the centroid
        assert_matched(&run(&catalog, north_of(centroid, 3.0)), "Lahore", "DHA Phase 5");
    }

    #[test]
    fn test_centroid_matches_explicit_radius() {
        let centroid = coord(24.8138, 67.0300);
        let catalog = ZoneCatalog::new(vec![
            Zone::new("Karachi").with_area(Area::new("Clifton", centroid).with_radius_km(0.5))
        ]);
        assert_matched(&run(&catalog, centroid), "Karachi", "Clifton");
    }

    #[test]
    fn test_radius_boundary_is_inclusive() {
        let centroid = coord(24.8138, 67.0300);
        let catalog = ZoneCatalog::new(vec![
            Zone::new("Karachi").with_area(Area::new("Clifton", centroid).with_radius_km(3.0))
        ]);
        let edge = north_of(centroid, 3.0);
        let d = haversine_km(centroid, edge).unwrap();
        assert!((d - 3.0).abs() < 1e-6);
        assert_matched(&run(&catalog, edge), "Karachi", "Clifton");

        let beyond = run(&catalog, north_of(centroid, 3.001));
        assert!(beyond.matched.is_none());
    }

    #[test]
    fn test_zero_radius_uses_default() {
        let centroid = coord(31.48, 74.33);
        let catalog = ZoneCatalog::new(vec![
            Zone::new("Lahore").with_area(Area::new("Model Town", centroid).with_radius_km(0.0))
        ]);
        assert_matched(&run(&catalog, north_of(centroid, 1.9)), "Lahore", "Model Town");
    }

    #[test]
    fn test_empty_catalog_is_not_an_error() {
        let result = run(&ZoneCatalog::empty(), coord(31.47, 74.42));
        assert_eq!(result, ResolutionResult::default());
    }

    #[test]
    fn test_invalid_point_fails() {
        let catalog = lahore();
        let err = resolve(&catalog, coord(f64::NAN, 74.0), &ResolveOptions::default())
            .unwrap_err();
        assert!(matches!(err, ZoneError::InvalidCoordinate { .. }));

        // Even an empty catalog rejects invalid input
        assert!(resolve(
            &ZoneCatalog::empty(),
            coord(0.0, 181.0),
            &ResolveOptions::default()
        )
        .is_err());
    }

    #[test]
    fn test_nearby_sorted_ascending() {
        let origin = coord(31.40, 74.20);
        // Declared far-first to check ordering is by distance, not catalog order
        let catalog = ZoneCatalog::new(vec![Zone::new("Lahore")
            .with_area(Area::new("Far", north_of(origin, 7.0)).with_radius_km(1.0))
            .with_area(Area::new("Near", north_of(origin, 3.0)).with_radius_km(1.0))]);

        let result = run(&catalog, origin);
        assert!(result.matched.is_none());
        let names: Vec<&str> = result.nearby.iter().map(|c| c.area_name.as_str()).collect();
        assert_eq!(names, vec!["Near", "Far"]);
        assert_eq!(result.nearby[0].distance_km, 3.0);
        assert_eq!(result.nearby[1].distance_km, 7.0);
    }

    #[test]
    fn test_nearby_excludes_beyond_threshold() {
        let origin = coord(31.40, 74.20);
        let catalog = ZoneCatalog::new(vec![Zone::new("Lahore")
            .with_area(Area::new("Edge", north_of(origin, 9.5)))
            .with_area(Area::new("Outside", north_of(origin, 10.5)))]);

        let result = run(&catalog, origin);
        let names: Vec<&str> = result.nearby.iter().map(|c| c.area_name.as_str()).collect();
        assert_eq!(names, vec!["Edge"]);
    }

    #[test]
    fn test_nearby_ties_keep_catalog_order() {
        let origin = coord(31.40, 74.20);
        let catalog = ZoneCatalog::new(vec![
            Zone::new("Lahore").with_area(Area::new("First", north_of(origin, 4.0))),
            Zone::new("Kasur").with_area(Area::new("Second", north_of(origin, 4.0))),
        ]);

        let result = run(&catalog, origin);
        let names: Vec<&str> = result.nearby.iter().map(|c| c.area_name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn test_nearby_truncated() {
        let origin = coord(31.40, 74.20);
        let mut zone = Zone::new("Lahore");
        for i in 0..8 {
            let km = 9.0 - i as f64 * 0.8;
            zone = zone.with_area(Area::new(format!("Area {}", i), north_of(origin, km)));
        }
        let catalog = ZoneCatalog::new(vec![zone]);

        let result = run(&catalog, origin);
        assert!(result.matched.is_none());
        assert_eq!(result.nearby.len(), MAX_NEARBY_RESULTS);
        assert_eq!(result.nearby[0].area_name, "Area 7");
        assert_eq!(result.nearby[4].area_name, "Area 3");

        let opts = ResolveOptions {
            max_nearby_results: 2,
            ..Default::default()
        };
        assert_eq!(resolve(&catalog, origin, &opts).unwrap().nearby.len(), 2);
    }

    #[test]
    fn test_first_match_wins_across_zones() {
        let centroid = coord(31.48, 74.33);
        let catalog = ZoneCatalog::new(vec![
            Zone::new("Lahore").with_area(Area::new("Model Town", centroid)),
            Zone::new("Lahore Cantt").with_area(Area::new("Overlap", centroid).with_radius_km(5.0)),
        ]);
        assert_matched(&run(&catalog, centroid), "Lahore", "Model Town");
    }

    #[test]
    fn test_match_discards_earlier_candidates() {
        let origin = coord(31.40, 74.20);
        let catalog = ZoneCatalog::new(vec![Zone::new("Lahore")
            .with_area(Area::new("Nearby", north_of(origin, 5.0)))
            .with_area(Area::new("Home", origin))]);
        assert_matched(&run(&catalog, origin), "Lahore", "Home");
    }

    #[test]
    fn test_malformed_area_is_skipped() {
        let origin = coord(31.40, 74.20);
        let catalog = ZoneCatalog::new(vec![Zone::new("Lahore")
            .with_area(Area::new("Broken", coord(f64::NAN, 74.20)))
            .with_area(Area::new("Off Map", origin).with_bounds(BoundingBox {
                southwest: coord(31.3, 74.1),
                northeast: coord(95.0, 74.3),
            }))
            .with_area(Area::new("Negative", origin).with_radius_km(-2.0))
            .with_area(Area::new("Home", origin))]);
        assert_matched(&run(&catalog, origin), "Lahore", "Home");
    }

    #[test]
    fn test_swapped_bounds_fall_back_to_radius() {
        // Box crossing the 180th meridian: west edge is numerically east of the east edge
        let centroid = coord(-17.0, 179.95);
        let catalog = ZoneCatalog::new(vec![Zone::new("Fiji").with_area(
            Area::new("Taveuni", centroid).with_bounds(BoundingBox {
                southwest: coord(-17.1, 179.8),
                northeast: coord(-16.9, -179.9),
            }),
        )]);
        assert_matched(&run(&catalog, centroid), "Fiji", "Taveuni");

        // Inside the box on the globe, but plain min/max containment misses it
        let result = run(&catalog, coord(-17.0, 179.99));
        assert!(result.matched.is_none());
        assert_eq!(result.nearby.len(), 1);
        assert_eq!(result.nearby[0].area_name, "Taveuni");
    }

    #[test]
    fn test_options_validate() {
        assert!(ResolveOptions::default().validate().is_ok());

        let bad = [
            ResolveOptions {
                default_area_radius_km: -5.0,
                ..Default::default()
            },
            ResolveOptions {
                default_area_radius_km: 0.0,
                ..Default::default()
            },
            ResolveOptions {
                nearby_threshold_km: f64::NAN,
                ..Default::default()
            },
            ResolveOptions {
                nearby_threshold_km: -1.0,
                ..Default::default()
            },
        ];
        for opts in bad {
            assert!(matches!(opts.validate(), Err(ZoneError::InvalidOptions(_))));
        }

        let zero_threshold = ResolveOptions {
            nearby_threshold_km: 0.0,
            ..Default::default()
        };
        assert!(zero_threshold.validate().is_ok());
    }

    #[test]
    fn test_options_override_default_radius() {
        let centroid = coord(31.48, 74.33);
        let catalog = ZoneCatalog::new(vec![Zone::new("Lahore").with_area(Area::new("Model Town", centroid))]);
        let p = north_of(centroid, 2.5);

        let opts = ResolveOptions {
            default_area_radius_km: 3.0,
            ..Default::default()
        };
        assert!(resolve(&catalog, p, &opts).unwrap().is_serviceable());

        let tight = ResolveOptions {
            nearby_threshold_km: 1.0,
            ..Default::default()
        };
        let result = resolve(&catalog, p, &tight).unwrap();
        assert!(result.matched.is_none());
        assert!(result.nearby.is_empty());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let catalog = lahore();
        let p = north_of(coord(31.48, 74.33), 4.0);
        let resolver = ZoneResolver::default();
        let first = resolver.resolve(&catalog, p).unwrap();
        for _ in 0..10 {
            assert_eq!(resolver.resolve(&catalog, p).unwrap(), first);
        }
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let opts: ResolveOptions = toml::from_str("nearby_threshold_km = 15.0").unwrap();
        assert_eq!(opts.nearby_threshold_km, 15.0);
        assert_eq!(opts.default_area_radius_km, DEFAULT_AREA_RADIUS_KM);
        assert_eq!(opts.max_nearby_results, MAX_NEARBY_RESULTS);
    }
}
