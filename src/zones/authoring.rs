//! Drafting new areas from place lookups.
//!
//! The draft is for operator review; persisting it into the catalog is left
//! to whoever owns the catalog file.

use serde::Serialize;
use tracing::info;

use super::radius::estimate_radius_km;
use crate::error::{Result, ZoneError};
use crate::geocoding::{GeocodingClient, PlaceDetails};
use crate::models::{Area, Zone};

/// A proposed area, not yet part of any catalog
#[derive(Debug, Clone, PartialEq)]
pub struct AreaDraft {
    pub zone_name: String,
    pub area: Area,
    /// True when `radius_km` was pre-filled from the bounding box
    pub radius_estimated: bool,
}

#[derive(Serialize)]
struct CatalogSnippet<'a> {
    zones: Vec<&'a Zone>,
}

impl AreaDraft {
    /// Build a draft from place details. The radius is estimated from the
    /// bounding box when one is known; otherwise it is left unset and the
    /// resolver default applies.
    pub fn from_place(zone_name: &str, place: PlaceDetails) -> Result<Self> {
        let radius_km = match &place.bounds {
            Some(bounds) => Some(estimate_radius_km(place.centroid, bounds)?),
            None => None,
        };

        let area = Area {
            name: place.name,
            external_ref: Some(place.place_ref),
            centroid: place.centroid,
            bounds: place.bounds,
            radius_km,
            address: place.address,
        };
        area.validate(zone_name)?;

        Ok(Self {
            zone_name: zone_name.to_string(),
            area,
            radius_estimated: radius_km.is_some(),
        })
    }

    /// Render as a catalog file fragment
    pub fn to_toml(&self) -> Result<String> {
        let zone = Zone::new(self.zone_name.clone()).with_area(self.area.clone());
        toml::to_string(&CatalogSnippet { zones: vec![&zone] })
            .map_err(|e| ZoneError::Catalog(e.to_string()))
    }
}

/// Look up `place_ref` and turn it into an area draft for `zone_name`
pub async fn draft_area<C: GeocodingClient>(
    client: &C,
    zone_name: &str,
    place_ref: &str,
) -> Result<AreaDraft> {
    let place = client.place_details(place_ref).await?;
    let draft = AreaDraft::from_place(zone_name, place)?;
    info!(
        "Drafted area '{}' for zone '{}' (radius {:?} km)",
        draft.area.name, draft.zone_name, draft.area.radius_km
    );
    Ok(draft)
}
