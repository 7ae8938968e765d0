//! Nominatim-backed geocoding client.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::{GeocodingClient, PlaceDetails, PlaceSuggestion};
use crate::config::GeocoderConfig;
use crate::error::{Result, ZoneError};
use crate::models::{BoundingBox, Coordinate};

const SEARCH_LIMIT: usize = 5;

/// Talks to a Nominatim instance over its JSON API
pub struct NominatimClient {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    osm_type: Option<String>,
    #[serde(default)]
    osm_id: Option<i64>,
    /// [min_lat, max_lat, min_lon, max_lon]
    #[serde(default)]
    boundingbox: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl NominatimClient {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let mut base_url =
            Url::parse(&config.base_url).map_err(|e| ZoneError::Geocoding(e.to_string()))?;
        // Url::join drops the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ZoneError::Geocoding(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ZoneError::Geocoding(e.to_string()))?;
        url.query_pairs_mut().append_pair("format", "jsonv2");
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ZoneError::Geocoding(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("Nominatim returned {}", status);
            return Err(ZoneError::Geocoding(format!("upstream status {}", status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ZoneError::Geocoding(e.to_string()))
    }
}

impl GeocodingClient for NominatimClient {
    async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>> {
        let mut url = self.endpoint("search")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("limit", &SEARCH_LIMIT.to_string());

        let places: Vec<NominatimPlace> = self.get_json(url).await?;
        Ok(places
            .iter()
            .filter_map(|p| {
                let place_ref = place_ref(p.osm_type.as_deref()?, p.osm_id?)?;
                Some(PlaceSuggestion {
                    place_ref,
                    description: p.display_name.clone(),
                })
            })
            .collect())
    }

    async fn place_details(&self, place_ref: &str) -> Result<PlaceDetails> {
        if !is_place_ref(place_ref) {
            return Err(ZoneError::Geocoding(format!(
                "'{}' is not a place reference (expected N123, W123 or R123)",
                place_ref
            )));
        }

        let mut url = self.endpoint("lookup")?;
        url.query_pairs_mut().append_pair("osm_ids", place_ref);

        let places: Vec<NominatimPlace> = self.get_json(url).await?;
        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| ZoneError::Geocoding(format!("place {} not found", place_ref)))?;
        into_details(place_ref, place)
    }

    async fn reverse_geocode(&self, point: Coordinate) -> Result<Option<String>> {
        point.validate()?;

        let mut url = self.endpoint("reverse")?;
        url.query_pairs_mut()
            .append_pair("lat", &point.lat.to_string())
            .append_pair("lon", &point.lng.to_string());

        let reverse: NominatimReverse = self.get_json(url).await?;
        if let Some(e) = reverse.error {
            debug!("Reverse geocode miss at ({}, {}): {}", point.lat, point.lng, e);
            return Ok(None);
        }
        Ok(reverse.display_name)
    }
}

/// "relation" + 123 -> "R123"
fn place_ref(osm_type: &str, osm_id: i64) -> Option<String> {
    let prefix = match osm_type {
        "node" | "N" => 'N',
        "way" | "W" => 'W',
        "relation" | "R" => 'R',
        _ => return None,
    };
    Some(format!("{}{}", prefix, osm_id))
}

fn is_place_ref(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some('N' | 'W' | 'R'))
        && !chars.as_str().is_empty()
        && chars.all(|c| c.is_ascii_digit())
}

fn parse_coord(lat: &str, lng: &str) -> Option<Coordinate> {
    Coordinate::new(lat.trim().parse().ok()?, lng.trim().parse().ok()?).ok()
}

/// Nominatim bounding boxes are `[min_lat, max_lat, min_lon, max_lon]` strings
fn parse_bounding_box(raw: &[String]) -> Option<BoundingBox> {
    if raw.len() != 4 {
        return None;
    }
    let southwest = parse_coord(&raw[0], &raw[2])?;
    let northeast = parse_coord(&raw[1], &raw[3])?;
    BoundingBox::new(southwest, northeast).ok()
}

fn into_details(place_ref: &str, place: NominatimPlace) -> Result<PlaceDetails> {
    let centroid = parse_coord(&place.lat, &place.lon).ok_or_else(|| {
        ZoneError::Geocoding(format!(
            "place {} has invalid coordinates ({}, {})",
            place_ref, place.lat, place.lon
        ))
    })?;

    let bounds = place.boundingbox.as_deref().and_then(parse_bounding_box);
    if place.boundingbox.is_some() && bounds.is_none() {
        warn!("Ignoring unusable bounding box for place {}", place_ref);
    }

    let name = place
        .name
        .filter(|n| !n.is_empty())
        .or_else(|| place.display_name.split(',').next().map(|s| s.trim().to_string()))
        .unwrap_or_else(|| place_ref.to_string());

    Ok(PlaceDetails {
        place_ref: place_ref.to_string(),
        name,
        address: Some(place.display_name),
        centroid,
        bounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOOKUP: &str = r#"[{
        "place_id": 1234,
        "osm_type": "relation",
        "osm_id": 7654321,
        "lat": "31.4697",
        "lon": "74.4216",
        "name": "DHA Phase 5",
        "display_name": "DHA Phase 5, Lahore, Punjab, Pakistan",
        "boundingbox": ["31.460", "31.480", "74.410", "74.430"]
    }]"#;

    #[test]
    fn test_place_ref() {
        assert_eq!(place_ref("relation", 42).as_deref(), Some("R42"));
        assert_eq!(place_ref("way", 7).as_deref(), Some("W7"));
        assert_eq!(place_ref("node", 1).as_deref(), Some("N1"));
        assert!(place_ref("area", 1).is_none());
    }

    #[test]
    fn test_is_place_ref() {
        assert!(is_place_ref("R7654321"));
        assert!(is_place_ref("N1"));
        assert!(!is_place_ref("R"));
        assert!(!is_place_ref("X12"));
        assert!(!is_place_ref("R12a"));
        assert!(!is_place_ref(""));
    }

    #[test]
    fn test_into_details() {
        let places: Vec<NominatimPlace> = serde_json::from_str(LOOKUP).unwrap();
        let place = places.into_iter().next().unwrap();
        let details = into_details("R7654321", place).unwrap();

        assert_eq!(details.name, "DHA Phase 5");
        assert_eq!(details.centroid, Coordinate { lat: 31.4697, lng: 74.4216 });
        let bounds = details.bounds.unwrap();
        assert_eq!(bounds.southwest, Coordinate { lat: 31.460, lng: 74.410 });
        assert_eq!(bounds.northeast, Coordinate { lat: 31.480, lng: 74.430 });
        assert_eq!(
            details.address.as_deref(),
            Some("DHA Phase 5, Lahore, Punjab, Pakistan")
        );
    }

    #[test]
    fn test_name_falls_back_to_display_name() {
        let place: NominatimPlace = serde_json::from_str(
            r#"{"lat": "31.48", "lon": "74.33", "display_name": "Model Town, Lahore"}"#,
        )
        .unwrap();
        let details = into_details("W1", place).unwrap();
        assert_eq!(details.name, "Model Town");
        assert!(details.bounds.is_none());
    }

    #[test]
    fn test_bad_bounding_box_is_dropped() {
        let swapped = vec![
            "31.480".to_string(),
            "31.460".to_string(),
            "74.410".to_string(),
            "74.430".to_string(),
        ];
        assert!(parse_bounding_box(&swapped).is_none());
        assert!(parse_bounding_box(&["1".to_string()]).is_none());
    }

    #[test]
    fn test_invalid_centroid_is_an_error() {
        let place: NominatimPlace =
            serde_json::from_str(r#"{"lat": "abc", "lon": "74.33", "display_name": "x"}"#).unwrap();
        assert!(matches!(
            into_details("N1", place),
            Err(ZoneError::Geocoding(_))
        ));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let config = GeocoderConfig {
            base_url: "https://geo.example.com/nominatim".to_string(),
            ..GeocoderConfig::default()
        };
        let client = NominatimClient::new(&config).unwrap();
        let url = client.endpoint("lookup").unwrap();
        assert_eq!(
            url.as_str(),
            "https://geo.example.com/nominatim/lookup?format=jsonv2"
        );
    }
}
