//! Location resolution: ZIP-code geocoding and one-shot device location.
//!
//! Both paths produce an explicit outcome instead of raising; the app turns
//! the non-resolved outcomes into a one-line notice.

use serde::Deserialize;

use crate::geo::Coordinate;
use crate::net;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Outcome of a location resolution attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LocationOutcome {
    Resolved(Coordinate),
    /// Well-formed lookup with zero matches (unknown ZIP).
    NotFound,
    /// The capability is absent: IP geolocation disabled in config.
    Unsupported,
    /// Network or parse failure.
    Failed,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Nominatim returns lat/lon as numeric strings; only the first match is
/// considered.
fn first_match(places: &[NominatimPlace]) -> Option<Coordinate> {
    let place = places.first()?;
    let lat = place.lat.parse::<f64>().ok()?;
    let lon = place.lon.parse::<f64>().ok()?;
    Some(Coordinate::new(lat, lon))
}

/// Resolve a US postal code to a coordinate.
pub fn resolve_zip(code: &str) -> LocationOutcome {
    let url = format!(
        "{}?format=json&countrycodes=us&postalcode={}",
        NOMINATIM_URL,
        code.trim()
    );
    log::debug!("Resolving ZIP: {}", url);

    let client = match net::http_client() {
        Ok(client) => client,
        Err(e) => {
            log::warn!("Geocoder client error: {}", e);
            return LocationOutcome::Failed;
        }
    };

    let places: Vec<NominatimPlace> = match client.get(&url).send().and_then(|r| r.json()) {
        Ok(places) => places,
        Err(e) => {
            log::warn!("ZIP resolution failed: {}", e);
            return LocationOutcome::Failed;
        }
    };

    match first_match(&places) {
        Some(coord) => LocationOutcome::Resolved(coord),
        None => LocationOutcome::NotFound,
    }
}

fn coord_from_value(value: &serde_json::Value, lat_key: &str, lon_key: &str) -> Option<Coordinate> {
    let lat = value.get(lat_key).and_then(serde_json::Value::as_f64)?;
    let lon = value.get(lon_key).and_then(serde_json::Value::as_f64)?;
    Some(Coordinate::new(lat, lon))
}

/// One-shot device location via IP geolocation.
///
/// Reports `Unsupported` immediately when the capability is disabled; no
/// fallback beyond the provider chain is attempted.
pub fn device_location(enabled: bool) -> LocationOutcome {
    if !enabled {
        return LocationOutcome::Unsupported;
    }

    log::debug!("Fetching device location via IP geolocation");

    // Try ipapi.co first
    if let Ok(response) = reqwest::blocking::get("https://ipapi.co/json/") {
        if let Ok(value) = response.json::<serde_json::Value>() {
            if let Some(coord) = coord_from_value(&value, "latitude", "longitude") {
                log::info!("Location found via ipapi.co: {}, {}", coord.lat, coord.lon);
                return LocationOutcome::Resolved(coord);
            }
        }
    }

    // Fallback to ip-api.com (no API key needed)
    if let Ok(response) = reqwest::blocking::get("http://ip-api.com/json/") {
        if let Ok(value) = response.json::<serde_json::Value>() {
            if let Some(coord) = coord_from_value(&value, "lat", "lon") {
                log::info!("Location found via ip-api.com: {}, {}", coord.lat, coord.lon);
                return LocationOutcome::Resolved(coord);
            }
        }
    }

    log::warn!("Failed to fetch location from all sources");
    LocationOutcome::Failed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_takes_index_zero() {
        let places: Vec<NominatimPlace> = serde_json::from_str(
            r#"[{"lat": "40.8126", "lon": "-73.0447"},
                {"lat": "0.0", "lon": "0.0"}]"#,
        )
        .unwrap();
        let coord = first_match(&places).unwrap();
        assert!((coord.lat - 40.8126).abs() < f64::EPSILON);
        assert!((coord.lon - (-73.0447)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_matches_resolve_to_none() {
        assert!(first_match(&[]).is_none());
    }

    #[test]
    fn test_non_numeric_strings_resolve_to_none() {
        let places: Vec<NominatimPlace> =
            serde_json::from_str(r#"[{"lat": "forty", "lon": "-73.0"}]"#).unwrap();
        assert!(first_match(&places).is_none());
    }

    #[test]
    fn test_disabled_capability_is_unsupported() {
        assert_eq!(device_location(false), LocationOutcome::Unsupported);
    }

    #[test]
    fn test_provider_payload_extraction() {
        let ipapi: serde_json::Value =
            serde_json::from_str(r#"{"latitude": 37.77, "longitude": -122.42}"#).unwrap();
        assert_eq!(
            coord_from_value(&ipapi, "latitude", "longitude"),
            Some(Coordinate::new(37.77, -122.42))
        );

        let ip_api: serde_json::Value =
            serde_json::from_str(r#"{"lat": 37.77, "lon": -122.42, "status": "success"}"#).unwrap();
        assert_eq!(
            coord_from_value(&ip_api, "lat", "lon"),
            Some(Coordinate::new(37.77, -122.42))
        );

        let missing: serde_json::Value = serde_json::from_str(r#"{"error": true}"#).unwrap();
        assert_eq!(coord_from_value(&missing, "lat", "lon"), None);
    }
}
