// Copyright 2025 StormWatch Desktop Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! NWS active-alerts feed client.
//!
//! Fetches `api.weather.gov/alerts/active` as GeoJSON and normalizes it into
//! list records plus polygon rings for the map overlay. Missing feed fields
//! degrade to empty strings, never to errors.

use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::geo::Coordinate;
use crate::net;

const ALERTS_URL: &str = "https://api.weather.gov/alerts/active";

/// Filter for an alerts fetch. At most one dimension is applied to the
/// request; `point` wins over `area` if both are ever populated.
#[derive(Clone, Debug, Default)]
pub struct AlertQuery {
    pub point: Option<Coordinate>,
    pub area: Option<String>,
}

impl AlertQuery {
    /// No filter: all active alerts nationwide.
    pub fn nationwide() -> Self {
        Self::default()
    }

    pub fn for_point(point: Coordinate) -> Self {
        Self {
            point: Some(point),
            area: None,
        }
    }

    pub fn for_area(area: impl Into<String>) -> Self {
        Self {
            point: None,
            area: Some(area.into()),
        }
    }

    /// Request URL with exactly one filter dimension at most.
    pub fn url(&self) -> String {
        let mut url = format!(
            "{}?status=actual&message_type=alert&limit=200",
            ALERTS_URL
        );
        if let Some(point) = self.point {
            url.push_str(&format!("&point={},{}", point.lat, point.lon));
        } else if let Some(area) = &self.area {
            url.push_str(&format!("&area={}", area));
        }
        url
    }
}

/// GeoJSON feature collection as returned by the alerts endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AlertCollection {
    #[serde(default)]
    pub features: Vec<AlertFeature>,
}

impl AlertCollection {
    /// List records in feed order, one per feature.
    pub fn records(&self) -> Vec<AlertRecord> {
        self.features.iter().map(AlertRecord::from).collect()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AlertFeature {
    #[serde(default)]
    pub properties: AlertProperties,
    #[serde(default)]
    pub geometry: Option<AlertGeometry>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AlertProperties {
    pub event: Option<String>,
    #[serde(rename = "areaDesc")]
    pub area_desc: Option<String>,
    pub severity: Option<String>,
    pub urgency: Option<String>,
}

/// The subset of GeoJSON geometry the overlay can draw. Anything else is
/// carried as `Unsupported` and produces no rings.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type")]
pub enum AlertGeometry {
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    #[serde(other)]
    Unsupported,
}

impl AlertGeometry {
    /// Polygon rings as coordinate lists. Positions that are not at least
    /// `[lon, lat]` are skipped silently.
    pub fn rings(&self) -> Vec<Vec<Coordinate>> {
        match self {
            Self::Polygon { coordinates } => {
                coordinates.iter().map(|ring| ring_coords(ring)).collect()
            }
            Self::MultiPolygon { coordinates } => coordinates
                .iter()
                .flat_map(|polygon| polygon.iter().map(|ring| ring_coords(ring)))
                .collect(),
            Self::Unsupported => Vec::new(),
        }
    }
}

fn ring_coords(ring: &[Vec<f64>]) -> Vec<Coordinate> {
    ring.iter()
        .filter_map(|position| match position.as_slice() {
            [lon, lat, ..] => Some(Coordinate::new(*lat, *lon)),
            _ => None,
        })
        .collect()
}

/// One normalized alert for the list panel. Missing feed properties are
/// carried as empty strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertRecord {
    pub event: String,
    pub area_desc: String,
    pub severity: String,
    pub urgency: String,
}

impl AlertRecord {
    /// Event name for display, with the feed's placeholder fallback.
    pub fn title(&self) -> &str {
        if self.event.is_empty() {
            "Alert"
        } else {
            &self.event
        }
    }
}

impl From<&AlertFeature> for AlertRecord {
    fn from(feature: &AlertFeature) -> Self {
        let p = &feature.properties;
        Self {
            event: p.event.clone().unwrap_or_default(),
            area_desc: p.area_desc.clone().unwrap_or_default(),
            severity: p.severity.clone().unwrap_or_default(),
            urgency: p.urgency.clone().unwrap_or_default(),
        }
    }
}

/// Fetch active alerts matching `query`. Network and parse failures come back
/// as an error value for the presenter; they are never propagated as faults.
pub fn fetch_active(query: &AlertQuery) -> Result<AlertCollection, String> {
    let url = query.url();
    log::debug!("Fetching alerts: {}", url);

    let client = net::http_client().map_err(|e| e.to_string())?;
    let response = client
        .get(&url)
        .header(ACCEPT, "application/geo+json")
        .send()
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }

    response.json::<AlertCollection>().map_err(|e| e.to_string())
}
