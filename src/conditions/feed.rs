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

//! Open-Meteo current-conditions client.
//!
//! Units are fixed at the source: Fahrenheit, mph, inches, auto timezone.
//! A well-formed response without a `current_weather` payload is reported as
//! `NoData`, distinct from a fetch failure.

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::geo::Coordinate;
use crate::net;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Latest observed conditions for one coordinate. Replaced wholesale per
/// fetch; no history is kept.
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionsSnapshot {
    pub temperature_f: f64,
    pub wind_speed_mph: f64,
    pub wind_direction_deg: Option<f64>,
    /// Local time at the observed location (the feed resolves the timezone).
    pub observed_at: NaiveDateTime,
}

/// Outcome of one conditions fetch.
#[derive(Clone, Debug, PartialEq)]
pub enum ConditionsOutcome {
    Ready(ConditionsSnapshot),
    NoData,
    Failed(String),
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<CurrentWeatherWire>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherWire {
    temperature: f64,
    windspeed: f64,
    #[serde(default)]
    winddirection: Option<f64>,
    time: String,
}

pub fn request_url(coord: Coordinate) -> String {
    format!(
        "{}?latitude={}&longitude={}&current_weather=true\
         &temperature_unit=fahrenheit&windspeed_unit=mph&precipitation_unit=inch\
         &timezone=auto",
        FORECAST_URL, coord.lat, coord.lon
    )
}

/// Fetch current conditions for `coord`.
pub fn fetch(coord: Coordinate) -> ConditionsOutcome {
    let url = request_url(coord);
    log::debug!("Fetching conditions: {}", url);

    let client = match net::http_client() {
        Ok(client) => client,
        Err(e) => return ConditionsOutcome::Failed(e.to_string()),
    };

    let response = match client.get(&url).send() {
        Ok(response) => response,
        Err(e) => return ConditionsOutcome::Failed(e.to_string()),
    };
    if !response.status().is_success() {
        return ConditionsOutcome::Failed(format!("HTTP {}", response.status()));
    }

    match response.text() {
        Ok(body) => outcome_from_body(&body),
        Err(e) => ConditionsOutcome::Failed(e.to_string()),
    }
}

fn outcome_from_body(body: &str) -> ConditionsOutcome {
    let parsed: ForecastResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => return ConditionsOutcome::Failed(e.to_string()),
    };

    let Some(wire) = parsed.current_weather else {
        return ConditionsOutcome::NoData;
    };

    match parse_observation_time(&wire.time) {
        Ok(observed_at) => ConditionsOutcome::Ready(ConditionsSnapshot {
            temperature_f: wire.temperature,
            wind_speed_mph: wire.windspeed,
            wind_direction_deg: wire.winddirection,
            observed_at,
        }),
        Err(e) => ConditionsOutcome::Failed(format!("bad observation time: {}", e)),
    }
}

/// Open-Meteo emits ISO-8601 local time at minute precision.
fn parse_observation_time(raw: &str) -> chrono::ParseResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_fixed_units() {
        let url = request_url(Coordinate::new(39.5, -98.35));
        assert!(url.contains("latitude=39.5"));
        assert!(url.contains("longitude=-98.35"));
        assert!(url.contains("current_weather=true"));
        assert!(url.contains("temperature_unit=fahrenheit"));
        assert!(url.contains("windspeed_unit=mph"));
        assert!(url.contains("precipitation_unit=inch"));
        assert!(url.contains("timezone=auto"));
    }

    #[test]
    fn test_full_payload_is_ready() {
        let body = r#"{"current_weather": {
            "temperature": 68.4, "windspeed": 5.6,
            "winddirection": 200.0, "time": "2025-06-01T12:30"}}"#;
        let ConditionsOutcome::Ready(snapshot) = outcome_from_body(body) else {
            panic!("expected ready outcome");
        };
        assert!((snapshot.temperature_f - 68.4).abs() < f64::EPSILON);
        assert!((snapshot.wind_speed_mph - 5.6).abs() < f64::EPSILON);
        assert_eq!(snapshot.wind_direction_deg, Some(200.0));
        assert_eq!(
            snapshot.observed_at,
            NaiveDateTime::parse_from_str("2025-06-01T12:30", "%Y-%m-%dT%H:%M").unwrap()
        );
    }

    #[test]
    fn test_missing_direction_is_none() {
        let body = r#"{"current_weather": {
            "temperature": 50.0, "windspeed": 3.0, "time": "2025-06-01T12:30"}}"#;
        let ConditionsOutcome::Ready(snapshot) = outcome_from_body(body) else {
            panic!("expected ready outcome");
        };
        assert_eq!(snapshot.wind_direction_deg, None);
    }

    #[test]
    fn test_missing_payload_is_no_data() {
        assert_eq!(
            outcome_from_body(r#"{"latitude": 39.5, "longitude": -98.35}"#),
            ConditionsOutcome::NoData
        );
    }

    #[test]
    fn test_garbage_body_is_failure() {
        assert!(matches!(
            outcome_from_body("<html>rate limited</html>"),
            ConditionsOutcome::Failed(_)
        ));
    }
}
