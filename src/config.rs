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

//! Application configuration management.
//!
//! Persistent TOML configuration via confy: startup viewport, radar overlay
//! settings, and the IP-geolocation switch backing the Locate control.

use serde::{Deserialize, Serialize};

/// Name passed to confy; determines the platform config directory.
pub const APP_NAME: &str = "stormwatch-desktop";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Startup map center latitude
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,

    /// Startup map center longitude
    #[serde(default = "default_center_lon")]
    pub center_lon: f64,

    /// Startup map zoom level
    #[serde(default = "default_zoom")]
    pub default_zoom: f32,

    /// Show the radar tile overlay
    #[serde(default = "default_true")]
    pub show_radar: bool,

    /// Radar overlay opacity (0.0 - 1.0)
    #[serde(default = "default_radar_opacity")]
    pub radar_opacity: f32,

    /// Allow the Locate control to use IP-based geolocation providers.
    /// When false the control reports location as unsupported.
    #[serde(default = "default_true")]
    pub enable_ip_geolocation: bool,
}

// Default value functions for serde
fn default_center_lat() -> f64 {
    crate::geo::DEFAULT_CENTER.lat
}

fn default_center_lon() -> f64 {
    crate::geo::DEFAULT_CENTER.lon
}

fn default_zoom() -> f32 {
    4.0
}

fn default_radar_opacity() -> f32 {
    0.8
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            center_lat: default_center_lat(),
            center_lon: default_center_lon(),
            default_zoom: default_zoom(),
            show_radar: true,
            radar_opacity: default_radar_opacity(),
            enable_ip_geolocation: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults on any error
    pub fn load() -> Self {
        match confy::load(APP_NAME, "config") {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, "config", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_source_dashboard() {
        let config = AppConfig::default();
        assert!((config.center_lat - 39.5).abs() < f64::EPSILON);
        assert!((config.center_lon - (-98.35)).abs() < f64::EPSILON);
        assert!((config.default_zoom - 4.0).abs() < f32::EPSILON);
        assert!((config.radar_opacity - 0.8).abs() < f32::EPSILON);
        assert!(config.show_radar);
        assert!(config.enable_ip_geolocation);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"center_lat": 40.0}"#).unwrap();
        assert!((config.center_lat - 40.0).abs() < f64::EPSILON);
        assert!((config.radar_opacity - 0.8).abs() < f32::EPSILON);
        assert!(config.show_radar);
    }
}
