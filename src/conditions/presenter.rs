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

//! Current-conditions panel: metric cards, the no-data notice, and the
//! error state with its manual retry.

use egui::{Color32, RichText};

use super::feed::{ConditionsOutcome, ConditionsSnapshot};
use crate::geo::Coordinate;

/// 16-point compass rose, 22.5° per step starting at north.
const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Compass label for a wind bearing in degrees.
pub fn compass_point(degrees: f64) -> &'static str {
    let step = (degrees.rem_euclid(360.0) / 22.5).round() as usize;
    COMPASS_POINTS[step % 16]
}

/// `68.4` renders as `"68°F"`.
pub fn format_temperature(temperature_f: f64) -> String {
    format!("{}°F", temperature_f.round() as i64)
}

/// `5.6` mph at `200°` renders as `"6 mph SSW"`; no bearing, no label.
pub fn format_wind(speed_mph: f64, direction_deg: Option<f64>) -> String {
    let speed = speed_mph.round() as i64;
    match direction_deg {
        Some(deg) => format!("{} mph {}", speed, compass_point(deg)),
        None => format!("{} mph", speed),
    }
}

fn format_observed(snapshot: &ConditionsSnapshot) -> String {
    snapshot.observed_at.format("%-m/%-d/%y, %-I:%M %p").to_string()
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConditionsState {
    Loading,
    Ready(ConditionsSnapshot),
    NoData,
    Failed,
}

pub struct ConditionsPanel {
    state: ConditionsState,
    /// Coordinate captured when the last fetch was issued; Retry re-uses it
    /// verbatim instead of re-deriving the current location.
    last_coord: Option<Coordinate>,
}

impl ConditionsPanel {
    pub fn new() -> Self {
        Self {
            state: ConditionsState::Loading,
            last_coord: None,
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> &ConditionsState {
        &self.state
    }

    #[allow(dead_code)]
    pub fn last_coord(&self) -> Option<Coordinate> {
        self.last_coord
    }

    /// A fetch was issued for `coord`: show the loading text and capture the
    /// coordinate for a later retry.
    pub fn set_loading(&mut self, coord: Coordinate) {
        self.state = ConditionsState::Loading;
        self.last_coord = Some(coord);
    }

    pub fn apply_outcome(&mut self, outcome: ConditionsOutcome) {
        self.state = match outcome {
            ConditionsOutcome::Ready(snapshot) => ConditionsState::Ready(snapshot),
            ConditionsOutcome::NoData => ConditionsState::NoData,
            ConditionsOutcome::Failed(reason) => {
                log::warn!("Conditions fetch failed: {}", reason);
                ConditionsState::Failed
            }
        };
    }

    /// Render the floating conditions window. Returns the coordinate to
    /// re-fetch when the user activates Retry.
    pub fn render(&self, ctx: &egui::Context) -> Option<Coordinate> {
        let mut retry = None;

        egui::Window::new("Current Conditions")
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-10.0, -10.0))
            .fixed_size(egui::vec2(330.0, 120.0))
            .resizable(false)
            .collapsible(true)
            .frame(
                egui::Frame::window(&ctx.style())
                    .fill(Color32::from_rgba_unmultiplied(25, 30, 35, 230))
                    .stroke(egui::Stroke::new(1.0, Color32::from_rgb(60, 80, 100)))
                    .corner_radius(6.0),
            )
            .show(ctx, |ui| {
                ui.label(
                    RichText::new("◈ CURRENT CONDITIONS")
                        .color(Color32::from_rgb(100, 180, 220))
                        .size(14.0)
                        .strong(),
                );
                ui.add_space(4.0);

                match &self.state {
                    ConditionsState::Loading => {
                        ui.label(
                            RichText::new("Loading current weather…")
                                .color(Color32::from_rgb(150, 150, 150)),
                        );
                    }
                    ConditionsState::NoData => {
                        ui.label(
                            RichText::new("No current weather available for this location.")
                                .color(Color32::from_rgb(150, 150, 150)),
                        );
                    }
                    ConditionsState::Failed => {
                        ui.horizontal(|ui| {
                            ui.label(
                                RichText::new("⚠ Unable to load current conditions.")
                                    .color(Color32::from_rgb(255, 180, 100)),
                            );
                            if ui.button("Retry").clicked() {
                                retry = self.last_coord;
                            }
                        });
                    }
                    ConditionsState::Ready(snapshot) => {
                        ui.horizontal(|ui| {
                            metric_card(ui, "TEMPERATURE", &format_temperature(snapshot.temperature_f));
                            metric_card(
                                ui,
                                "WIND",
                                &format_wind(snapshot.wind_speed_mph, snapshot.wind_direction_deg),
                            );
                            metric_card(ui, "OBSERVED", &format_observed(snapshot));
                        });
                    }
                }
            });

        retry
    }
}

impl Default for ConditionsPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn metric_card(ui: &mut egui::Ui, title: &str, value: &str) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.vertical(|ui| {
            ui.label(
                RichText::new(title)
                    .color(Color32::from_rgb(150, 150, 150))
                    .size(9.0)
                    .monospace(),
            );
            ui.label(
                RichText::new(value)
                    .color(Color32::from_rgb(220, 230, 240))
                    .size(13.0)
                    .strong(),
            );
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn snapshot() -> ConditionsSnapshot {
        ConditionsSnapshot {
            temperature_f: 68.4,
            wind_speed_mph: 5.6,
            wind_direction_deg: Some(200.0),
            observed_at: NaiveDateTime::parse_from_str("2025-06-01T12:30", "%Y-%m-%dT%H:%M")
                .unwrap(),
        }
    }

    #[test]
    fn test_compass_cardinal_points() {
        assert_eq!(compass_point(0.0), "N");
        assert_eq!(compass_point(90.0), "E");
        assert_eq!(compass_point(180.0), "S");
        assert_eq!(compass_point(270.0), "W");
    }

    #[test]
    fn test_compass_half_steps() {
        assert_eq!(compass_point(22.5), "NNE");
        assert_eq!(compass_point(200.0), "SSW");
    }

    #[test]
    fn test_compass_wraps_at_360() {
        assert_eq!(compass_point(360.0), "N");
        assert_eq!(compass_point(353.0), "N");
        assert_eq!(compass_point(348.0), "NNW");
    }

    #[test]
    fn test_temperature_rounds_to_whole_degree() {
        assert_eq!(format_temperature(68.4), "68°F");
        assert_eq!(format_temperature(68.5), "69°F");
        assert_eq!(format_temperature(-0.2), "0°F");
    }

    #[test]
    fn test_wind_with_direction() {
        assert_eq!(format_wind(5.6, Some(200.0)), "6 mph SSW");
    }

    #[test]
    fn test_wind_without_direction_omits_label() {
        assert_eq!(format_wind(5.6, None), "6 mph");
    }

    #[test]
    fn test_retry_coordinate_captured_at_fetch_time() {
        let mut panel = ConditionsPanel::new();
        let issued = Coordinate::new(40.8, -73.0);
        panel.set_loading(issued);
        panel.apply_outcome(ConditionsOutcome::Failed("timeout".to_owned()));
        // The captured coordinate survives the failure for the Retry control.
        assert_eq!(panel.last_coord(), Some(issued));
        assert_eq!(panel.state(), &ConditionsState::Failed);
    }

    #[test]
    fn test_outcomes_map_to_states() {
        let mut panel = ConditionsPanel::new();
        panel.apply_outcome(ConditionsOutcome::Ready(snapshot()));
        assert!(matches!(panel.state(), ConditionsState::Ready(_)));
        panel.apply_outcome(ConditionsOutcome::NoData);
        assert_eq!(panel.state(), &ConditionsState::NoData);
    }
}
