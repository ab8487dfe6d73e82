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

//! Alerts list panel: the per-fetch presentation state machine and the
//! floating window rendering it.

use chrono::{DateTime, Local};
use egui::{Color32, RichText};

use super::feed::{AlertCollection, AlertRecord};
use crate::map::OverlayShape;

/// Presentation state for one fetch cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlertsState {
    Loading,
    Populated(Vec<AlertRecord>),
    Empty,
    Failed,
}

pub struct AlertsPanel {
    state: AlertsState,
    last_updated: Option<DateTime<Local>>,
}

impl AlertsPanel {
    pub fn new() -> Self {
        Self {
            state: AlertsState::Loading,
            last_updated: None,
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> &AlertsState {
        &self.state
    }

    #[allow(dead_code)]
    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    /// A fetch was issued: show the loading text. The map overlay keeps the
    /// previous result until new data is ready, so there is no empty flash.
    pub fn set_loading(&mut self) {
        self.state = AlertsState::Loading;
    }

    /// Apply a fetch outcome. Returns the overlay replacement to push into
    /// the map view: a (possibly empty) shape list after any successful
    /// fetch, or `None` after a failure, which keeps the stale overlay
    /// (last-known-good).
    pub fn apply_outcome(
        &mut self,
        outcome: Result<AlertCollection, String>,
        now: DateTime<Local>,
    ) -> Option<Vec<OverlayShape>> {
        match outcome {
            Ok(collection) => {
                let records = collection.records();
                let shapes = overlay_shapes(&collection);
                self.state = if records.is_empty() {
                    AlertsState::Empty
                } else {
                    AlertsState::Populated(records)
                };
                self.last_updated = Some(now);
                Some(shapes)
            }
            Err(reason) => {
                log::warn!("Alerts fetch failed: {}", reason);
                self.state = AlertsState::Failed;
                None
            }
        }
    }

    /// Render the floating alerts window.
    pub fn render(&self, ctx: &egui::Context) {
        let screen_height = ctx.screen_rect().height();

        egui::Window::new("Active Alerts")
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-10.0, 10.0))
            .fixed_size(egui::vec2(330.0, screen_height - 200.0))
            .resizable(false)
            .collapsible(true)
            .frame(
                egui::Frame::window(&ctx.style())
                    .fill(Color32::from_rgba_unmultiplied(25, 30, 35, 230))
                    .stroke(egui::Stroke::new(1.0, Color32::from_rgb(100, 60, 60)))
                    .corner_radius(6.0),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("◈ ACTIVE ALERTS")
                            .color(Color32::from_rgb(255, 120, 120))
                            .size(14.0)
                            .strong(),
                    );
                });

                if let AlertsState::Populated(records) = &self.state {
                    ui.label(
                        RichText::new(format!("TOTAL: {}", records.len()))
                            .color(Color32::from_rgb(150, 150, 150))
                            .size(10.0)
                            .monospace(),
                    );
                }

                ui.add_space(4.0);

                match &self.state {
                    AlertsState::Loading => {
                        ui.label(
                            RichText::new("Loading alerts…")
                                .color(Color32::from_rgb(150, 150, 150)),
                        );
                    }
                    AlertsState::Empty => {
                        ui.label(
                            RichText::new("No active alerts for the current filter.")
                                .color(Color32::from_rgb(150, 150, 150)),
                        );
                    }
                    AlertsState::Failed => {
                        ui.label(
                            RichText::new("Failed to load alerts (NWS API). Try again later.")
                                .color(Color32::from_rgb(150, 150, 150)),
                        );
                    }
                    AlertsState::Populated(records) => {
                        egui::ScrollArea::vertical().show(ui, |ui| {
                            ui.push_id("alerts_list", |ui| {
                                for record in records {
                                    self.draw_record(ui, record);
                                    ui.add_space(3.0);
                                }
                            });
                        });
                    }
                }

                if let Some(stamp) = self.last_updated {
                    ui.add_space(4.0);
                    ui.label(
                        RichText::new(format!(
                            "Last updated: {}",
                            stamp.format("%-m/%-d/%y, %-I:%M %p")
                        ))
                        .color(Color32::from_rgb(120, 120, 120))
                        .size(9.0),
                    );
                }
            });
    }

    fn draw_record(&self, ui: &mut egui::Ui, record: &AlertRecord) {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.label(
                RichText::new(record.title())
                    .color(Color32::from_rgb(255, 180, 180))
                    .size(12.0)
                    .strong(),
            );
            if !record.area_desc.is_empty() {
                ui.label(
                    RichText::new(&record.area_desc)
                        .color(Color32::from_rgb(170, 170, 170))
                        .size(10.0),
                );
            }
            let badges = format!("{} • {}", record.severity, record.urgency);
            if badges != " • " {
                ui.label(
                    RichText::new(badges)
                        .color(Color32::from_rgb(150, 150, 150))
                        .size(10.0),
                );
            }
        });
    }
}

impl Default for AlertsPanel {
    fn default() -> Self {
        Self::new()
    }
}

/// Overlay shapes for the latest collection: one shape per feature that
/// carries drawable geometry; the popup shows event, area, and severity just
/// like the list entry.
pub fn overlay_shapes(collection: &AlertCollection) -> Vec<OverlayShape> {
    collection
        .features
        .iter()
        .filter_map(|feature| {
            let rings = feature.geometry.as_ref()?.rings();
            if rings.is_empty() {
                return None;
            }
            let record = AlertRecord::from(feature);
            Some(OverlayShape {
                rings,
                popup: vec![
                    record.title().to_owned(),
                    record.area_desc,
                    record.severity,
                ],
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn collection(json: &str) -> AlertCollection {
        serde_json::from_str(json).unwrap()
    }

    const TWO_POLYGONS: &str = r#"{"features": [
        {"properties": {"event": "Tornado Warning", "areaDesc": "Smith County",
          "severity": "Extreme", "urgency": "Immediate"},
         "geometry": {"type": "Polygon", "coordinates":
           [[[-98.0, 39.0], [-97.0, 39.0], [-97.5, 40.0]]]}},
        {"properties": {"event": "Flood Watch"},
         "geometry": {"type": "Polygon", "coordinates":
           [[[-90.0, 30.0], [-89.0, 30.0], [-89.5, 31.0]]]}}
    ]}"#;

    #[test]
    fn test_populated_replaces_overlay_and_stamps() {
        let mut panel = AlertsPanel::new();
        let shapes = panel.apply_outcome(Ok(collection(TWO_POLYGONS)), now());
        assert_eq!(shapes.map(|s| s.len()), Some(2));
        assert!(matches!(panel.state(), AlertsState::Populated(records) if records.len() == 2));
        assert_eq!(panel.last_updated(), Some(now()));
    }

    #[test]
    fn test_empty_result_clears_overlay_and_stamps() {
        let mut panel = AlertsPanel::new();
        let shapes = panel.apply_outcome(Ok(collection(r#"{"features": []}"#)), now());
        // An empty collection is valid data: the overlay is replaced with nothing.
        assert_eq!(shapes.map(|s| s.len()), Some(0));
        assert_eq!(panel.state(), &AlertsState::Empty);
        assert_eq!(panel.last_updated(), Some(now()));
    }

    #[test]
    fn test_failure_keeps_overlay_and_stamp() {
        let mut panel = AlertsPanel::new();
        panel.apply_outcome(Ok(collection(TWO_POLYGONS)), now());
        let before = panel.last_updated();

        panel.set_loading();
        let later = Local.with_ymd_and_hms(2025, 6, 1, 13, 0, 0).unwrap();
        let shapes = panel.apply_outcome(Err("connection reset".to_owned()), later);

        assert!(shapes.is_none());
        assert_eq!(panel.state(), &AlertsState::Failed);
        assert_eq!(panel.last_updated(), before);
    }

    #[test]
    fn test_loading_does_not_touch_overlay() {
        let mut panel = AlertsPanel::new();
        panel.set_loading();
        assert_eq!(panel.state(), &AlertsState::Loading);
    }

    #[test]
    fn test_records_render_in_feed_order() {
        let mut panel = AlertsPanel::new();
        panel.apply_outcome(Ok(collection(TWO_POLYGONS)), now());
        let AlertsState::Populated(records) = panel.state() else {
            panic!("expected populated state");
        };
        assert_eq!(records[0].event, "Tornado Warning");
        assert_eq!(records[1].event, "Flood Watch");
    }

    #[test]
    fn test_features_without_geometry_list_but_do_not_draw() {
        let json = r#"{"features": [
            {"properties": {"event": "Special Weather Statement"}, "geometry": null}
        ]}"#;
        let mut panel = AlertsPanel::new();
        let shapes = panel.apply_outcome(Ok(collection(json)), now());
        assert_eq!(shapes.map(|s| s.len()), Some(0));
        assert!(matches!(panel.state(), AlertsState::Populated(records) if records.len() == 1));
    }

    #[test]
    fn test_popup_lines_mirror_list_entry() {
        let shapes = overlay_shapes(&collection(TWO_POLYGONS));
        assert_eq!(
            shapes[0].popup,
            vec!["Tornado Warning", "Smith County", "Extreme"]
        );
        // Missing fields come through as empty lines, skipped at render time.
        assert_eq!(shapes[1].popup, vec!["Flood Watch", "", ""]);
    }
}
