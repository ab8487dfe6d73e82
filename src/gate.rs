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

//! Subscription prompt gate: shown at most once per day, keyed on a single
//! persisted dismissal timestamp.

use egui::{Color32, RichText};
use serde::{Deserialize, Serialize};

use crate::config::APP_NAME;

/// Minimum time between prompts.
const DISMISS_INTERVAL_MS: i64 = 24 * 60 * 60 * 1000;

const SUBSCRIBE_URL: &str = "https://stormwatch.io/subscribe";

/// The persisted half of the gate: a single millisecond timestamp.
/// A missing or unreadable value counts as "never dismissed".
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct GateState {
    pub last_dismissed_at_ms: Option<i64>,
}

/// Whether the prompt is due, as a pure function of stored state and clock.
pub fn should_show(state: GateState, now_ms: i64) -> bool {
    match state.last_dismissed_at_ms {
        Some(dismissed_at) => now_ms - dismissed_at >= DISMISS_INTERVAL_MS,
        None => true,
    }
}

/// The subscription modal, evaluated once at startup.
pub struct SubscribeGate {
    state: GateState,
    visible: bool,
}

impl SubscribeGate {
    /// Load persisted state and decide visibility for this run. Read
    /// failures degrade to the default state, which always shows the gate.
    pub fn load(now_ms: i64) -> Self {
        let state: GateState = match confy::load(APP_NAME, "gate") {
            Ok(state) => state,
            Err(e) => {
                log::warn!("Failed to read gate state: {}", e);
                GateState::default()
            }
        };
        Self {
            visible: should_show(state, now_ms),
            state,
        }
    }

    /// Hide the modal for this run and persist the dismissal time.
    /// Persistence failures are swallowed: the in-memory hide still holds,
    /// it is just not remembered for the next run.
    pub fn dismiss(&mut self, now_ms: i64) {
        self.visible = false;
        self.state.last_dismissed_at_ms = Some(now_ms);
        if let Err(e) = confy::store(APP_NAME, "gate", self.state) {
            log::warn!("Failed to persist gate dismissal: {}", e);
        }
    }

    /// Render the centered modal while visible.
    pub fn render(&mut self, ctx: &egui::Context) {
        if !self.visible {
            return;
        }

        egui::Window::new("subscribe_gate")
            .title_bar(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .fixed_size(egui::vec2(340.0, 130.0))
            .resizable(false)
            .collapsible(false)
            .frame(
                egui::Frame::window(&ctx.style())
                    .fill(Color32::from_rgba_unmultiplied(25, 30, 35, 245))
                    .stroke(egui::Stroke::new(1.0, Color32::from_rgb(80, 110, 140)))
                    .corner_radius(6.0),
            )
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(
                        RichText::new("Stay ahead of the storm")
                            .color(Color32::from_rgb(220, 230, 240))
                            .size(16.0)
                            .strong(),
                    );
                    ui.add_space(4.0);
                    ui.label(
                        RichText::new("Get severe weather updates for your area in your inbox.")
                            .color(Color32::from_rgb(170, 170, 170))
                            .size(11.0),
                    );
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        ui.add_space(40.0);
                        if ui.button("Subscribe").clicked() {
                            if let Err(e) = webbrowser::open(SUBSCRIBE_URL) {
                                log::warn!("Failed to open subscription page: {}", e);
                            }
                            self.dismiss(chrono::Utc::now().timestamp_millis());
                        }
                        if ui.button("Continue to dashboard").clicked() {
                            self.dismiss(chrono::Utc::now().timestamp_millis());
                        }
                    });
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_750_000_000_000;

    #[test]
    fn test_missing_value_always_shows() {
        assert!(should_show(GateState::default(), NOW));
    }

    #[test]
    fn test_dismiss_round_trip() {
        let mut gate = SubscribeGate {
            state: GateState::default(),
            visible: true,
        };
        gate.state.last_dismissed_at_ms = Some(NOW);
        gate.visible = false;

        // Immediately after dismissal the gate stays hidden.
        assert!(!should_show(gate.state, NOW));
        assert!(!should_show(gate.state, NOW + DISMISS_INTERVAL_MS - 1));

        // Once a full day has elapsed it is due again.
        assert!(should_show(gate.state, NOW + DISMISS_INTERVAL_MS));
    }

    #[test]
    fn test_future_timestamp_keeps_gate_hidden() {
        let state = GateState {
            last_dismissed_at_ms: Some(NOW + 10_000),
        };
        assert!(!should_show(state, NOW));
    }
}
