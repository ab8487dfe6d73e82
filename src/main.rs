mod alerts;
mod conditions;
mod config;
mod gate;
mod geo;
mod location;
mod map;
mod net;

use std::sync::mpsc;

use clap::Parser;
use eframe::egui;

use alerts::{feed::AlertCollection, AlertQuery, AlertsPanel};
use conditions::{ConditionsOutcome, ConditionsPanel};
use config::AppConfig;
use gate::SubscribeGate;
use geo::Coordinate;
use location::LocationOutcome;
use map::MapView;
use net::SeqGuard;

/// Zoom applied when the view recenters on a resolved location.
const RECENTER_ZOOM: f32 = 7.0;

#[derive(Parser, Debug, Default)]
#[command(name = "stormwatch-desktop", about = "Severe-weather dashboard")]
struct Cli {
    /// Startup center latitude (overrides config)
    #[arg(long, requires = "lon")]
    lat: Option<f64>,

    /// Startup center longitude (overrides config)
    #[arg(long, requires = "lat")]
    lon: Option<f64>,

    /// Startup zoom level (overrides config)
    #[arg(long)]
    zoom: Option<f32>,

    /// Start with alerts filtered to an area code, e.g. a state abbreviation
    #[arg(long)]
    area: Option<String>,
}

fn main() -> Result<(), eframe::Error> {
    env_logger::init();
    let cli = Cli::parse();

    log::info!("Starting StormWatch Desktop...");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("StormWatch Desktop"),
        ..Default::default()
    };

    eframe::run_native(
        "StormWatch Desktop",
        options,
        Box::new(|cc| Ok(Box::new(StormWatchApp::new(&cc.egui_ctx, cli)))),
    )
}

/// What triggered a location resolution; shapes the notice wording.
#[derive(Clone, Debug)]
enum LocationRequest {
    Zip(String),
    Device,
}

/// Results arriving from worker threads.
enum AppEvent {
    Alerts {
        seq: u64,
        outcome: Result<AlertCollection, String>,
    },
    Conditions {
        seq: u64,
        outcome: ConditionsOutcome,
    },
    Location {
        request: LocationRequest,
        outcome: LocationOutcome,
    },
}

/// What a finished location resolution does to the dashboard.
#[derive(Debug, PartialEq)]
enum LocationEffect {
    /// Recenter and re-fetch both feeds for the coordinate.
    Recenter(Coordinate),
    /// Leave the view untouched and surface a one-line notice.
    Notice(String),
}

fn location_effect(request: &LocationRequest, outcome: LocationOutcome) -> LocationEffect {
    match outcome {
        LocationOutcome::Resolved(coord) => LocationEffect::Recenter(coord),
        LocationOutcome::NotFound => {
            let text = match request {
                LocationRequest::Zip(code) => format!("No match for ZIP {}.", code),
                LocationRequest::Device => "Could not determine location.".to_owned(),
            };
            LocationEffect::Notice(text)
        }
        LocationOutcome::Unsupported => LocationEffect::Notice("Location not supported.".to_owned()),
        LocationOutcome::Failed => {
            LocationEffect::Notice("Could not determine location.".to_owned())
        }
    }
}

struct StormWatchApp {
    config: AppConfig,
    map: MapView,
    alerts_panel: AlertsPanel,
    conditions_panel: ConditionsPanel,
    gate: SubscribeGate,
    alerts_guard: SeqGuard,
    conditions_guard: SeqGuard,
    events_tx: mpsc::Sender<AppEvent>,
    events_rx: mpsc::Receiver<AppEvent>,
    zip_input: String,
    notice: Option<String>,
}

impl StormWatchApp {
    fn new(ctx: &egui::Context, cli: Cli) -> Self {
        let config = AppConfig::load();

        let center = match (cli.lat, cli.lon) {
            (Some(lat), Some(lon)) => Coordinate::new(lat, lon),
            _ => Coordinate::new(config.center_lat, config.center_lon),
        };
        let zoom = cli.zoom.unwrap_or(config.default_zoom);

        let map = MapView::new(center, zoom, config.show_radar, config.radar_opacity);
        let gate = SubscribeGate::load(chrono::Utc::now().timestamp_millis());
        let (events_tx, events_rx) = mpsc::channel();

        let mut app = Self {
            config,
            map,
            alerts_panel: AlertsPanel::new(),
            conditions_panel: ConditionsPanel::new(),
            gate,
            alerts_guard: SeqGuard::default(),
            conditions_guard: SeqGuard::default(),
            events_tx,
            events_rx,
            zip_input: String::new(),
            notice: None,
        };

        // Initial load: nationwide alerts (or the CLI area filter) and
        // conditions for the startup center.
        let initial_query = match &cli.area {
            Some(area) => AlertQuery::for_area(area.clone()),
            None => AlertQuery::nationwide(),
        };
        app.refresh_alerts(initial_query, ctx);
        app.refresh_conditions(center, ctx);

        app
    }

    fn refresh_alerts(&mut self, query: AlertQuery, ctx: &egui::Context) {
        let seq = self.alerts_guard.issue();
        self.alerts_panel.set_loading();

        let tx = self.events_tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let outcome = alerts::feed::fetch_active(&query);
            let _ = tx.send(AppEvent::Alerts { seq, outcome });
            ctx.request_repaint();
        });
    }

    fn refresh_conditions(&mut self, coord: Coordinate, ctx: &egui::Context) {
        let seq = self.conditions_guard.issue();
        self.conditions_panel.set_loading(coord);

        let tx = self.events_tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let outcome = conditions::feed::fetch(coord);
            let _ = tx.send(AppEvent::Conditions { seq, outcome });
            ctx.request_repaint();
        });
    }

    fn submit_zip(&mut self, ctx: &egui::Context) {
        let code = self.zip_input.trim().to_owned();
        if code.is_empty() {
            return;
        }
        self.notice = None;

        let tx = self.events_tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let outcome = location::resolve_zip(&code);
            let _ = tx.send(AppEvent::Location {
                request: LocationRequest::Zip(code),
                outcome,
            });
            ctx.request_repaint();
        });
    }

    fn locate(&mut self, ctx: &egui::Context) {
        self.notice = None;
        let enabled = self.config.enable_ip_geolocation;

        let tx = self.events_tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            let outcome = location::device_location(enabled);
            let _ = tx.send(AppEvent::Location {
                request: LocationRequest::Device,
                outcome,
            });
            ctx.request_repaint();
        });
    }

    fn apply_event(&mut self, event: AppEvent, ctx: &egui::Context) {
        match event {
            AppEvent::Alerts { seq, outcome } => {
                if !self.alerts_guard.is_current(seq) {
                    log::debug!("Discarding superseded alerts response (seq {})", seq);
                    return;
                }
                if let Some(shapes) = self.alerts_panel.apply_outcome(outcome, chrono::Local::now())
                {
                    self.map.replace_alert_overlay(shapes);
                }
            }
            AppEvent::Conditions { seq, outcome } => {
                if !self.conditions_guard.is_current(seq) {
                    log::debug!("Discarding superseded conditions response (seq {})", seq);
                    return;
                }
                self.conditions_panel.apply_outcome(outcome);
            }
            AppEvent::Location { request, outcome } => {
                match location_effect(&request, outcome) {
                    LocationEffect::Recenter(coord) => {
                        self.map.set_view(coord, RECENTER_ZOOM);
                        self.refresh_alerts(AlertQuery::for_point(coord), ctx);
                        self.refresh_conditions(coord, ctx);
                    }
                    LocationEffect::Notice(text) => {
                        log::info!("Location resolution: {}", text);
                        self.notice = Some(text);
                    }
                }
            }
        }
    }

    fn draw_controls(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new("◈ STORMWATCH")
                        .color(egui::Color32::from_rgb(120, 190, 255))
                        .size(14.0)
                        .strong(),
                );
                ui.separator();

                ui.label("ZIP");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.zip_input)
                        .desired_width(70.0)
                        .hint_text("e.g. 00501"),
                );
                let submitted = response.lost_focus()
                    && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Go").clicked() || submitted {
                    self.submit_zip(ctx);
                }

                if ui.button("📍 Locate").clicked() {
                    self.locate(ctx);
                }

                if let Some(notice) = &self.notice {
                    ui.label(
                        egui::RichText::new(notice)
                            .color(egui::Color32::from_rgb(255, 200, 100))
                            .size(11.0),
                    );
                }
            });
        });
    }
}

impl eframe::App for StormWatchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Worker results first, so this frame draws the newest state
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event, ctx);
        }

        self.draw_controls(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.map.draw(ui);
            });

        self.alerts_panel.render(ctx);

        if let Some(coord) = self.conditions_panel.render(ctx) {
            self.refresh_conditions(coord, ctx);
        }

        self.gate.render(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::feed::ConditionsSnapshot;
    use crate::conditions::presenter::ConditionsState;
    use chrono::TimeZone;

    #[test]
    fn test_zip_resolution_recenters_at_zoom_7() {
        let effect = location_effect(
            &LocationRequest::Zip("00501".to_owned()),
            LocationOutcome::Resolved(Coordinate::new(40.8126, -73.0447)),
        );
        assert_eq!(
            effect,
            LocationEffect::Recenter(Coordinate::new(40.8126, -73.0447))
        );
        assert!((RECENTER_ZOOM - 7.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_zip_result_leaves_view_unchanged() {
        let effect = location_effect(
            &LocationRequest::Zip("00000".to_owned()),
            LocationOutcome::NotFound,
        );
        // A notice, never a recenter: the map view and feeds stay as they were.
        assert_eq!(
            effect,
            LocationEffect::Notice("No match for ZIP 00000.".to_owned())
        );
    }

    #[test]
    fn test_unsupported_location_notice() {
        let effect = location_effect(&LocationRequest::Device, LocationOutcome::Unsupported);
        assert_eq!(
            effect,
            LocationEffect::Notice("Location not supported.".to_owned())
        );
    }

    #[test]
    fn test_feed_failure_is_isolated_to_its_own_panel() {
        let mut alerts_panel = AlertsPanel::new();
        let mut conditions_panel = ConditionsPanel::new();

        let coord = Coordinate::new(39.5, -98.35);
        conditions_panel.set_loading(coord);
        conditions_panel.apply_outcome(ConditionsOutcome::Ready(ConditionsSnapshot {
            temperature_f: 68.4,
            wind_speed_mph: 5.6,
            wind_direction_deg: Some(200.0),
            observed_at: chrono::NaiveDateTime::parse_from_str(
                "2025-06-01T12:30",
                "%Y-%m-%dT%H:%M",
            )
            .unwrap(),
        }));

        let now = chrono::Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let overlay = alerts_panel.apply_outcome(Err("connection refused".to_owned()), now);

        // The alerts failure shows its error text and keeps the overlay, and
        // the conditions panel still holds its rendered snapshot.
        assert!(overlay.is_none());
        assert!(matches!(
            conditions_panel.state(),
            ConditionsState::Ready(snapshot) if (snapshot.temperature_f - 68.4).abs() < f64::EPSILON
        ));
        assert_eq!(conditions_panel.last_coord(), Some(coord));
    }
}
