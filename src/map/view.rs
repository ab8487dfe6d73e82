use egui::{Color32, FontId, Stroke};

use super::layer::{TileLayer, TILE_SIZE};
use super::sources::{OpenStreetMapSource, RainViewerSource, TileCoord};
use crate::geo::{Coordinate, WebMercator};

const MIN_ZOOM: f32 = 2.0;
const OVERLAY_STROKE: Color32 = Color32::from_rgb(0xff, 0x4d, 0x4f);

/// One drawable overlay shape: polygon rings plus the popup lines revealed
/// when the shape is clicked (first line is rendered as the title).
#[derive(Clone, Debug)]
pub struct OverlayShape {
    pub rings: Vec<Vec<Coordinate>>,
    pub popup: Vec<String>,
}

impl OverlayShape {
    /// Whether the point lies inside any of the shape's rings (ray casting).
    fn contains(&self, point: Coordinate) -> bool {
        self.rings.iter().any(|ring| ring_contains(ring, point))
    }
}

fn ring_contains(ring: &[Coordinate], point: Coordinate) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.lat > point.lat) != (b.lat > point.lat) {
            let x = (b.lon - a.lon) * (point.lat - a.lat) / (b.lat - a.lat) + a.lon;
            if point.lon < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// The map viewport: two always-on tile layers (base + radar) and the
/// replaceable alert overlay. Owns pan/zoom state and popup selection.
pub struct MapView {
    base: TileLayer,
    radar: Option<TileLayer>,
    center: Coordinate,
    zoom: f32,
    shapes: Vec<OverlayShape>,
    selected: Option<(usize, egui::Pos2)>,
}

impl MapView {
    pub fn new(center: Coordinate, zoom: f32, show_radar: bool, radar_opacity: f32) -> Self {
        let base = TileLayer::new(Box::new(OpenStreetMapSource));
        let radar = show_radar
            .then(|| TileLayer::with_opacity(Box::new(RainViewerSource), radar_opacity));

        let zoom = zoom.clamp(MIN_ZOOM, f32::from(base.max_zoom()));
        Self {
            base,
            radar,
            center,
            zoom,
            shapes: Vec::new(),
            selected: None,
        }
    }

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.clamp(MIN_ZOOM, f32::from(self.base.max_zoom()))
    }

    /// Recenter the viewport synchronously.
    pub fn set_view(&mut self, center: Coordinate, zoom: f32) {
        self.center = center;
        self.zoom = self.clamp_zoom(zoom);
    }

    /// Replace the whole alert overlay. The previous shapes are dropped and
    /// the popup selection reset in the same call, so no intermediate state
    /// is ever drawn.
    pub fn replace_alert_overlay(&mut self, shapes: Vec<OverlayShape>) {
        self.shapes = shapes;
        self.selected = None;
    }

    /// Draw the map into the available space and handle pan/zoom/click input.
    pub fn draw(&mut self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(
            egui::vec2(ui.available_width(), ui.available_height()),
            egui::Sense::click_and_drag(),
        );

        let rect = response.rect;
        let screen_center = rect.center();

        painter.rect_filled(rect, 0.0, Color32::from_rgb(200, 220, 240));

        // Pinch / ctrl-scroll zoom
        if response.hovered() {
            let zoom_delta = ui.ctx().input(|i| i.zoom_delta());
            if (zoom_delta - 1.0).abs() > 0.001 {
                self.zoom = self.clamp_zoom(self.zoom + zoom_delta.log2());
            }
        }

        let tile_zoom = self.zoom.round() as u8;

        // Drag pans in tile space, which keeps Mercator distortion correct
        if response.dragged() {
            let delta = response.drag_delta();
            let mut x = WebMercator::lon_to_x(self.center.lon, tile_zoom);
            let mut y = WebMercator::lat_to_y(self.center.lat, tile_zoom);
            x -= f64::from(delta.x) / f64::from(TILE_SIZE);
            y -= f64::from(delta.y) / f64::from(TILE_SIZE);
            self.center.lon = WebMercator::tile_to_lon(x, tile_zoom);
            self.center.lat = WebMercator::tile_to_lat(y, tile_zoom).clamp(-85.0, 85.0);
        }

        // Tile layers, base first, radar tinted above it
        let ctx = ui.ctx().clone();
        let visible = visible_tiles(self.center, tile_zoom, rect.width(), rect.height());
        for (tile_coord, offset_x, offset_y) in &visible {
            let tile_rect = egui::Rect::from_min_size(
                egui::pos2(screen_center.x + offset_x, screen_center.y + offset_y),
                egui::vec2(TILE_SIZE as f32, TILE_SIZE as f32),
            );
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

            if let Some(texture) = self.base.get_tile(*tile_coord, &ctx) {
                painter.image(texture.id(), tile_rect, uv, self.base.tint());
            }
            if let Some(radar) = &self.radar {
                if let Some(texture) = radar.get_tile(*tile_coord, &ctx) {
                    painter.image(texture.id(), tile_rect, uv, radar.tint());
                }
            }
        }

        let to_screen = |coord: Coordinate| -> egui::Pos2 {
            let dx = WebMercator::lon_to_x(coord.lon, tile_zoom)
                - WebMercator::lon_to_x(self.center.lon, tile_zoom);
            let dy = WebMercator::lat_to_y(coord.lat, tile_zoom)
                - WebMercator::lat_to_y(self.center.lat, tile_zoom);
            egui::pos2(
                screen_center.x + (dx * f64::from(TILE_SIZE)) as f32,
                screen_center.y + (dy * f64::from(TILE_SIZE)) as f32,
            )
        };

        // Alert overlay shapes
        for shape in &self.shapes {
            for ring in &shape.rings {
                let points: Vec<egui::Pos2> = ring.iter().map(|c| to_screen(*c)).collect();
                if points.len() >= 2 {
                    painter.add(egui::Shape::closed_line(
                        points,
                        Stroke::new(2.0, OVERLAY_STROKE),
                    ));
                }
            }
        }

        // Click selects the topmost shape under the pointer, or dismisses
        if response.clicked() {
            if let Some(click_pos) = response.interact_pointer_pos() {
                let x = WebMercator::lon_to_x(self.center.lon, tile_zoom)
                    + f64::from(click_pos.x - screen_center.x) / f64::from(TILE_SIZE);
                let y = WebMercator::lat_to_y(self.center.lat, tile_zoom)
                    + f64::from(click_pos.y - screen_center.y) / f64::from(TILE_SIZE);
                let clicked = Coordinate::new(
                    WebMercator::tile_to_lat(y, tile_zoom),
                    WebMercator::tile_to_lon(x, tile_zoom),
                );

                self.selected = self
                    .shapes
                    .iter()
                    .rposition(|shape| shape.contains(clicked))
                    .map(|idx| (idx, click_pos));
            }
        }

        self.draw_popup(ui);

        // Attribution (required by OSM and RainViewer)
        let attribution = match &self.radar {
            Some(radar) => format!("{} | {}", self.base.attribution(), radar.attribution()),
            None => self.base.attribution().to_owned(),
        };
        painter.text(
            rect.right_bottom() + egui::vec2(-10.0, -10.0),
            egui::Align2::RIGHT_BOTTOM,
            attribution,
            FontId::proportional(10.0),
            Color32::from_black_alpha(180),
        );

        // Tile engine status bubble at the top
        let error_count = self.base.error_count()
            + self.radar.as_ref().map_or(0, TileLayer::error_count);
        let loading = self.base.has_loading_tiles()
            || self.radar.as_ref().is_some_and(TileLayer::has_loading_tiles);
        let banner = if error_count > 0 {
            Some((format!("Failed to load {} tiles", error_count), true))
        } else if loading {
            Some(("Loading map tiles...".to_owned(), false))
        } else {
            None
        };

        if let Some((message, is_error)) = banner {
            let bg_color = if is_error {
                Color32::from_rgb(220, 50, 50)
            } else {
                Color32::from_rgb(255, 200, 100)
            };

            let banner_pos = rect.center_top() + egui::vec2(0.0, 20.0);
            let galley = painter.layout_no_wrap(
                message.clone(),
                FontId::proportional(12.0),
                Color32::WHITE,
            );
            let padding = egui::vec2(12.0, 6.0);
            let bubble_rect =
                egui::Rect::from_center_size(banner_pos, galley.size() + padding * 2.0);

            painter.rect_filled(bubble_rect, 5.0, bg_color);
            painter.text(
                banner_pos,
                egui::Align2::CENTER_CENTER,
                message,
                FontId::proportional(12.0),
                Color32::WHITE,
            );
        }
    }

    fn draw_popup(&mut self, ui: &egui::Ui) {
        let Some((idx, pos)) = self.selected else {
            return;
        };
        let Some(shape) = self.shapes.get(idx) else {
            self.selected = None;
            return;
        };

        egui::Window::new("alert_popup")
            .title_bar(false)
            .resizable(false)
            .collapsible(false)
            .fixed_pos(pos + egui::vec2(12.0, -12.0))
            .frame(
                egui::Frame::window(&ui.ctx().style())
                    .fill(Color32::from_rgba_unmultiplied(25, 30, 35, 235))
                    .stroke(Stroke::new(1.0, OVERLAY_STROKE))
                    .corner_radius(6.0),
            )
            .show(ui.ctx(), |ui| {
                for (i, line) in shape.popup.iter().enumerate() {
                    if line.is_empty() {
                        continue;
                    }
                    if i == 0 {
                        ui.label(
                            egui::RichText::new(line)
                                .color(Color32::from_rgb(255, 200, 200))
                                .strong(),
                        );
                    } else {
                        ui.label(
                            egui::RichText::new(line)
                                .color(Color32::from_rgb(190, 190, 190))
                                .size(11.0),
                        );
                    }
                }
            });
    }
}

/// All tiles needed to cover a viewport centered on `center` at `zoom`,
/// with each tile's pixel offset from the viewport center.
fn visible_tiles(
    center: Coordinate,
    zoom: u8,
    viewport_width: f32,
    viewport_height: f32,
) -> Vec<(TileCoord, f32, f32)> {
    let mut tiles = Vec::new();

    let center_tile_x = WebMercator::lon_to_x(center.lon, zoom);
    let center_tile_y = WebMercator::lat_to_y(center.lat, zoom);

    let tiles_wide = (viewport_width / TILE_SIZE as f32).ceil() as i32 + 2;
    let tiles_high = (viewport_height / TILE_SIZE as f32).ceil() as i32 + 2;

    let start_x = center_tile_x.floor() as i32 - tiles_wide / 2;
    let start_y = center_tile_y.floor() as i32 - tiles_high / 2;

    let max_tile = 2_i32.pow(u32::from(zoom));

    for dy in 0..tiles_high {
        for dx in 0..tiles_wide {
            let tile_x = start_x + dx;
            let tile_y = start_y + dy;

            // Longitude wraps, latitude does not
            let wrapped_x = ((tile_x % max_tile) + max_tile) % max_tile;

            if tile_y >= 0 && tile_y < max_tile {
                let coord = TileCoord::new(wrapped_x as u32, tile_y as u32, zoom);

                let offset_x = (f64::from(tile_x) - center_tile_x) * f64::from(TILE_SIZE);
                let offset_y = (f64::from(tile_y) - center_tile_y) * f64::from(TILE_SIZE);

                tiles.push((coord, offset_x as f32, offset_y as f32));
            }
        }
    }

    tiles
}
