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

//! Slippy tile sources for the base map and the radar overlay.

/// A single tile address in the slippy map scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }
}

/// A provider of map tiles, addressed by URL.
pub trait TileSource {
    /// URL for one tile.
    fn tile_url(&self, coord: TileCoord) -> String;

    /// Attribution line rendered on the map.
    fn attribution(&self) -> &'static str;

    /// Short name; also the on-disk cache subdirectory for this source.
    fn name(&self) -> &'static str;

    /// Highest zoom level this source serves.
    fn max_zoom(&self) -> u8 {
        19
    }
}

/// OpenStreetMap standard base layer.
/// Uses subdomain load balancing across a-c.tile.openstreetmap.org.
#[derive(Debug)]
pub struct OpenStreetMapSource;

impl TileSource for OpenStreetMapSource {
    fn tile_url(&self, coord: TileCoord) -> String {
        // Subdomain load balancing (a, b, c) based on tile coordinates
        let subdomain = ['a', 'b', 'c'][((coord.x + coord.y) % 3) as usize];

        format!(
            "https://{}.tile.openstreetmap.org/{}/{}/{}.png",
            subdomain, coord.zoom, coord.x, coord.y
        )
    }

    fn attribution(&self) -> &'static str {
        "© OpenStreetMap contributors"
    }

    fn name(&self) -> &'static str {
        "osm"
    }

    fn max_zoom(&self) -> u8 {
        10
    }
}

/// RainViewer composite radar overlay, stacked above the base layer.
#[derive(Debug)]
pub struct RainViewerSource;

impl TileSource for RainViewerSource {
    fn tile_url(&self, coord: TileCoord) -> String {
        format!(
            "https://tilecache.rainviewer.com/v2/radar/{}/{}/{}/2/1_1.png",
            coord.zoom, coord.x, coord.y
        )
    }

    fn attribution(&self) -> &'static str {
        "Radar © RainViewer"
    }

    fn name(&self) -> &'static str {
        "rainviewer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osm_url_balances_subdomains() {
        let a = OpenStreetMapSource.tile_url(TileCoord::new(0, 0, 4));
        let b = OpenStreetMapSource.tile_url(TileCoord::new(1, 0, 4));
        assert_eq!(a, "https://a.tile.openstreetmap.org/4/0/0.png");
        assert_eq!(b, "https://b.tile.openstreetmap.org/4/1/0.png");
    }

    #[test]
    fn test_base_layer_zoom_cap() {
        assert_eq!(OpenStreetMapSource.max_zoom(), 10);
    }

    #[test]
    fn test_rainviewer_url_shape() {
        let url = RainViewerSource.tile_url(TileCoord::new(3, 5, 7));
        assert_eq!(
            url,
            "https://tilecache.rainviewer.com/v2/radar/7/3/5/2/1_1.png"
        );
    }
}
