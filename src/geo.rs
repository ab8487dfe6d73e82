/// A WGS-84 point. Produced by the startup default, ZIP resolution, or
/// device location; consumed by the map view and both feeds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Geographic center of the contiguous US, the view before any search.
pub const DEFAULT_CENTER: Coordinate = Coordinate {
    lat: 39.5,
    lon: -98.35,
};

/// Web Mercator projection utilities
pub struct WebMercator;

impl WebMercator {
    /// Convert latitude to a fractional tile Y coordinate at `zoom`
    pub fn lat_to_y(lat: f64, zoom: u8) -> f64 {
        let lat_rad = lat.to_radians();
        let n = 2_f64.powi(zoom as i32);
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0;
        y * n
    }

    /// Convert longitude to a fractional tile X coordinate at `zoom`
    pub fn lon_to_x(lon: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(zoom as i32);
        ((lon + 180.0) / 360.0) * n
    }

    /// Convert a tile Y coordinate back to latitude
    pub fn tile_to_lat(y: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(zoom as i32);
        let lat_rad = ((std::f64::consts::PI * (1.0 - 2.0 * y / n)).sinh()).atan();
        lat_rad.to_degrees()
    }

    /// Convert a tile X coordinate back to longitude
    pub fn tile_to_lon(x: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(zoom as i32);
        x / n * 360.0 - 180.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_inverts() {
        let lat = 39.5;
        let lon = -98.35;
        let y = WebMercator::lat_to_y(lat, 7);
        let x = WebMercator::lon_to_x(lon, 7);
        assert!((WebMercator::tile_to_lat(y, 7) - lat).abs() < 1e-9);
        assert!((WebMercator::tile_to_lon(x, 7) - lon).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_zero_world_extents() {
        assert!((WebMercator::lon_to_x(-180.0, 0) - 0.0).abs() < 1e-9);
        assert!((WebMercator::lon_to_x(180.0, 0) - 1.0).abs() < 1e-9);
        assert!(WebMercator::lat_to_y(85.05, 0) < 0.001);
        assert!(WebMercator::lat_to_y(-85.05, 0) > 0.999);
    }
}
