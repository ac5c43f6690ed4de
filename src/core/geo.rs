use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Pixel size of the whole world at zoom 0
pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of Web Mercator
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat >= -90.0 && self.lat <= 90.0 && self.lng >= -180.0 && self.lng <= 180.0
    }

    /// GeoJSON order: `[lng, lat]`
    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl From<LatLng> for geo_types::Point<f64> {
    fn from(value: LatLng) -> Self {
        geo_types::Point::new(value.lng, value.lat)
    }
}

/// Web Mercator (EPSG:3857) world pixel coordinates of `lat_lng` at `zoom`.
pub fn project(lat_lng: LatLng, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let lat = lat_lng.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    let x = (lat_lng.lng + 180.0) / 360.0 * scale;
    let y = (1.0 - (PI / 4.0 + lat / 2.0).tan().ln() / PI) / 2.0 * scale;
    (x, y)
}

/// Inverse of [`project`]
pub fn unproject(x: f64, y: f64, zoom: f64) -> LatLng {
    let scale = TILE_SIZE * 2f64.powf(zoom);

    let lng = x / scale * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * y / scale);
    let lat = n.sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

/// Degrees covered by one screen pixel around `lat_lng`; used to turn a
/// pixel hit tolerance into the degree tolerance hit-testing expects.
pub fn degrees_per_pixel(lat_lng: LatLng, zoom: f64) -> f64 {
    let (x, y) = project(lat_lng, zoom);
    let east = unproject(x + 1.0, y, zoom);
    let south = unproject(x, y + 1.0, zoom);
    (east.lng - lat_lng.lng).abs().max((south.lat - lat_lng.lat).abs())
}
