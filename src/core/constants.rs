//! Engine-wide constants. Keeping them in a single place makes it easier to
//! tweak the magic numbers that leak into assigned colors and paint styles.

/// Starting value of the color cursor.
///
/// Changing this (or [`COLOR_STRIDE`]) changes every color the engine assigns.
pub const COLOR_SEED: u32 = 12_000;

/// Amount the color cursor advances on every allocation.
pub const COLOR_STRIDE: u32 = 24_213;

/// Size of the 24-bit RGB color space the cursor wraps into (2^24).
pub const COLOR_SPACE: u32 = 16_777_216;

/// Radius in pixels of point-marker layers.
pub const CIRCLE_RADIUS: f64 = 5.0;

/// Width in pixels of line layers.
pub const LINE_WIDTH: f64 = 2.0;

/// Opacity of fill layers. Fixed, never computed.
pub const FILL_OPACITY: f64 = 0.25;

/// Color a feature is painted with while its hover flag is set.
pub const HIGHLIGHT_COLOR: &str = "#ff0000";

/// Feature-state key the paint expressions branch on.
pub const HOVER_STATE_KEY: &str = "hover";

/// Default map center, Virginia Beach (lat, lng).
pub const DEFAULT_CENTER: (f64, f64) = (36.745131, -76.045441);

/// Default zoom level, also the recenter target.
pub const DEFAULT_ZOOM: f64 = 10.0;

/// Base map style loaded by the surface.
pub const DEFAULT_STYLE_URL: &str = "mapbox://styles/mapbox/light-v11";

/// Environment variables consulted for the map provider access token, in order.
pub const ACCESS_TOKEN_ENV_VARS: [&str; 2] = ["GEOLAYERS_ACCESS_TOKEN", "MAPBOX_ACCESS_TOKEN"];

/// User-Agent sent with GeoJSON requests.
pub const USER_AGENT: &str = "geolayers/0.1";
