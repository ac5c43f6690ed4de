//! # geolayers
//!
//! Synchronizes remote GeoJSON data sources with the layers of a map surface.
//!
//! Each configured source is fetched, split into one render layer per geometry
//! kind, colored from a deterministic allocator and registered in a toggle
//! registry that is the only writer of layer visibility. A hover controller
//! keeps at most one highlighted feature per layer, and a readiness gate holds
//! the UI in a loading state until every expected layer is on the map.

pub mod core;
pub mod data;
pub mod engine;
pub mod interaction;
pub mod layers;
pub mod prelude;
pub mod readiness;
pub mod spatial;
pub mod style;
pub mod surface;
#[cfg(feature = "egui")]
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{DataSourceSpec, EngineConfig, PaintConfig, SourceData, ViewConfig},
    geo::LatLng,
};

pub use data::{
    fetch::{GeoJsonFetcher, HttpFetcher},
    geojson::{Feature, FeatureCollection, FeatureId, Geometry, GeometryKind},
};

pub use engine::{LayerEngine, SidebarRow, SourceStatus};

pub use interaction::hover::{HoverController, Inspection};

pub use layers::{
    descriptor::{GeometryFilter, LayerDescriptor, RenderType},
    deriver::derive_layers,
    registry::{ToggleEntry, ToggleRegistry},
};

pub use readiness::{Readiness, ReadinessGate};

pub use style::{
    color::{ColorAllocator, HexColor},
    paint::{ColorExpression, PaintStyle},
};

pub use surface::{
    memory::MemorySurface, CursorStyle, FeatureRef, FeatureState, MapEvent, MapSurface,
    Visibility,
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("fetch failed for {url}: {cause}")]
    FetchFailed { url: String, cause: String },

    #[error("could not parse GeoJSON from {url}: {reason}")]
    ParseFailed { url: String, reason: String },

    #[error("unsupported geometry kind: {0}")]
    UnsupportedGeometry(String),

    #[error("unknown layer: {0}")]
    UnknownLayer(String),

    #[error("map surface error: {0}")]
    Surface(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Installs `env_logger` as the `log` backend. Safe to call more than once.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .try_init();
}
