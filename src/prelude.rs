//! Prelude module for common geolayers types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use geolayers::prelude::*;`

pub use crate::core::{
    config::{DataSourceSpec, EngineConfig, PaintConfig, SourceData, ViewConfig},
    geo::LatLng,
};

pub use crate::data::{
    fetch::{GeoJsonFetcher, HttpFetcher},
    geojson::{Feature, FeatureCollection, FeatureId, Geometry, GeometryKind},
};

pub use crate::engine::{LayerEngine, SidebarRow, SourceStatus};

pub use crate::interaction::hover::{HoverController, HoverTransition, Inspection};

pub use crate::layers::{
    descriptor::{layer_id, GeometryFilter, LayerDescriptor, RenderType},
    deriver::{derive_layers, Derivation},
    registry::{ToggleEntry, ToggleRegistry},
};

pub use crate::readiness::{Readiness, ReadinessGate};

pub use crate::style::{
    color::{ColorAllocator, HexColor},
    paint::{ColorExpression, PaintStyle},
};

pub use crate::surface::{
    memory::MemorySurface, CursorStyle, FeatureRef, FeatureState, MapEvent, MapSurface,
    Visibility,
};

pub use crate::{Error as MapError, Result};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
