//! The map surface the engine drives
//!
//! A map surface owns drawing, the viewport and per-feature state. The engine
//! only ever talks to it through [`MapSurface`], which keeps the rendering
//! backend swappable and lets tests substitute [`memory::MemorySurface`].

pub mod memory;

use crate::core::geo::LatLng;
use crate::data::geojson::{FeatureCollection, FeatureId, Properties};
use crate::layers::descriptor::LayerDescriptor;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Layout visibility of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    None,
}

impl Visibility {
    pub fn is_visible(&self) -> bool {
        *self == Visibility::Visible
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::None => "none",
        }
    }
}

impl From<bool> for Visibility {
    fn from(visible: bool) -> Self {
        if visible {
            Visibility::Visible
        } else {
            Visibility::None
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addresses one feature of one source
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureRef {
    pub source_id: String,
    pub feature_id: FeatureId,
}

impl FeatureRef {
    pub fn new(source_id: impl Into<String>, feature_id: FeatureId) -> Self {
        Self {
            source_id: source_id.into(),
            feature_id,
        }
    }
}

/// Ephemeral per-feature flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureState {
    pub hover: bool,
}

/// Pointer affordance over the map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorStyle {
    #[default]
    Default,
    Pointer,
}

/// A feature under the pointer, as reported by the surface
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFeature {
    pub id: FeatureId,
    pub properties: Properties,
}

/// Notifications emitted by a map surface
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Base style finished loading
    Load,
    /// Style or layer set changed; layers may have been added or rebuilt
    StyleData,
    /// Pointer moved over features of a layer, topmost first
    MouseMove {
        layer_id: String,
        features: Vec<RenderedFeature>,
    },
    /// Pointer left the hit region of a layer
    MouseLeave { layer_id: String },
}

/// The narrow interface the engine needs from a map-rendering backend
pub trait MapSurface {
    /// Registers a GeoJSON source. Ids are unique per surface.
    fn add_source(&mut self, source_id: &str, collection: &FeatureCollection) -> Result<()>;

    /// Adds a render layer over an existing source, initially visible.
    fn add_layer(&mut self, descriptor: &LayerDescriptor) -> Result<()>;

    /// `setLayoutProperty(layer, 'visibility', ...)`
    fn set_layout_visibility(&mut self, layer_id: &str, visibility: Visibility) -> Result<()>;

    /// Current layout visibility, `None` if the layer does not exist
    fn layout_visibility(&self, layer_id: &str) -> Option<Visibility>;

    fn set_feature_state(&mut self, feature: &FeatureRef, state: FeatureState) -> Result<()>;

    fn remove_feature_state(&mut self, feature: &FeatureRef) -> Result<()>;

    fn has_layer(&self, layer_id: &str) -> bool;

    fn set_view(&mut self, center: LatLng, zoom: f64);

    fn set_cursor(&mut self, cursor: CursorStyle);

    /// New receiver for every event emitted from now on
    fn subscribe(&mut self) -> crossbeam_channel::Receiver<MapEvent>;
}
