//! In-process map surface
//!
//! Keeps sources, layers, layout visibility, feature state, viewport and
//! cursor in memory and emits the same events a rendering backend would.
//! Pointer movement is hit-tested against feature geometry, so hover
//! behaviour can be driven without a real map.

use super::{
    CursorStyle, FeatureRef, FeatureState, MapEvent, MapSurface, RenderedFeature, Visibility,
};
use crate::core::config::ViewConfig;
use crate::core::geo::LatLng;
use crate::data::geojson::{Feature, FeatureCollection};
use crate::layers::descriptor::LayerDescriptor;
use crate::prelude::{HashMap, HashSet};
use crate::spatial::hit::hit_test;
use crate::{MapError, Result};
use crossbeam_channel::{Receiver, Sender};

/// A source feature with its geometry converted once for hit-testing
struct IndexedFeature {
    feature: Feature,
    shape: Option<geo_types::Geometry<f64>>,
}

impl IndexedFeature {
    fn new(feature: Feature) -> Self {
        let shape = feature.geometry.as_ref().and_then(|g| g.to_geo());
        Self { feature, shape }
    }
}

struct SurfaceLayer {
    descriptor: LayerDescriptor,
    visibility: Visibility,
}

/// A layer as it should currently be drawn
pub struct RenderLayer<'a> {
    pub descriptor: &'a LayerDescriptor,
    /// Features the layer's filter selects, with their geometry
    pub features: Vec<(&'a Feature, &'a geo_types::Geometry<f64>)>,
}

/// Retained-mode map surface living entirely in memory
pub struct MemorySurface {
    sources: HashMap<String, Vec<IndexedFeature>>,
    /// Layers in insertion (draw) order
    layers: Vec<SurfaceLayer>,
    feature_states: HashMap<FeatureRef, FeatureState>,
    center: LatLng,
    zoom: f64,
    cursor: CursorStyle,
    subscribers: Vec<Sender<MapEvent>>,
    /// Layers the pointer is currently over
    pointer_layers: HashSet<String>,
    feature_state_writes: usize,
}

impl MemorySurface {
    pub fn new(view: &ViewConfig) -> Self {
        Self {
            sources: HashMap::default(),
            layers: Vec::new(),
            feature_states: HashMap::default(),
            center: view.center,
            zoom: view.zoom,
            cursor: CursorStyle::Default,
            subscribers: Vec::new(),
            pointer_layers: HashSet::default(),
            feature_state_writes: 0,
        }
    }

    fn emit(&mut self, event: MapEvent) {
        log::trace!("surface event {:?}", event);
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    /// Signals that the base style finished loading
    pub fn load(&mut self) {
        self.emit(MapEvent::Load);
    }

    /// Emits a style refresh without changing anything, as a backend does
    /// after internal reconfiguration
    pub fn refresh_style(&mut self) {
        self.emit(MapEvent::StyleData);
    }

    /// Drops a layer, as a style rebuild might
    pub fn remove_layer(&mut self, layer_id: &str) -> bool {
        let before = self.layers.len();
        self.layers.retain(|layer| layer.descriptor.id != layer_id);
        let removed = self.layers.len() != before;
        if removed {
            self.pointer_layers.remove(layer_id);
            self.emit(MapEvent::StyleData);
        }
        removed
    }

    /// Moves the pointer to `position`, emitting `MouseMove` for every visible
    /// layer with features under it and `MouseLeave` for layers it left.
    /// `tolerance` is in degrees.
    pub fn pointer_move(&mut self, position: LatLng, tolerance: f64) {
        let pointer: geo_types::Point<f64> = position.into();
        let mut events = Vec::new();

        for layer in &self.layers {
            let layer_id = &layer.descriptor.id;
            let hits: Vec<RenderedFeature> = if layer.visibility.is_visible() {
                self.filtered(&layer.descriptor)
                    .filter(|(_, shape)| hit_test(shape, &pointer, tolerance))
                    .rev()
                    .filter_map(|(feature, _)| {
                        feature.id.clone().map(|id| RenderedFeature {
                            id,
                            properties: feature.properties(),
                        })
                    })
                    .collect()
            } else {
                Vec::new()
            };

            if hits.is_empty() {
                if self.pointer_layers.contains(layer_id) {
                    events.push(MapEvent::MouseLeave {
                        layer_id: layer_id.clone(),
                    });
                }
            } else {
                events.push(MapEvent::MouseMove {
                    layer_id: layer_id.clone(),
                    features: hits,
                });
            }
        }

        for event in events {
            match &event {
                MapEvent::MouseMove { layer_id, .. } => {
                    self.pointer_layers.insert(layer_id.clone());
                }
                MapEvent::MouseLeave { layer_id } => {
                    self.pointer_layers.remove(layer_id);
                }
                _ => {}
            }
            self.emit(event);
        }
    }

    /// Pointer left the map entirely
    pub fn pointer_exit(&mut self) {
        let mut left: Vec<String> = self.pointer_layers.drain().collect();
        left.sort();
        for layer_id in left {
            self.emit(MapEvent::MouseLeave { layer_id });
        }
    }

    fn filtered<'a>(
        &'a self,
        descriptor: &LayerDescriptor,
    ) -> impl DoubleEndedIterator<Item = (&'a Feature, &'a geo_types::Geometry<f64>)> + 'a {
        let filter = descriptor.filter;
        self.sources
            .get(&descriptor.source_id)
            .map(|features| features.as_slice())
            .unwrap_or_default()
            .iter()
            .filter(move |indexed| {
                indexed
                    .feature
                    .geometry
                    .as_ref()
                    .and_then(|g| g.geometry_kind().ok())
                    .is_some_and(|kind| filter.matches(kind))
            })
            .filter_map(|indexed| indexed.shape.as_ref().map(|shape| (&indexed.feature, shape)))
    }

    /// Visible layers in draw order with the features each one draws
    pub fn render_layers(&self) -> Vec<RenderLayer<'_>> {
        self.layers
            .iter()
            .filter(|layer| layer.visibility.is_visible())
            .map(|layer| RenderLayer {
                descriptor: &layer.descriptor,
                features: self.filtered(&layer.descriptor).collect(),
            })
            .collect()
    }

    /// Every layer descriptor on the surface, in draw order
    pub fn layer_ids(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.descriptor.id.clone()).collect()
    }

    pub fn has_source(&self, source_id: &str) -> bool {
        self.sources.contains_key(source_id)
    }

    /// State of a feature; features never touched have the default state
    pub fn feature_state(&self, feature: &FeatureRef) -> FeatureState {
        self.feature_states.get(feature).copied().unwrap_or_default()
    }

    /// Features of `source_id` whose hover flag is set
    pub fn hovered_features(&self, source_id: &str) -> Vec<FeatureRef> {
        self.feature_states
            .iter()
            .filter(|(feature, state)| feature.source_id == source_id && state.hover)
            .map(|(feature, _)| feature.clone())
            .collect()
    }

    /// Number of feature-state writes and removals so far
    pub fn feature_state_writes(&self) -> usize {
        self.feature_state_writes
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }
}

impl MapSurface for MemorySurface {
    fn add_source(&mut self, source_id: &str, collection: &FeatureCollection) -> Result<()> {
        if self.sources.contains_key(source_id) {
            return Err(MapError::Surface(format!(
                "source '{}' already exists",
                source_id
            )));
        }
        let features = collection
            .features
            .iter()
            .cloned()
            .map(IndexedFeature::new)
            .collect();
        self.sources.insert(source_id.to_string(), features);
        Ok(())
    }

    fn add_layer(&mut self, descriptor: &LayerDescriptor) -> Result<()> {
        if !self.sources.contains_key(&descriptor.source_id) {
            return Err(MapError::Surface(format!(
                "layer '{}' references missing source '{}'",
                descriptor.id, descriptor.source_id
            )));
        }
        if self.has_layer(&descriptor.id) {
            return Err(MapError::Surface(format!(
                "layer '{}' already exists",
                descriptor.id
            )));
        }
        self.layers.push(SurfaceLayer {
            descriptor: descriptor.clone(),
            visibility: Visibility::Visible,
        });
        self.emit(MapEvent::StyleData);
        Ok(())
    }

    fn set_layout_visibility(&mut self, layer_id: &str, visibility: Visibility) -> Result<()> {
        let layer = self
            .layers
            .iter_mut()
            .find(|layer| layer.descriptor.id == layer_id)
            .ok_or_else(|| MapError::Surface(format!("layer '{}' does not exist", layer_id)))?;
        layer.visibility = visibility;
        self.emit(MapEvent::StyleData);
        Ok(())
    }

    fn layout_visibility(&self, layer_id: &str) -> Option<Visibility> {
        self.layers
            .iter()
            .find(|layer| layer.descriptor.id == layer_id)
            .map(|layer| layer.visibility)
    }

    fn set_feature_state(&mut self, feature: &FeatureRef, state: FeatureState) -> Result<()> {
        if !self.sources.contains_key(&feature.source_id) {
            return Err(MapError::Surface(format!(
                "feature state for missing source '{}'",
                feature.source_id
            )));
        }
        self.feature_states.insert(feature.clone(), state);
        self.feature_state_writes += 1;
        Ok(())
    }

    fn remove_feature_state(&mut self, feature: &FeatureRef) -> Result<()> {
        self.feature_states.remove(feature);
        self.feature_state_writes += 1;
        Ok(())
    }

    fn has_layer(&self, layer_id: &str) -> bool {
        self.layers.iter().any(|layer| layer.descriptor.id == layer_id)
    }

    fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.center = center;
        self.zoom = zoom;
    }

    fn set_cursor(&mut self, cursor: CursorStyle) {
        self.cursor = cursor;
    }

    fn subscribe(&mut self) -> Receiver<MapEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }
}
