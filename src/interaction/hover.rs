//! Hover highlighting and the feature inspector
//!
//! Each layer is either idle or highlighting exactly one feature. Moving
//! between features clears the old hover flag before setting the new one, so
//! a layer never has two flagged features. Layers are independent: the
//! pointer can be over features of several layers at once.

use crate::data::geojson::{FeatureId, Properties};
use crate::prelude::HashMap;
use crate::surface::{CursorStyle, FeatureRef, FeatureState, MapSurface, RenderedFeature};
use crate::Result;

/// What the inspector panel shows
#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub layer_id: String,
    pub feature_id: FeatureId,
    pub properties: Properties,
}

/// Outcome of one pointer event for a layer
#[derive(Debug, Clone, PartialEq)]
pub enum HoverTransition {
    /// Nothing changed (same feature, or leave while idle)
    Unchanged,
    Entered(FeatureId),
    Switched { from: FeatureId, to: FeatureId },
    Left(FeatureId),
}

/// Per-layer hover state machine
///
/// Layers over the same source share feature state, so two layers can
/// highlight the same feature (a `Point` and a `MultiPoint` layer both draw
/// points). A shared feature's flag is only cleared once the last layer
/// holding it lets go.
#[derive(Debug, Default)]
pub struct HoverController {
    /// Highlighted feature per layer; absent means idle
    highlighted: HashMap<String, FeatureRef>,
    /// Number of layers highlighting each feature
    holders: HashMap<FeatureRef, usize>,
    inspection: Option<Inspection>,
}

impl HoverController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer is over `feature` of `layer_id` (whose data lives in `source_id`).
    pub fn pointer_move<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        layer_id: &str,
        source_id: &str,
        feature: &RenderedFeature,
    ) -> Result<HoverTransition> {
        let target = FeatureRef::new(source_id, feature.id.clone());

        if let Some(current) = self.highlighted.get(layer_id) {
            if *current == target {
                return Ok(HoverTransition::Unchanged);
            }
            // clear first: never two flagged features in one layer
            if self.is_last_holder(current) {
                surface.set_feature_state(current, FeatureState { hover: false })?;
            }
        }

        let transition = match self.release(layer_id) {
            Some(previous) => HoverTransition::Switched {
                from: previous.feature_id,
                to: feature.id.clone(),
            },
            None => HoverTransition::Entered(feature.id.clone()),
        };
        let first = self.highlighted.is_empty();

        if let Err(err) = surface.set_feature_state(&target, FeatureState { hover: true }) {
            // old flag is already cleared, so the layer is idle now
            self.went_idle(surface, layer_id);
            return Err(err);
        }

        if first {
            surface.set_cursor(CursorStyle::Pointer);
        }
        self.hold(layer_id, target);
        self.inspection = Some(Inspection {
            layer_id: layer_id.to_string(),
            feature_id: feature.id.clone(),
            properties: feature.properties.clone(),
        });

        log::trace!("hover {}: {:?}", layer_id, transition);
        Ok(transition)
    }

    /// Pointer left the hit region of `layer_id`. Idempotent: leaving an idle
    /// layer touches nothing.
    pub fn pointer_leave<S: MapSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        layer_id: &str,
    ) -> Result<HoverTransition> {
        let Some(current) = self.highlighted.get(layer_id).cloned() else {
            return Ok(HoverTransition::Unchanged);
        };

        if self.is_last_holder(&current) {
            surface.set_feature_state(&current, FeatureState { hover: false })?;
        }
        self.release(layer_id);
        self.went_idle(surface, layer_id);

        log::trace!("hover {}: left {}", layer_id, current.feature_id);
        Ok(HoverTransition::Left(current.feature_id))
    }

    /// Drops any highlight on `layer_id` and removes the feature's state
    /// outright, e.g. when the layer is hidden under the pointer. A feature
    /// still highlighted through another layer keeps its state.
    pub fn clear_layer<S: MapSurface + ?Sized>(&mut self, surface: &mut S, layer_id: &str) -> Result<()> {
        let Some(current) = self.highlighted.get(layer_id).cloned() else {
            return Ok(());
        };

        if self.is_last_holder(&current) {
            surface.remove_feature_state(&current)?;
        }
        self.release(layer_id);
        self.went_idle(surface, layer_id);
        Ok(())
    }

    fn is_last_holder(&self, feature: &FeatureRef) -> bool {
        self.holders.get(feature).map_or(true, |count| *count <= 1)
    }

    fn hold(&mut self, layer_id: &str, feature: FeatureRef) {
        *self.holders.entry(feature.clone()).or_default() += 1;
        self.highlighted.insert(layer_id.to_string(), feature);
    }

    fn release(&mut self, layer_id: &str) -> Option<FeatureRef> {
        let feature = self.highlighted.remove(layer_id)?;
        match self.holders.get_mut(&feature) {
            Some(count) if *count > 1 => *count -= 1,
            _ => {
                self.holders.remove(&feature);
            }
        }
        Some(feature)
    }

    fn went_idle<S: MapSurface + ?Sized>(&mut self, surface: &mut S, layer_id: &str) {
        self.clear_inspection_for(layer_id);
        if self.highlighted.is_empty() {
            surface.set_cursor(CursorStyle::Default);
        }
    }

    fn clear_inspection_for(&mut self, layer_id: &str) {
        if self
            .inspection
            .as_ref()
            .is_some_and(|inspection| inspection.layer_id == layer_id)
        {
            self.inspection = None;
        }
    }

    /// Feature currently highlighted in `layer_id`, if any
    pub fn highlighted(&self, layer_id: &str) -> Option<&FeatureId> {
        self.highlighted.get(layer_id).map(|f| &f.feature_id)
    }

    pub fn is_idle(&self, layer_id: &str) -> bool {
        !self.highlighted.contains_key(layer_id)
    }

    /// Most recently entered feature, cleared when its layer goes idle
    pub fn inspection(&self) -> Option<&Inspection> {
        self.inspection.as_ref()
    }
}
