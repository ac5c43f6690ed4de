//! Layer toggle registry
//!
//! The registry is the single source of truth for which derived layers are
//! switched on, and the only component that writes layer visibility to the
//! map surface. UI code reads [`ToggleRegistry::snapshot`] and never mutates.

use crate::prelude::HashMap;
use crate::style::color::HexColor;
use crate::surface::{MapSurface, Visibility};
use crate::{MapError, Result};
use serde::Serialize;

/// Toggle state of one layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToggleEntry {
    pub layer_id: String,
    pub visible: bool,
    pub color: HexColor,
}

/// Toggle state for every registered layer
#[derive(Debug, Default)]
pub struct ToggleRegistry {
    /// Entries indexed by layer id
    entries: HashMap<String, ToggleEntry>,
    /// Layer ids in registration order, for a stable sidebar
    order: Vec<String>,
}

impl ToggleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a layer as visible. Registering an id again overwrites the
    /// entry but keeps its original position.
    pub fn register(&mut self, layer_id: &str, color: HexColor) {
        let entry = ToggleEntry {
            layer_id: layer_id.to_string(),
            visible: true,
            color,
        };
        if self.entries.insert(layer_id.to_string(), entry).is_some() {
            log::debug!("layer {} registered twice, overwriting", layer_id);
        } else {
            self.order.push(layer_id.to_string());
        }
    }

    /// Flips a layer's visibility and applies it to `surface`.
    ///
    /// The registry only changes once the surface has accepted the new
    /// visibility, so the two never disagree. Unknown ids return
    /// `UnknownLayer` and change nothing.
    pub fn toggle<S: MapSurface + ?Sized>(&mut self, layer_id: &str, surface: &mut S) -> Result<bool> {
        let entry = self
            .entries
            .get_mut(layer_id)
            .ok_or_else(|| MapError::UnknownLayer(layer_id.to_string()))?;

        let visible = !entry.visible;
        surface.set_layout_visibility(layer_id, Visibility::from(visible))?;
        entry.visible = visible;

        log::debug!("layer {} -> {}", layer_id, Visibility::from(visible));
        Ok(visible)
    }

    /// Visibility of a layer; unknown layers are not visible
    pub fn is_visible(&self, layer_id: &str) -> bool {
        self.entries.get(layer_id).is_some_and(|e| e.visible)
    }

    pub fn get(&self, layer_id: &str) -> Option<&ToggleEntry> {
        self.entries.get(layer_id)
    }

    pub fn contains(&self, layer_id: &str) -> bool {
        self.entries.contains_key(layer_id)
    }

    /// Copy of every entry, in registration order
    pub fn snapshot(&self) -> Vec<ToggleEntry> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).cloned())
            .collect()
    }

    /// Layer ids in registration order
    pub fn layer_ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
