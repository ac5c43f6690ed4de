//! Load gate
//!
//! The map stays behind a loading screen until every configured source has
//! settled (loaded or failed) and every layer derived from the loaded ones is
//! present on the surface. Once ready, the gate never reverts.

use crate::prelude::{HashMap, HashSet};
use crate::surface::MapSurface;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Loading,
    Ready,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }
}

#[derive(Debug)]
pub struct ReadinessGate {
    /// Configured sources that have not settled yet
    pending: HashSet<String>,
    /// Layers each loaded source is expected to contribute
    expected: HashMap<String, Vec<String>>,
    state: Readiness,
}

impl ReadinessGate {
    pub fn new<I, S>(source_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pending: source_ids.into_iter().map(Into::into).collect(),
            expected: HashMap::default(),
            state: Readiness::Loading,
        }
    }

    /// Marks `source_id` loaded; its layers must appear before the gate opens.
    pub fn expect_layers(&mut self, source_id: &str, layer_ids: Vec<String>) {
        self.pending.remove(source_id);
        self.expected.insert(source_id.to_string(), layer_ids);
    }

    /// Marks `source_id` settled with no layers
    pub fn source_failed(&mut self, source_id: &str) {
        self.pending.remove(source_id);
        self.expected.remove(source_id);
    }

    /// Re-evaluates against the surface's layer set
    pub fn check<S: MapSurface + ?Sized>(&mut self, surface: &S) -> Readiness {
        if self.state.is_ready() {
            return self.state;
        }

        if self.pending.is_empty()
            && self
                .expected
                .values()
                .flatten()
                .all(|layer_id| surface.has_layer(layer_id))
        {
            log::info!(
                "all sources settled, {} layer(s) on the map",
                self.expected.values().map(Vec::len).sum::<usize>()
            );
            self.state = Readiness::Ready;
        }
        self.state
    }

    pub fn state(&self) -> Readiness {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn pending_sources(&self) -> Vec<&str> {
        let mut pending: Vec<&str> = self.pending.iter().map(String::as_str).collect();
        pending.sort_unstable();
        pending
    }

    /// Expected layers the surface does not have yet
    pub fn missing_layers<S: MapSurface + ?Sized>(&self, surface: &S) -> Vec<&str> {
        self.expected
            .values()
            .flatten()
            .filter(|layer_id| !surface.has_layer(layer_id))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{PaintConfig, ViewConfig};
    use crate::data::geojson::{Feature, FeatureCollection, Geometry};
    use crate::layers::deriver::derive_layers;
    use crate::style::color::ColorAllocator;
    use crate::surface::memory::MemorySurface;

    fn loaded_surface(source_id: &str) -> (MemorySurface, Vec<String>) {
        let mut surface = MemorySurface::new(&ViewConfig::default());
        let collection = FeatureCollection::new(vec![Feature::new(Geometry::point(0.0, 0.0))]);
        surface.add_source(source_id, &collection).unwrap();
        let derivation = derive_layers(
            &collection,
            source_id,
            &mut ColorAllocator::default(),
            &PaintConfig::default(),
        );
        let ids = derivation.layers.iter().map(|l| l.id.clone()).collect();
        for layer in &derivation.layers {
            surface.add_layer(layer).unwrap();
        }
        (surface, ids)
    }

    #[test]
    fn test_loading_until_all_sources_settle() {
        let (surface, ids) = loaded_surface("a");
        let mut gate = ReadinessGate::new(["a", "b"]);

        gate.expect_layers("a", ids);
        assert_eq!(gate.check(&surface), Readiness::Loading);
        assert_eq!(gate.pending_sources(), vec!["b"]);

        gate.source_failed("b");
        assert_eq!(gate.check(&surface), Readiness::Ready);
    }

    #[test]
    fn test_waits_for_expected_layers() {
        let surface = MemorySurface::new(&ViewConfig::default());
        let mut gate = ReadinessGate::new(["a"]);

        gate.expect_layers("a", vec!["a-Point".to_string()]);
        assert_eq!(gate.check(&surface), Readiness::Loading);
        assert_eq!(gate.missing_layers(&surface), vec!["a-Point"]);
    }

    #[test]
    fn test_all_failed_is_ready() {
        let surface = MemorySurface::new(&ViewConfig::default());
        let mut gate = ReadinessGate::new(["a", "b"]);
        gate.source_failed("a");
        gate.source_failed("b");

        assert!(gate.check(&surface).is_ready());
    }

    #[test]
    fn test_ready_is_monotonic() {
        let (mut surface, ids) = loaded_surface("a");
        let mut gate = ReadinessGate::new(["a"]);
        gate.expect_layers("a", ids);
        assert!(gate.check(&surface).is_ready());

        surface.remove_layer("a-Point");
        assert_eq!(gate.check(&surface), Readiness::Ready);
        assert!(gate.is_ready());
    }
}
