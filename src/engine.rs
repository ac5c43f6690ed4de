//! The layer engine
//!
//! [`LayerEngine`] owns everything that changes while the map is running: the
//! color allocator, the toggle registry, the hover controller, the readiness
//! gate and the map surface itself. Source fetches complete in any order;
//! each completion is handed to [`LayerEngine::ingest`], which attaches the
//! source, derives its layers and registers them. Surface events are drained
//! with [`LayerEngine::pump_events`].

use crate::core::config::{EngineConfig, SourceData};
use crate::data::fetch::GeoJsonFetcher;
use crate::data::geojson::FeatureCollection;
use crate::interaction::hover::{HoverController, Inspection};
use crate::layers::deriver::derive_layers;
use crate::layers::descriptor::LayerDescriptor;
use crate::layers::registry::{ToggleEntry, ToggleRegistry};
use crate::prelude::HashMap;
use crate::readiness::{Readiness, ReadinessGate};
use crate::style::color::{ColorAllocator, HexColor};
use crate::surface::{MapEvent, MapSurface};
use crate::{MapError, Result};
use crossbeam_channel::Receiver;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;

/// One line of the layer sidebar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidebarRow {
    pub layer_id: String,
    /// Display name of the source the layer belongs to
    pub source_name: String,
    /// Layer id without its `"{source_id}-"` prefix, i.e. the geometry kind
    pub kind_label: String,
    pub color: HexColor,
    pub visible: bool,
}

/// How a configured source ended up
#[derive(Debug, Clone, PartialEq)]
pub enum SourceStatus {
    Loaded { layers: usize },
    Failed(MapError),
}

pub struct LayerEngine<S: MapSurface> {
    config: EngineConfig,
    surface: S,
    events: Receiver<MapEvent>,
    colors: ColorAllocator,
    registry: ToggleRegistry,
    hover: HoverController,
    gate: ReadinessGate,
    /// Every layer added to the surface, by id
    layers: HashMap<String, LayerDescriptor>,
    settled: HashMap<String, SourceStatus>,
}

impl<S: MapSurface> LayerEngine<S> {
    /// Validates `config` and takes ownership of `surface`.
    pub fn new(config: EngineConfig, mut surface: S) -> Result<Self> {
        config.validate()?;

        let events = surface.subscribe();
        surface.set_view(config.view.center, config.view.zoom);

        let mut gate = ReadinessGate::new(config.sources.iter().map(|s| s.id.clone()));
        gate.check(&surface);

        log::info!("layer engine configured with {} source(s)", config.sources.len());

        Ok(Self {
            colors: ColorAllocator::new(config.color_seed, config.color_stride),
            config,
            surface,
            events,
            registry: ToggleRegistry::new(),
            hover: HoverController::new(),
            gate,
            layers: HashMap::default(),
            settled: HashMap::default(),
        })
    }

    /// Loads every configured source.
    ///
    /// Inline sources are ingested first; URL sources are fetched concurrently
    /// and each is ingested as soon as its own fetch completes. A failing
    /// source never holds up the others.
    pub async fn initialize(&mut self, fetcher: &dyn GeoJsonFetcher) {
        let mut pending = FuturesUnordered::new();

        for source in self.config.sources.clone() {
            match source.data {
                SourceData::Inline(collection) => {
                    self.ingest(&source.id, Ok(collection));
                }
                SourceData::Url(url) => {
                    log::debug!("fetching {} from {}", source.id, url);
                    pending.push(async move {
                        let result = fetcher.fetch(&url).await;
                        (source.id, result)
                    });
                }
            }
        }

        while let Some((source_id, result)) = pending.next().await {
            self.ingest(&source_id, result);
        }
    }

    /// Completion step for one source. Returns the number of layers added.
    ///
    /// Failures are logged and mark the source as settled with no layers.
    /// Unknown or already-settled sources are ignored.
    pub fn ingest(&mut self, source_id: &str, result: Result<FeatureCollection>) -> usize {
        if self.config.source(source_id).is_none() {
            log::warn!("ignoring data for unconfigured source {}", source_id);
            return 0;
        }
        if self.settled.contains_key(source_id) {
            log::warn!("source {} already settled, ignoring", source_id);
            return 0;
        }

        let status = match result.and_then(|collection| self.attach(source_id, collection)) {
            Ok(layers) => {
                log::info!("source {} loaded with {} layer(s)", source_id, layers);
                SourceStatus::Loaded { layers }
            }
            Err(err) => {
                log::error!("source {} contributes no layers: {}", source_id, err);
                self.gate.source_failed(source_id);
                SourceStatus::Failed(err)
            }
        };

        let added = match status {
            SourceStatus::Loaded { layers } => layers,
            SourceStatus::Failed(_) => 0,
        };
        self.settled.insert(source_id.to_string(), status);

        self.pump_events();
        self.gate.check(&self.surface);
        added
    }

    fn attach(&mut self, source_id: &str, collection: FeatureCollection) -> Result<usize> {
        self.surface.add_source(source_id, &collection)?;

        let derivation = derive_layers(
            &collection,
            source_id,
            &mut self.colors,
            &self.config.paint,
        );

        let mut added = Vec::with_capacity(derivation.layers.len());
        for layer in derivation.layers {
            if let Err(err) = self.surface.add_layer(&layer) {
                log::warn!("layer {} not added: {}", layer.id, err);
                continue;
            }
            self.registry.register(&layer.id, layer.color);
            added.push(layer.id.clone());
            self.layers.insert(layer.id.clone(), layer);
        }

        let count = added.len();
        self.gate.expect_layers(source_id, added);
        Ok(count)
    }

    /// Handles every surface event emitted since the last call.
    pub fn pump_events(&mut self) {
        let events: Vec<MapEvent> = self.events.try_iter().collect();
        for event in events {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: MapEvent) {
        match event {
            MapEvent::Load => log::debug!("map surface loaded"),
            MapEvent::StyleData => {
                self.gate.check(&self.surface);
            }
            MapEvent::MouseMove { layer_id, features } => {
                let Some(feature) = features.first() else {
                    return;
                };
                let Some(layer) = self.layers.get(&layer_id) else {
                    log::debug!("pointer over unmanaged layer {}", layer_id);
                    return;
                };
                if let Err(err) =
                    self.hover
                        .pointer_move(&mut self.surface, &layer_id, &layer.source_id, feature)
                {
                    log::warn!("hover on {} failed: {}", layer_id, err);
                }
            }
            MapEvent::MouseLeave { layer_id } => {
                if let Err(err) = self.hover.pointer_leave(&mut self.surface, &layer_id) {
                    log::warn!("clearing hover on {} failed: {}", layer_id, err);
                }
            }
        }
    }

    /// Flips a layer's visibility. Hiding a layer drops its highlight.
    pub fn toggle(&mut self, layer_id: &str) -> Result<bool> {
        let visible = match self.registry.toggle(layer_id, &mut self.surface) {
            Ok(visible) => visible,
            Err(err) => {
                log::warn!("toggle {} rejected: {}", layer_id, err);
                return Err(err);
            }
        };

        if !visible {
            if let Err(err) = self.hover.clear_layer(&mut self.surface, layer_id) {
                log::warn!("clearing hover on hidden layer {} failed: {}", layer_id, err);
            }
        }
        self.pump_events();
        Ok(visible)
    }

    pub fn is_visible(&self, layer_id: &str) -> bool {
        self.registry.is_visible(layer_id)
    }

    /// Toggle state of every layer, in registration order
    pub fn snapshot(&self) -> Vec<ToggleEntry> {
        self.registry.snapshot()
    }

    /// Rows for the layer sidebar, in registration order
    pub fn sidebar_rows(&self) -> Vec<SidebarRow> {
        self.registry
            .snapshot()
            .into_iter()
            .map(|entry| {
                let source_id = self
                    .layers
                    .get(&entry.layer_id)
                    .map(|layer| layer.source_id.as_str())
                    .unwrap_or_default();
                let source_name = self
                    .config
                    .source(source_id)
                    .map(|s| s.display_name.clone())
                    .unwrap_or_else(|| source_id.to_string());
                let kind_label = entry
                    .layer_id
                    .strip_prefix(source_id)
                    .and_then(|rest| rest.strip_prefix('-'))
                    .unwrap_or(&entry.layer_id)
                    .to_string();

                SidebarRow {
                    layer_id: entry.layer_id,
                    source_name,
                    kind_label,
                    color: entry.color,
                    visible: entry.visible,
                }
            })
            .collect()
    }

    /// Properties of the most recently hovered feature
    pub fn inspection(&self) -> Option<&Inspection> {
        self.hover.inspection()
    }

    pub fn hover(&self) -> &HoverController {
        &self.hover
    }

    pub fn readiness(&self) -> Readiness {
        self.gate.state()
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    pub fn gate(&self) -> &ReadinessGate {
        &self.gate
    }

    /// Resets the viewport to the configured center and zoom.
    pub fn recenter(&mut self) {
        let view = &self.config.view;
        log::debug!("recenter to {:?} @ {}", view.center, view.zoom);
        self.surface.set_view(view.center, view.zoom);
    }

    pub fn source_status(&self, source_id: &str) -> Option<&SourceStatus> {
        self.settled.get(source_id)
    }

    pub fn layer(&self, layer_id: &str) -> Option<&LayerDescriptor> {
        self.layers.get(layer_id)
    }

    /// All layers on the surface, in registration order
    pub fn layers(&self) -> impl Iterator<Item = &LayerDescriptor> + '_ {
        self.registry
            .layer_ids()
            .iter()
            .filter_map(|id| self.layers.get(id))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable surface access for drivers (pointer input, viewport changes).
    /// Call [`pump_events`](Self::pump_events) afterwards.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DataSourceSpec;
    use crate::core::geo::LatLng;
    use crate::data::geojson::{Feature, FeatureId, Geometry};
    use crate::surface::memory::MemorySurface;
    use crate::surface::{CursorStyle, FeatureRef, Visibility};

    fn points_and_polygon() -> FeatureCollection {
        FeatureCollection::new(vec![
            Feature::new(Geometry::point(0.0, 0.0)).with_property("name", "a"),
            Feature::new(Geometry::point(5.0, 5.0)).with_property("name", "b"),
            Feature::new(Geometry::polygon(&[
                [10.0, 10.0],
                [12.0, 10.0],
                [12.0, 12.0],
                [10.0, 12.0],
                [10.0, 10.0],
            ]))
            .with_property("name", "c"),
        ])
    }

    fn engine(sources: Vec<DataSourceSpec>) -> LayerEngine<MemorySurface> {
        let config = EngineConfig::with_sources(sources);
        let surface = MemorySurface::new(&config.view);
        LayerEngine::new(config, surface).unwrap()
    }

    #[test]
    fn test_ingest_registers_layers() {
        let mut engine = engine(vec![
            DataSourceSpec::url("one", "One", "https://one"),
            DataSourceSpec::url("two", "Two", "https://two"),
        ]);

        assert_eq!(engine.ingest("one", Ok(points_and_polygon())), 2);
        assert_eq!(engine.readiness(), Readiness::Loading);
        assert!(engine.surface().has_layer("one-Point"));
        assert!(engine.surface().has_layer("one-Polygon"));
        assert_eq!(engine.source_status("one"), Some(&SourceStatus::Loaded { layers: 2 }));
    }

    #[test]
    fn test_failed_source_settles() {
        let mut engine = engine(vec![
            DataSourceSpec::url("one", "One", "https://one"),
            DataSourceSpec::url("two", "Two", "https://two"),
        ]);
        engine.ingest("one", Ok(points_and_polygon()));

        let err = MapError::FetchFailed {
            url: "https://two".into(),
            cause: "refused".into(),
        };
        assert_eq!(engine.ingest("two", Err(err.clone())), 0);

        assert!(engine.is_ready());
        assert_eq!(engine.source_status("two"), Some(&SourceStatus::Failed(err)));
        assert_eq!(engine.snapshot().len(), 2);
    }

    #[test]
    fn test_duplicate_and_unknown_ingest_ignored() {
        let mut engine = engine(vec![DataSourceSpec::url("one", "One", "https://one")]);
        engine.ingest("one", Ok(points_and_polygon()));

        assert_eq!(engine.ingest("one", Ok(points_and_polygon())), 0);
        assert_eq!(engine.ingest("nope", Ok(points_and_polygon())), 0);
        assert_eq!(engine.snapshot().len(), 2);
    }

    #[test]
    fn test_no_sources_is_ready() {
        let engine = engine(Vec::new());
        assert!(engine.is_ready());
    }

    #[test]
    fn test_sidebar_rows_strip_source_prefix() {
        let mut engine = engine(vec![DataSourceSpec::url(
            "dataSource1",
            "City Boundary",
            "https://one",
        )]);
        engine.ingest("dataSource1", Ok(points_and_polygon()));

        let rows = engine.sidebar_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].layer_id, "dataSource1-Point");
        assert_eq!(rows[0].kind_label, "Point");
        assert_eq!(rows[0].source_name, "City Boundary");
        assert_eq!(rows[1].kind_label, "Polygon");
        assert!(rows.iter().all(|row| row.visible));
        assert_ne!(rows[0].color, rows[1].color);
    }

    #[test]
    fn test_toggle_round_trip() {
        let mut engine = engine(vec![DataSourceSpec::url("one", "One", "https://one")]);
        engine.ingest("one", Ok(points_and_polygon()));

        assert!(!engine.toggle("one-Point").unwrap());
        assert_eq!(
            engine.surface().layout_visibility("one-Point"),
            Some(Visibility::None)
        );
        assert!(engine.toggle("one-Point").unwrap());
        assert!(engine.is_visible("one-Point"));

        assert_eq!(
            engine.toggle("one-LineString"),
            Err(MapError::UnknownLayer("one-LineString".to_string()))
        );
    }

    #[test]
    fn test_pointer_drives_hover() {
        let mut engine = engine(vec![DataSourceSpec::url("one", "One", "https://one")]);
        engine.ingest("one", Ok(points_and_polygon()));

        engine.surface_mut().pointer_move(LatLng::new(11.0, 11.0), 0.01);
        engine.pump_events();

        let inspection = engine.inspection().unwrap();
        assert_eq!(inspection.layer_id, "one-Polygon");
        assert_eq!(inspection.properties["name"], "c");
        assert_eq!(engine.surface().cursor(), CursorStyle::Pointer);

        engine.surface_mut().pointer_move(LatLng::new(40.0, 40.0), 0.01);
        engine.pump_events();

        assert!(engine.inspection().is_none());
        assert_eq!(engine.surface().cursor(), CursorStyle::Default);
    }

    #[test]
    fn test_hiding_layer_clears_its_highlight() {
        let mut engine = engine(vec![DataSourceSpec::url("one", "One", "https://one")]);
        engine.ingest("one", Ok(points_and_polygon()));
        engine.surface_mut().pointer_move(LatLng::new(0.0, 0.0), 0.01);
        engine.pump_events();
        assert!(engine.hover().highlighted("one-Point").is_some());

        engine.toggle("one-Point").unwrap();

        assert!(engine.hover().is_idle("one-Point"));
        let feature = FeatureRef::new("one", FeatureId::Number(0));
        assert!(!engine.surface().feature_state(&feature).hover);
    }

    #[test]
    fn test_recenter_restores_configured_view() {
        let mut engine = engine(Vec::new());
        engine.surface_mut().set_view(LatLng::new(1.0, 2.0), 3.0);

        engine.recenter();

        assert_eq!(engine.surface().center(), engine.config().view.center);
        assert_eq!(engine.surface().zoom(), engine.config().view.zoom);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig::with_sources(vec![
            DataSourceSpec::url("dup", "A", "https://a"),
            DataSourceSpec::url("dup", "B", "https://b"),
        ]);
        let surface = MemorySurface::new(&config.view);
        assert!(matches!(
            LayerEngine::new(config, surface),
            Err(MapError::Config(_))
        ));
    }
}
