use async_trait::async_trait;
use geolayers::constants::{COLOR_SEED, COLOR_STRIDE};
use geolayers::prelude::*;
use std::time::Duration;

/// End-to-end tests driving the engine the way the viewer does: scripted
/// fetches that complete out of order, an in-memory map surface and pointer
/// movement over real geometry.
#[cfg(test)]
mod engine_tests {
    use super::*;

    /// Canned per-URL responses with an optional delay, so completion order
    /// can differ from configuration order.
    struct ScriptedFetcher {
        script: HashMap<String, (u64, Result<FeatureCollection>)>,
    }

    impl ScriptedFetcher {
        fn new() -> Self {
            Self {
                script: HashMap::default(),
            }
        }

        fn respond(mut self, url: &str, delay_ms: u64, result: Result<FeatureCollection>) -> Self {
            self.script.insert(url.to_string(), (delay_ms, result));
            self
        }
    }

    #[async_trait]
    impl GeoJsonFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<FeatureCollection> {
            let (delay_ms, result) = self.script.get(url).cloned().unwrap_or_else(|| {
                (
                    0,
                    Err(MapError::FetchFailed {
                        url: url.to_string(),
                        cause: "no scripted response".to_string(),
                    }),
                )
            });
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            result
        }
    }

    fn square(x: f64, y: f64) -> Geometry {
        Geometry::polygon(&[[x, y], [x + 1.0, y], [x + 1.0, y + 1.0], [x, y + 1.0], [x, y]])
    }

    fn boundaries() -> FeatureCollection {
        FeatureCollection::new(vec![
            Feature::new(square(0.0, 0.0)).with_property("NAME", "North"),
            Feature::new(square(2.0, 0.0)).with_property("NAME", "South"),
        ])
    }

    fn roads() -> FeatureCollection {
        FeatureCollection::new(vec![
            Feature::new(Geometry::line_string(&[[10.0, 10.0], [11.0, 11.0]]))
                .with_property("SURFACE", "asphalt"),
            Feature::new(Geometry::point(20.0, 20.0)).with_property("SURFACE", "gravel"),
        ])
    }

    fn markers(count: usize) -> FeatureCollection {
        FeatureCollection::new(
            (0..count)
                .map(|i| {
                    Feature::new(Geometry::point(i as f64 * 2.0, 0.0))
                        .with_property("index", i as u64)
                })
                .collect(),
        )
    }

    fn three_sources() -> EngineConfig {
        EngineConfig::with_sources(vec![
            DataSourceSpec::url("dataSource1", "City Boundary", "https://example.test/1"),
            DataSourceSpec::url("dataSource2", "Aircraft Noise Levels (AICUZ)", "https://example.test/2"),
            DataSourceSpec::url("dataSource3", "Road Surfaces", "https://example.test/3"),
        ])
    }

    fn new_engine(config: EngineConfig) -> LayerEngine<MemorySurface> {
        let surface = MemorySurface::new(&config.view);
        LayerEngine::new(config, surface).unwrap()
    }

    /// Checks that no source has more than one flagged feature
    fn assert_single_highlight(engine: &LayerEngine<MemorySurface>, source_id: &str) {
        let flagged = engine.surface().hovered_features(source_id);
        assert!(
            flagged.len() <= 1,
            "source {} has {} hovered features",
            source_id,
            flagged.len()
        );
    }

    #[tokio::test]
    async fn test_partial_failure_still_reaches_ready() {
        println!("🧪 [TEST] Testing a failing source does not block the others");

        let fetcher = ScriptedFetcher::new()
            .respond("https://example.test/1", 30, Ok(boundaries()))
            .respond(
                "https://example.test/2",
                5,
                Err(MapError::FetchFailed {
                    url: "https://example.test/2".to_string(),
                    cause: "connection reset".to_string(),
                }),
            )
            .respond("https://example.test/3", 10, Ok(roads()));

        let mut engine = new_engine(three_sources());
        assert_eq!(engine.readiness(), Readiness::Loading);

        engine.initialize(&fetcher).await;

        assert_eq!(engine.readiness(), Readiness::Ready);
        let mut ids: Vec<String> = engine.snapshot().into_iter().map(|e| e.layer_id).collect();
        ids.sort();
        assert_eq!(
            ids,
            vec!["dataSource1-Polygon", "dataSource3-LineString", "dataSource3-Point"]
        );
        assert!(!engine.surface().has_source("dataSource2"));
        assert!(matches!(
            engine.source_status("dataSource2"),
            Some(SourceStatus::Failed(MapError::FetchFailed { .. }))
        ));
        println!("✅ [TEST] Partial failure test passed");
    }

    #[tokio::test]
    async fn test_completion_order_decides_color_order() {
        println!("🧪 [TEST] Testing colors follow completion order");

        let fetcher = ScriptedFetcher::new()
            .respond("https://example.test/1", 40, Ok(markers(1)))
            .respond("https://example.test/2", 20, Ok(boundaries()))
            .respond("https://example.test/3", 0, Ok(FeatureCollection::default()));

        let mut engine = new_engine(three_sources());
        engine.initialize(&fetcher).await;

        assert!(engine.is_ready());
        let snapshot = engine.snapshot();
        assert_eq!(snapshot[0].layer_id, "dataSource2-Polygon");
        assert_eq!(snapshot[0].color.to_string(), "#008d75");
        assert_eq!(snapshot[1].layer_id, "dataSource1-Point");
        assert_eq!(snapshot[1].color.to_string(), "#00ec0a");
        assert_eq!(
            engine.source_status("dataSource3"),
            Some(&SourceStatus::Loaded { layers: 0 })
        );
    }

    #[tokio::test]
    async fn test_all_sources_failing_is_ready_with_no_layers() {
        let mut engine = new_engine(three_sources());
        engine.initialize(&ScriptedFetcher::new()).await;

        assert!(engine.is_ready());
        assert!(engine.snapshot().is_empty());
        assert!(engine.sidebar_rows().is_empty());
    }

    #[test]
    fn test_color_sequence_is_deterministic() {
        let mut first = ColorAllocator::default();
        let mut second = ColorAllocator::new(COLOR_SEED, COLOR_STRIDE);

        let a: Vec<String> = (0..32).map(|_| first.next_color().to_string()).collect();
        let b: Vec<String> = (0..32).map(|_| second.next_color().to_string()).collect();

        assert_eq!(a, b);
        assert_eq!(&a[..4], ["#008d75", "#00ec0a", "#014a9f", "#01a934"]);
    }

    #[test]
    fn test_same_inputs_same_layers() {
        let run = || {
            let mut engine = new_engine(three_sources());
            engine.ingest("dataSource1", Ok(boundaries()));
            engine.ingest("dataSource3", Ok(roads()));
            engine.snapshot()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_geometry_partition() {
        let mut features: Vec<Feature> = (0..5)
            .map(|i| Feature::new(Geometry::point(i as f64, 0.0)))
            .collect();
        features.extend((0..3).map(|i| Feature::new(square(i as f64 * 3.0, 5.0))));
        let collection = FeatureCollection::new(features);

        let derivation = derive_layers(
            &collection,
            "parcels",
            &mut ColorAllocator::default(),
            &PaintConfig::default(),
        );

        assert!(derivation.rejected.is_empty());
        assert_eq!(derivation.layers.len(), 2);
        assert_eq!(derivation.layers[0].render_type, RenderType::PointMarker);
        assert_eq!(derivation.layers[1].render_type, RenderType::Fill);
        assert_ne!(derivation.layers[0].color, derivation.layers[1].color);
        assert_eq!(derivation.layers[0].id, layer_id("parcels", GeometryKind::Point));
        assert_eq!(derivation.layers[1].id, "parcels-Polygon");
    }

    #[test]
    fn test_toggle_keeps_registry_and_surface_in_sync() {
        println!("🧪 [TEST] Testing toggle/visibility consistency");

        let mut engine = new_engine(three_sources());
        engine.ingest("dataSource1", Ok(boundaries()));
        engine.ingest("dataSource3", Ok(roads()));

        let ids: Vec<String> = engine.snapshot().into_iter().map(|e| e.layer_id).collect();
        let sequence = [0usize, 1, 1, 2, 0, 2, 2, 0, 1];

        for index in sequence {
            engine.toggle(&ids[index]).unwrap();

            for id in &ids {
                let on_surface = engine.surface().layout_visibility(id);
                assert_eq!(on_surface, Some(Visibility::from(engine.is_visible(id))));
            }
        }

        assert!(matches!(
            engine.toggle("dataSource2-Point"),
            Err(MapError::UnknownLayer(_))
        ));
        println!("✅ [TEST] Toggle consistency test passed");
    }

    #[test]
    fn test_hover_exclusivity_while_sweeping() {
        println!("🧪 [TEST] Testing at most one hovered feature per layer");

        let mut engine = new_engine(EngineConfig::with_sources(vec![DataSourceSpec::inline(
            "markers",
            "Markers",
            markers(5),
        )]));
        engine.ingest("markers", Ok(markers(5)));

        let mut previous: Option<FeatureId> = None;
        for step in 0..=16 {
            let lng = step as f64 * 0.5;
            engine.surface_mut().pointer_move(LatLng::new(0.0, lng), 0.1);
            engine.pump_events();
            assert_single_highlight(&engine, "markers");

            let current = engine.hover().highlighted("markers-Point").cloned();
            if let (Some(before), Some(now)) = (&previous, &current) {
                if before != now {
                    let old = FeatureRef::new("markers", before.clone());
                    assert!(!engine.surface().feature_state(&old).hover);
                }
            }
            if let Some(now) = &current {
                let flagged = FeatureRef::new("markers", now.clone());
                assert!(engine.surface().feature_state(&flagged).hover);
            }
            previous = current;
        }
        println!("✅ [TEST] Hover exclusivity test passed");
    }

    #[test]
    fn test_direct_switch_between_adjacent_features() {
        let mut engine = new_engine(EngineConfig::with_sources(vec![DataSourceSpec::url(
            "markers",
            "Markers",
            "https://example.test/m",
        )]));
        engine.ingest("markers", Ok(markers(2)));

        engine.surface_mut().pointer_move(LatLng::new(0.0, 0.0), 0.5);
        engine.pump_events();
        assert_eq!(
            engine.hover().highlighted("markers-Point"),
            Some(&FeatureId::Number(0))
        );

        engine.surface_mut().pointer_move(LatLng::new(0.0, 1.5), 0.6);
        engine.pump_events();

        assert_eq!(
            engine.hover().highlighted("markers-Point"),
            Some(&FeatureId::Number(1))
        );
        assert_eq!(engine.surface().hovered_features("markers").len(), 1);
        assert_eq!(engine.inspection().unwrap().properties["index"], 1);
    }

    #[test]
    fn test_leave_when_idle_writes_nothing() {
        let mut engine = new_engine(three_sources());
        engine.ingest("dataSource1", Ok(boundaries()));
        let writes = engine.surface().feature_state_writes();

        engine.surface_mut().pointer_exit();
        engine.pump_events();

        let mut hover = HoverController::new();
        let transition = hover
            .pointer_leave(engine.surface_mut(), "dataSource1-Polygon")
            .unwrap();

        assert_eq!(transition, HoverTransition::Unchanged);
        assert_eq!(engine.surface().feature_state_writes(), writes);
        assert!(engine.hover().is_idle("dataSource1-Polygon"));
    }

    #[test]
    fn test_readiness_is_monotonic() {
        println!("🧪 [TEST] Testing readiness never reverts");

        let mut engine = new_engine(three_sources());
        engine.ingest("dataSource1", Ok(boundaries()));
        engine.ingest("dataSource2", Err(MapError::ParseFailed {
            url: "https://example.test/2".to_string(),
            reason: "expected value".to_string(),
        }));
        assert_eq!(engine.readiness(), Readiness::Loading);

        engine.ingest("dataSource3", Ok(roads()));
        assert_eq!(engine.readiness(), Readiness::Ready);

        engine.surface_mut().remove_layer("dataSource1-Polygon");
        engine.surface_mut().refresh_style();
        engine.pump_events();
        engine.ingest("dataSource3", Err(MapError::FetchFailed {
            url: "https://example.test/3".to_string(),
            cause: "late failure".to_string(),
        }));
        let _ = engine.toggle("dataSource3-Point");

        assert_eq!(engine.readiness(), Readiness::Ready);
        println!("✅ [TEST] Readiness monotonicity test passed");
    }

    #[test]
    fn test_sidebar_rows_for_default_style_ids() {
        let mut engine = new_engine(three_sources());
        engine.ingest("dataSource1", Ok(boundaries()));
        engine.ingest("dataSource3", Ok(roads()));

        let rows = engine.sidebar_rows();
        let labels: Vec<(&str, &str)> = rows
            .iter()
            .map(|row| (row.source_name.as_str(), row.kind_label.as_str()))
            .collect();

        assert_eq!(
            labels,
            vec![
                ("City Boundary", "Polygon"),
                ("Road Surfaces", "LineString"),
                ("Road Surfaces", "Point"),
            ]
        );
    }

    #[test]
    fn test_layer_json_matches_map_style_shape() {
        let mut engine = new_engine(three_sources());
        engine.ingest("dataSource1", Ok(boundaries()));

        let layer = engine.layer("dataSource1-Polygon").unwrap();
        let json = layer.to_json(Visibility::Visible);

        assert_eq!(json["type"], "fill");
        assert_eq!(json["source"], "dataSource1");
        assert_eq!(json["layout"]["visibility"], "visible");
        assert_eq!(json["filter"], serde_json::json!(["==", "$type", "Polygon"]));
        assert_eq!(json["paint"]["fill-opacity"], 0.25);
    }

    #[test]
    fn test_hiding_point_layer_keeps_multipoint_highlight() {
        println!("🧪 [TEST] Testing sibling layers sharing a highlighted feature");

        let mixed = FeatureCollection::new(vec![
            Feature::new(Geometry::point(0.0, 0.0)).with_property("name", "single"),
            Feature::new(Geometry::new(
                GeometryKind::MultiPoint,
                serde_json::json!([[5.0, 5.0], [6.0, 6.0]]),
            ))
            .with_property("name", "pair"),
        ]);
        let mut engine = new_engine(EngineConfig::with_sources(vec![DataSourceSpec::url(
            "s",
            "Mixed",
            "https://example.test/mixed",
        )]));
        engine.ingest("s", Ok(mixed));

        engine.surface_mut().pointer_move(LatLng::new(0.0, 0.0), 0.1);
        engine.pump_events();
        assert_eq!(engine.hover().highlighted("s-Point"), Some(&FeatureId::Number(0)));
        assert_eq!(engine.hover().highlighted("s-MultiPoint"), Some(&FeatureId::Number(0)));

        engine.toggle("s-Point").unwrap();

        let shared = FeatureRef::new("s", FeatureId::Number(0));
        assert!(engine.hover().is_idle("s-Point"));
        assert_eq!(engine.hover().highlighted("s-MultiPoint"), Some(&FeatureId::Number(0)));
        assert!(engine.surface().feature_state(&shared).hover);

        engine.surface_mut().pointer_move(LatLng::new(40.0, 40.0), 0.1);
        engine.pump_events();
        assert!(engine.hover().is_idle("s-MultiPoint"));
        assert!(!engine.surface().feature_state(&shared).hover);
        println!("✅ [TEST] Shared highlight test passed");
    }
}
