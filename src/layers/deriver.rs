//! Splits a feature collection into one layer per geometry kind

use crate::core::config::PaintConfig;
use crate::data::geojson::{FeatureCollection, GeometryKind};
use crate::layers::descriptor::{layer_id, GeometryFilter, LayerDescriptor, RenderType};
use crate::style::color::ColorAllocator;
use crate::style::paint::PaintStyle;
use crate::MapError;

/// Output of [`derive_layers`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Derivation {
    /// One descriptor per supported kind, in first-seen order
    pub layers: Vec<LayerDescriptor>,
    /// One `UnsupportedGeometry` per distinct unsupported kind
    pub rejected: Vec<MapError>,
}

/// Derives the render layers for `collection`.
///
/// Each distinct geometry kind draws one color from `colors`, in the order
/// kinds first appear. Unsupported kinds are reported in
/// [`Derivation::rejected`] without consuming a color and without stopping
/// the remaining kinds. Features without geometry are ignored.
pub fn derive_layers(
    collection: &FeatureCollection,
    source_id: &str,
    colors: &mut ColorAllocator,
    paint: &PaintConfig,
) -> Derivation {
    let mut seen: Vec<&str> = Vec::new();
    for geometry_type in collection.features.iter().filter_map(|f| f.geometry_type()) {
        if !seen.contains(&geometry_type) {
            seen.push(geometry_type);
        }
    }

    let mut derivation = Derivation::default();
    for geometry_type in seen {
        match geometry_type.parse::<GeometryKind>() {
            Ok(kind) => derivation
                .layers
                .push(describe(source_id, kind, colors, paint)),
            Err(err) => {
                log::warn!("source {}: skipping geometry: {}", source_id, err);
                derivation.rejected.push(err);
            }
        }
    }

    log::debug!(
        "source {}: derived {} layer(s) from {} feature(s)",
        source_id,
        derivation.layers.len(),
        collection.len()
    );
    derivation
}

fn describe(
    source_id: &str,
    kind: GeometryKind,
    colors: &mut ColorAllocator,
    paint: &PaintConfig,
) -> LayerDescriptor {
    let color = colors.next_color();
    let render_type = RenderType::for_kind(kind);

    LayerDescriptor {
        id: layer_id(source_id, kind),
        source_id: source_id.to_string(),
        kind,
        render_type,
        paint: PaintStyle::for_render_type(render_type, color, paint),
        filter: GeometryFilter::for_kind(kind),
        color,
    }
}
