use crate::data::geojson::GeometryKind;
use crate::style::color::HexColor;
use crate::style::paint::PaintStyle;
use crate::surface::Visibility;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Layer id for `kind` in `source_id`: exactly `"{source_id}-{kind}"`.
///
/// The sidebar slices the `"{source_id}-"` prefix back off to label rows, so
/// this format is part of the contract.
pub fn layer_id(source_id: &str, kind: GeometryKind) -> String {
    format!("{}-{}", source_id, kind.as_str())
}

/// How a layer draws its features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderType {
    PointMarker,
    Line,
    Fill,
}

impl RenderType {
    pub fn for_kind(kind: GeometryKind) -> Self {
        match kind {
            GeometryKind::Point | GeometryKind::MultiPoint => RenderType::PointMarker,
            GeometryKind::LineString | GeometryKind::MultiLineString => RenderType::Line,
            GeometryKind::Polygon | GeometryKind::MultiPolygon => RenderType::Fill,
        }
    }

    /// Layer `type` in map-style JSON
    pub fn style_type(&self) -> &'static str {
        match self {
            RenderType::PointMarker => "circle",
            RenderType::Line => "line",
            RenderType::Fill => "fill",
        }
    }
}

impl std::fmt::Display for RenderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderType::PointMarker => write!(f, "point-marker"),
            RenderType::Line => write!(f, "line"),
            RenderType::Fill => write!(f, "fill"),
        }
    }
}

/// Which geometry a layer draws when its source mixes kinds.
///
/// Holds the base kind, so a `MultiPolygon` layer filters on `Polygon` and
/// matches both polygons and multipolygons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryFilter {
    base: GeometryKind,
}

impl GeometryFilter {
    pub fn for_kind(kind: GeometryKind) -> Self {
        Self { base: kind.base() }
    }

    pub fn base_kind(&self) -> GeometryKind {
        self.base
    }

    pub fn matches(&self, kind: GeometryKind) -> bool {
        kind.base() == self.base
    }

    /// `["==", "$type", <base kind>]`
    pub fn to_json(&self) -> Value {
        json!(["==", "$type", self.base.as_str()])
    }
}

/// Everything a map surface needs to draw one geometry kind of one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    pub id: String,
    pub source_id: String,
    pub kind: GeometryKind,
    pub render_type: RenderType,
    pub paint: PaintStyle,
    pub filter: GeometryFilter,
    pub color: HexColor,
}

impl LayerDescriptor {
    /// Map-style layer object, as passed to `addLayer`
    pub fn to_json(&self, visibility: Visibility) -> Value {
        json!({
            "id": self.id,
            "type": self.render_type.style_type(),
            "source": self.source_id,
            "layout": { "visibility": visibility.as_str() },
            "paint": self.paint.to_json(),
            "filter": self.filter.to_json(),
        })
    }
}
