use crate::{MapError, Result};
use fxhash::FxHashSet;
use geo_types::{Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Feature properties, kept in key order for stable display
pub type Properties = serde_json::Map<String, Value>;

/// The six GeoJSON geometry kinds a layer can be derived for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 6] = [
        GeometryKind::Point,
        GeometryKind::LineString,
        GeometryKind::Polygon,
        GeometryKind::MultiPoint,
        GeometryKind::MultiLineString,
        GeometryKind::MultiPolygon,
    ];

    /// The GeoJSON `type` string
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::MultiPolygon => "MultiPolygon",
        }
    }

    /// Collapses a Multi* kind to its singular form
    pub fn base(&self) -> GeometryKind {
        match self {
            GeometryKind::Point | GeometryKind::MultiPoint => GeometryKind::Point,
            GeometryKind::LineString | GeometryKind::MultiLineString => GeometryKind::LineString,
            GeometryKind::Polygon | GeometryKind::MultiPolygon => GeometryKind::Polygon,
        }
    }

    pub fn is_multi(&self) -> bool {
        *self != self.base()
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeometryKind {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        GeometryKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| MapError::UnsupportedGeometry(s.to_string()))
    }
}

/// Feature identifier, unique within its source.
///
/// GeoJSON allows any number or a string. Unsigned integers land in
/// `Number`, negative ones in `Signed`, everything else numeric in `Float`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(u64),
    Signed(i64),
    Float(f64),
    Text(String),
}

// Floats compare and hash by bit pattern; JSON cannot carry NaN.
impl PartialEq for FeatureId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FeatureId::Number(a), FeatureId::Number(b)) => a == b,
            (FeatureId::Signed(a), FeatureId::Signed(b)) => a == b,
            (FeatureId::Float(a), FeatureId::Float(b)) => a.to_bits() == b.to_bits(),
            (FeatureId::Text(a), FeatureId::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FeatureId {}

impl Hash for FeatureId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FeatureId::Number(n) => n.hash(state),
            FeatureId::Signed(n) => n.hash(state),
            FeatureId::Float(n) => n.to_bits().hash(state),
            FeatureId::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Number(n) => write!(f, "{}", n),
            FeatureId::Signed(n) => write!(f, "{}", n),
            FeatureId::Float(n) => write!(f, "{}", n),
            FeatureId::Text(s) => f.write_str(s),
        }
    }
}

/// Reads a feature id, treating shapes GeoJSON does not allow (objects,
/// arrays, booleans) as absent so the collection renumbers instead of failing.
fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<FeatureId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match FeatureId::deserialize(value) {
        Ok(id) => Some(id),
        Err(err) => {
            log::debug!("ignoring unusable feature id: {}", err);
            None
        }
    }))
}

impl From<u64> for FeatureId {
    fn from(value: u64) -> Self {
        FeatureId::Number(value)
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        FeatureId::Text(value.to_string())
    }
}

/// A GeoJSON geometry object.
///
/// The `type` is kept as the raw string so that kinds outside the supported
/// six survive parsing and can be rejected per kind by the layer deriver
/// instead of failing the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometries: Option<Vec<Geometry>>,
}

impl Geometry {
    pub fn new(kind: GeometryKind, coordinates: Value) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            coordinates: Some(coordinates),
            geometries: None,
        }
    }

    pub fn point(lng: f64, lat: f64) -> Self {
        Self::new(GeometryKind::Point, serde_json::json!([lng, lat]))
    }

    pub fn line_string(coords: &[[f64; 2]]) -> Self {
        Self::new(GeometryKind::LineString, serde_json::json!(coords))
    }

    /// Polygon from a single exterior ring
    pub fn polygon(exterior: &[[f64; 2]]) -> Self {
        Self::new(GeometryKind::Polygon, serde_json::json!([exterior]))
    }

    /// The supported kind, or `UnsupportedGeometry` carrying the raw type
    pub fn geometry_kind(&self) -> Result<GeometryKind> {
        self.kind.parse()
    }

    /// Converts to a `geo_types` geometry for spatial queries. Returns `None`
    /// for unsupported kinds and malformed coordinates.
    pub fn to_geo(&self) -> Option<geo_types::Geometry<f64>> {
        let coordinates = self.coordinates.as_ref()?;
        let geometry = match self.geometry_kind().ok()? {
            GeometryKind::Point => Point::from(coord(coordinates)?).into(),
            GeometryKind::LineString => LineString::new(coords(coordinates)?).into(),
            GeometryKind::Polygon => polygon(coordinates)?.into(),
            GeometryKind::MultiPoint => MultiPoint::new(
                coords(coordinates)?.into_iter().map(Point::from).collect(),
            )
            .into(),
            GeometryKind::MultiLineString => MultiLineString::new(
                coordinates
                    .as_array()?
                    .iter()
                    .map(|line| coords(line).map(LineString::new))
                    .collect::<Option<Vec<_>>>()?,
            )
            .into(),
            GeometryKind::MultiPolygon => MultiPolygon::new(
                coordinates
                    .as_array()?
                    .iter()
                    .map(polygon)
                    .collect::<Option<Vec<_>>>()?,
            )
            .into(),
        };
        Some(geometry)
    }
}

fn coord(value: &Value) -> Option<Coord<f64>> {
    let position = value.as_array()?;
    Some(Coord {
        x: position.first()?.as_f64()?,
        y: position.get(1)?.as_f64()?,
    })
}

fn coords(value: &Value) -> Option<Vec<Coord<f64>>> {
    value.as_array()?.iter().map(coord).collect()
}

fn polygon(value: &Value) -> Option<Polygon<f64>> {
    let mut rings = value
        .as_array()?
        .iter()
        .map(|ring| coords(ring).map(LineString::new));
    let exterior = rings.next()??;
    let interiors = rings.collect::<Option<Vec<_>>>()?;
    Some(Polygon::new(exterior, interiors))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
enum FeatureTag {
    #[default]
    Feature,
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default)]
    tag: FeatureTag,
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<FeatureId>,
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Properties>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            tag: FeatureTag::Feature,
            id: None,
            geometry: Some(geometry),
            properties: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<FeatureId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties
            .get_or_insert_with(Properties::new)
            .insert(key.to_string(), value.into());
        self
    }

    /// The raw geometry `type`, if the feature has a geometry
    pub fn geometry_type(&self) -> Option<&str> {
        self.geometry.as_ref().map(|g| g.kind.as_str())
    }

    /// Properties, or an empty map for `"properties": null`
    pub fn properties(&self) -> Properties {
        self.properties.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
enum CollectionTag {
    #[default]
    FeatureCollection,
}

/// Root GeoJSON FeatureCollection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    tag: CollectionTag,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Builds a collection, assigning ids where needed (see [`Self::ensure_feature_ids`])
    pub fn new(features: Vec<Feature>) -> Self {
        let mut collection = Self {
            tag: CollectionTag::FeatureCollection,
            features,
        };
        collection.ensure_feature_ids();
        collection
    }

    /// Parses a FeatureCollection body fetched from `url`.
    pub fn from_json(url: &str, body: &str) -> Result<Self> {
        let mut collection: Self =
            serde_json::from_str(body).map_err(|e| MapError::ParseFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        collection.ensure_feature_ids();
        Ok(collection)
    }

    /// Makes every feature addressable by id.
    ///
    /// Ids supplied by the document are kept when every feature has one and
    /// they are distinct; otherwise every feature is renumbered by its index.
    pub fn ensure_feature_ids(&mut self) {
        let mut seen = FxHashSet::default();
        let usable = self
            .features
            .iter()
            .all(|f| f.id.as_ref().is_some_and(|id| seen.insert(id.clone())));

        if !usable {
            log::debug!(
                "renumbering {} features: ids missing or repeated",
                self.features.len()
            );
            for (index, feature) in self.features.iter_mut().enumerate() {
                feature.id = Some(FeatureId::Number(index as u64));
            }
        }
    }

    /// Looks up a feature by id
    pub fn feature(&self, id: &FeatureId) -> Option<&Feature> {
        self.features.iter().find(|f| f.id.as_ref() == Some(id))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
