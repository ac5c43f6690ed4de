//! Configuration for the layer engine
//!
//! The engine is driven by a static list of data sources plus a handful of
//! view and paint settings. Everything has a default so a config document
//! only needs to name what it changes.

use crate::core::constants::{
    ACCESS_TOKEN_ENV_VARS, CIRCLE_RADIUS, COLOR_SEED, COLOR_STRIDE, DEFAULT_CENTER,
    DEFAULT_STYLE_URL, DEFAULT_ZOOM, FILL_OPACITY, HIGHLIGHT_COLOR, LINE_WIDTH,
};
use crate::core::geo::LatLng;
use crate::data::geojson::FeatureCollection;
use crate::style::color::HexColor;
use crate::{MapError, Result};
use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Where a source's geometry comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceData {
    /// Remote FeatureCollection, fetched with a single `GET`
    Url(String),
    /// Collection supplied in-process; never touches the network
    Inline(FeatureCollection),
}

/// One configured data source. Immutable once the engine starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceSpec {
    /// Unique, stable id; prefix of every layer id derived from this source
    pub id: String,
    /// Name shown in the layer sidebar
    #[serde(alias = "name")]
    pub display_name: String,
    #[serde(alias = "url")]
    pub data: SourceData,
}

impl DataSourceSpec {
    pub fn url(id: impl Into<String>, display_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            data: SourceData::Url(url.into()),
        }
    }

    pub fn inline(
        id: impl Into<String>,
        display_name: impl Into<String>,
        collection: FeatureCollection,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            data: SourceData::Inline(collection),
        }
    }

    /// A human readable location for log lines.
    pub fn location(&self) -> &str {
        match &self.data {
            SourceData::Url(url) => url,
            SourceData::Inline(_) => "inline",
        }
    }
}

/// Initial viewport, also the target of the recenter action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub center: LatLng,
    pub zoom: f64,
    pub style_url: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            center: LatLng::new(DEFAULT_CENTER.0, DEFAULT_CENTER.1),
            zoom: DEFAULT_ZOOM,
            style_url: DEFAULT_STYLE_URL.to_string(),
        }
    }
}

/// Paint constants applied to every derived layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaintConfig {
    pub circle_radius: f64,
    pub line_width: f64,
    pub fill_opacity: f64,
    pub highlight_color: HexColor,
}

impl Default for PaintConfig {
    fn default() -> Self {
        Self {
            circle_radius: CIRCLE_RADIUS,
            line_width: LINE_WIDTH,
            fill_opacity: FILL_OPACITY,
            highlight_color: HexColor::parse(HIGHLIGHT_COLOR).unwrap_or(HexColor::new(255, 0, 0)),
        }
    }
}

/// Top level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sources: Vec<DataSourceSpec>,
    pub view: ViewConfig,
    pub paint: PaintConfig,
    pub color_seed: u32,
    pub color_stride: u32,
    /// Credential for the map provider. Passed through to the surface, never
    /// attached to GeoJSON requests.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            view: ViewConfig::default(),
            paint: PaintConfig::default(),
            color_seed: COLOR_SEED,
            color_stride: COLOR_STRIDE,
            access_token: None,
        }
    }
}

impl EngineConfig {
    /// Config with the default view and paint but the given sources.
    pub fn with_sources(sources: Vec<DataSourceSpec>) -> Self {
        Self {
            sources,
            ..Self::default()
        }
    }

    /// Parses and validates a JSON config document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| MapError::Config(format!("invalid config document: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Fills `access_token` from the first set variable in
    /// [`ACCESS_TOKEN_ENV_VARS`], keeping any token already present.
    pub fn with_access_token_from_env(mut self) -> Self {
        if self.access_token.is_none() {
            self.access_token = ACCESS_TOKEN_ENV_VARS
                .iter()
                .find_map(|name| std::env::var(name).ok())
                .filter(|token| !token.trim().is_empty());
        }
        self
    }

    /// Looks up a configured source by id.
    pub fn source(&self, source_id: &str) -> Option<&DataSourceSpec> {
        self.sources.iter().find(|s| s.id == source_id)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        for source in &self.sources {
            if source.id.trim().is_empty() {
                return Err(MapError::Config("source id must not be empty".to_string()));
            }
            if !seen.insert(source.id.as_str()) {
                return Err(MapError::Config(format!("duplicate source id '{}'", source.id)));
            }
        }

        if self.paint.circle_radius <= 0.0 || self.paint.line_width <= 0.0 {
            return Err(MapError::Config(
                "circle radius and line width must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.paint.fill_opacity) {
            return Err(MapError::Config(format!(
                "fill opacity {} outside 0..=1",
                self.paint.fill_opacity
            )));
        }
        if !self.view.center.is_valid() {
            return Err(MapError::Config("view center out of range".to_string()));
        }
        Ok(())
    }
}

fn default_sources() -> Vec<DataSourceSpec> {
    vec![
        DataSourceSpec::url(
            "dataSource1",
            "City Boundary",
            "https://geo.vbgov.com/mapservices/rest/services/Basemaps/Property_Information/MapServer/18/query?outFields=*&where=1%3D1&f=geojson",
        ),
        DataSourceSpec::url(
            "dataSource2",
            "Aircraft Noise Levels (AICUZ)",
            "https://geo.vbgov.com/mapservices/rest/services/Basemaps/AICUZ/MapServer/3/query?outFields=*&where=1%3D1&f=geojson",
        ),
        DataSourceSpec::url(
            "dataSource3",
            "Road Surfaces",
            "https://geo.vbgov.com/mapservices/rest/services/Basemaps/Structures_and_Physical_Features/MapServer/11/query?outFields=*&where=1%3D1&f=geojson",
        ),
    ]
}
