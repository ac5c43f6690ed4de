//! Paint styles for derived layers
//!
//! Styles are plain data that a map surface can either evaluate directly
//! ([`PaintStyle::color_for`]) or forward as a map-style JSON paint object
//! ([`PaintStyle::to_json`]).

use crate::core::config::PaintConfig;
use crate::core::constants::HOVER_STATE_KEY;
use crate::layers::descriptor::RenderType;
use crate::style::color::HexColor;
use crate::surface::FeatureState;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// The color a layer paints a feature with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorExpression {
    Constant(HexColor),
    /// `highlight` while the feature's hover flag is set, else `base`
    HoverCase { highlight: HexColor, base: HexColor },
}

impl ColorExpression {
    pub fn hover_case(highlight: HexColor, base: HexColor) -> Self {
        ColorExpression::HoverCase { highlight, base }
    }

    pub fn evaluate(&self, state: &FeatureState) -> HexColor {
        match self {
            ColorExpression::Constant(color) => *color,
            ColorExpression::HoverCase { highlight, base } => {
                if state.hover {
                    *highlight
                } else {
                    *base
                }
            }
        }
    }

    /// Color used when the feature carries no state
    pub fn base(&self) -> HexColor {
        match self {
            ColorExpression::Constant(color) => *color,
            ColorExpression::HoverCase { base, .. } => *base,
        }
    }

    /// Map-style expression form
    pub fn to_json(&self) -> Value {
        match self {
            ColorExpression::Constant(color) => json!(color.to_string()),
            ColorExpression::HoverCase { highlight, base } => json!([
                "case",
                ["boolean", ["feature-state", HOVER_STATE_KEY], false],
                highlight.to_string(),
                base.to_string()
            ]),
        }
    }
}

/// Paint properties per render type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaintStyle {
    Circle { radius: f64, color: ColorExpression },
    Line { width: f64, color: ColorExpression },
    Fill { color: ColorExpression, opacity: f64 },
}

impl PaintStyle {
    /// Paint for `render_type` in `color`, highlighted on hover
    pub fn for_render_type(render_type: RenderType, color: HexColor, config: &PaintConfig) -> Self {
        let color = ColorExpression::hover_case(config.highlight_color, color);
        match render_type {
            RenderType::PointMarker => PaintStyle::Circle {
                radius: config.circle_radius,
                color,
            },
            RenderType::Line => PaintStyle::Line {
                width: config.line_width,
                color,
            },
            RenderType::Fill => PaintStyle::Fill {
                color,
                opacity: config.fill_opacity,
            },
        }
    }

    pub fn color(&self) -> &ColorExpression {
        match self {
            PaintStyle::Circle { color, .. }
            | PaintStyle::Line { color, .. }
            | PaintStyle::Fill { color, .. } => color,
        }
    }

    /// Resolved color of a feature in the given state
    pub fn color_for(&self, state: &FeatureState) -> HexColor {
        self.color().evaluate(state)
    }

    /// Fill opacity; 1.0 for non-fill styles
    pub fn opacity(&self) -> f64 {
        match self {
            PaintStyle::Fill { opacity, .. } => *opacity,
            _ => 1.0,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut paint = Map::new();
        match self {
            PaintStyle::Circle { radius, color } => {
                paint.insert("circle-radius".into(), json!(radius));
                paint.insert("circle-color".into(), color.to_json());
            }
            PaintStyle::Line { width, color } => {
                paint.insert("line-width".into(), json!(width));
                paint.insert("line-color".into(), color.to_json());
            }
            PaintStyle::Fill { color, opacity } => {
                paint.insert("fill-color".into(), color.to_json());
                paint.insert("fill-opacity".into(), json!(opacity));
            }
        }
        Value::Object(paint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hover_case_evaluation() {
        let base = HexColor::from_u24(0x008d75);
        let highlight = HexColor::new(255, 0, 0);
        let expr = ColorExpression::hover_case(highlight, base);

        assert_eq!(expr.evaluate(&FeatureState::default()), base);
        assert_eq!(expr.evaluate(&FeatureState { hover: true }), highlight);
        assert_eq!(expr.base(), base);
    }

    #[test]
    fn test_fill_paint_json() {
        let paint = PaintStyle::for_render_type(
            RenderType::Fill,
            HexColor::from_u24(0x008d75),
            &PaintConfig::default(),
        );
        let json = paint.to_json();

        assert_eq!(json["fill-opacity"], 0.25);
        assert_eq!(json["fill-color"][0], "case");
        assert_eq!(json["fill-color"][1][1][1], "hover");
        assert_eq!(json["fill-color"][2], "#ff0000");
        assert_eq!(json["fill-color"][3], "#008d75");
        assert_eq!(paint.opacity(), 0.25);
    }

    #[test]
    fn test_circle_and_line_paint_json() {
        let config = PaintConfig::default();
        let circle =
            PaintStyle::for_render_type(RenderType::PointMarker, HexColor::new(1, 2, 3), &config);
        assert_eq!(circle.to_json()["circle-radius"], 5.0);
        assert_eq!(circle.opacity(), 1.0);

        let line = PaintStyle::for_render_type(RenderType::Line, HexColor::new(1, 2, 3), &config);
        assert_eq!(line.to_json()["line-width"], 2.0);
        assert_eq!(line.color_for(&FeatureState::default()), HexColor::new(1, 2, 3));
    }
}
