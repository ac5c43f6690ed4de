//! Paints a [`MemorySurface`] and feeds pointer input back into it

use crate::core::geo::{degrees_per_pixel, project, unproject, LatLng};
use crate::engine::LayerEngine;
use crate::style::paint::PaintStyle;
use crate::surface::memory::MemorySurface;
use crate::surface::{CursorStyle, FeatureRef, FeatureState, MapSurface};
use egui::{Color32, CursorIcon, Painter, Pos2, Response, Sense, Shape, Stroke, Ui};
use geo_types::{Coord, Geometry, LineString, Polygon};

#[derive(Debug, Clone)]
pub struct CanvasOptions {
    pub background: Color32,
    /// Pointer hit radius in screen pixels
    pub hit_radius: f32,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for CanvasOptions {
    fn default() -> Self {
        Self {
            background: Color32::from_rgb(242, 242, 240),
            hit_radius: 6.0,
            min_zoom: 1.0,
            max_zoom: 18.0,
        }
    }
}

/// Maps lat/lng to screen positions for one frame
#[derive(Debug, Clone, Copy)]
struct ScreenProjection {
    zoom: f64,
    center: (f64, f64),
    origin: Pos2,
}

impl ScreenProjection {
    fn new(center: LatLng, zoom: f64, origin: Pos2) -> Self {
        Self {
            zoom,
            center: project(center, zoom),
            origin,
        }
    }

    fn to_screen(&self, coord: Coord<f64>) -> Pos2 {
        let (x, y) = project(LatLng::new(coord.y, coord.x), self.zoom);
        Pos2::new(
            self.origin.x + (x - self.center.0) as f32,
            self.origin.y + (y - self.center.1) as f32,
        )
    }

    fn to_lat_lng(&self, pos: Pos2) -> LatLng {
        unproject(
            self.center.0 + (pos.x - self.origin.x) as f64,
            self.center.1 + (pos.y - self.origin.y) as f64,
            self.zoom,
        )
    }
}

/// Draws every visible layer of the engine's surface into the remaining space
/// of `ui`, then forwards dragging (pan) and hovering (feature highlight) to
/// the surface and pumps the resulting events through the engine.
pub fn map_canvas(
    ui: &mut Ui,
    engine: &mut LayerEngine<MemorySurface>,
    options: &CanvasOptions,
) -> Response {
    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
    let rect = response.rect;
    painter.rect_filled(rect, 0.0, options.background);

    let projection = ScreenProjection::new(
        engine.surface().center(),
        engine.surface().zoom(),
        rect.center(),
    );
    paint_layers(&painter.with_clip_rect(rect), engine.surface(), &projection);

    if response.dragged() {
        let delta = response.drag_delta();
        let center = projection.to_lat_lng(rect.center() - delta);
        let zoom = projection.zoom;
        engine.surface_mut().set_view(center, zoom);
    }

    match response.hover_pos() {
        Some(pos) if !response.dragged() => {
            let position = projection.to_lat_lng(pos);
            let tolerance = degrees_per_pixel(position, projection.zoom) * options.hit_radius as f64;
            engine.surface_mut().pointer_move(position, tolerance);
        }
        Some(_) => {}
        None => engine.surface_mut().pointer_exit(),
    }
    engine.pump_events();

    if engine.surface().cursor() == CursorStyle::Pointer {
        ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
    } else if response.dragged() {
        ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
    }

    response
}

/// Steps the surface zoom by `delta`, clamped to the canvas limits
pub fn zoom_by(engine: &mut LayerEngine<MemorySurface>, delta: f64, options: &CanvasOptions) {
    let center = engine.surface().center();
    let zoom = (engine.surface().zoom() + delta).clamp(options.min_zoom, options.max_zoom);
    engine.surface_mut().set_view(center, zoom);
}

fn paint_layers(painter: &Painter, surface: &MemorySurface, projection: &ScreenProjection) {
    for layer in surface.render_layers() {
        let source_id = &layer.descriptor.source_id;
        for (feature, shape) in &layer.features {
            let state = feature
                .id
                .clone()
                .map(|id| surface.feature_state(&FeatureRef::new(source_id.as_str(), id)))
                .unwrap_or_default();
            paint_geometry(painter, shape, &layer.descriptor.paint, state, projection);
        }
    }
}

fn paint_geometry(
    painter: &Painter,
    geometry: &Geometry<f64>,
    paint: &PaintStyle,
    state: FeatureState,
    projection: &ScreenProjection,
) {
    let color = Color32::from(paint.color_for(&state));

    match (geometry, paint) {
        (Geometry::Point(point), PaintStyle::Circle { radius, .. }) => {
            painter.circle_filled(projection.to_screen(point.0), *radius as f32, color);
        }
        (Geometry::MultiPoint(points), PaintStyle::Circle { radius, .. }) => {
            for point in points {
                painter.circle_filled(projection.to_screen(point.0), *radius as f32, color);
            }
        }
        (Geometry::LineString(line), PaintStyle::Line { width, .. }) => {
            paint_line(painter, line, Stroke::new(*width as f32, color), projection);
        }
        (Geometry::MultiLineString(lines), PaintStyle::Line { width, .. }) => {
            for line in lines {
                paint_line(painter, line, Stroke::new(*width as f32, color), projection);
            }
        }
        (Geometry::Polygon(polygon), PaintStyle::Fill { opacity, .. }) => {
            paint_polygon(painter, polygon, color, *opacity, projection);
        }
        (Geometry::MultiPolygon(polygons), PaintStyle::Fill { opacity, .. }) => {
            for polygon in polygons {
                paint_polygon(painter, polygon, color, *opacity, projection);
            }
        }
        (Geometry::GeometryCollection(collection), _) => {
            for child in collection {
                paint_geometry(painter, child, paint, state, projection);
            }
        }
        _ => {}
    }
}

fn paint_line(painter: &Painter, line: &LineString<f64>, stroke: Stroke, projection: &ScreenProjection) {
    let points: Vec<Pos2> = line.coords().map(|c| projection.to_screen(*c)).collect();
    if points.len() >= 2 {
        painter.add(Shape::line(points, stroke));
    }
}

// egui only fills convex shapes; concave rings get an approximate fill under
// an exact outline.
fn paint_polygon(
    painter: &Painter,
    polygon: &Polygon<f64>,
    color: Color32,
    opacity: f64,
    projection: &ScreenProjection,
) {
    let points: Vec<Pos2> = polygon
        .exterior()
        .coords()
        .map(|c| projection.to_screen(*c))
        .collect();
    if points.len() < 3 {
        return;
    }

    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    let fill = Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha);
    painter.add(Shape::convex_polygon(points.clone(), fill, Stroke::NONE));
    painter.add(Shape::closed_line(points, Stroke::new(1.0, color)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_projection_centers_view() {
        let center = LatLng::new(36.745131, -76.045441);
        let projection = ScreenProjection::new(center, 10.0, Pos2::new(400.0, 300.0));

        let pos = projection.to_screen(Coord {
            x: center.lng,
            y: center.lat,
        });
        assert!((pos.x - 400.0).abs() < 0.01);
        assert!((pos.y - 300.0).abs() < 0.01);

        let back = projection.to_lat_lng(Pos2::new(400.0, 300.0));
        assert!((back.lat - center.lat).abs() < 1e-6);
        assert!((back.lng - center.lng).abs() < 1e-6);
    }

    #[test]
    fn test_north_is_up() {
        let center = LatLng::new(0.0, 0.0);
        let projection = ScreenProjection::new(center, 4.0, Pos2::new(0.0, 0.0));
        let north = projection.to_screen(Coord { x: 0.0, y: 10.0 });
        let east = projection.to_screen(Coord { x: 10.0, y: 0.0 });

        assert!(north.y < 0.0);
        assert!(east.x > 0.0);
    }
}
