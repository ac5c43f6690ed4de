//! Pointer hit-testing against feature geometry
//!
//! Points and lines are hit within `tolerance` (in coordinate units, i.e.
//! degrees); polygons are hit when they contain the pointer or their
//! boundary lies within `tolerance`.

use geo::{Contains, EuclideanDistance};
use geo_types::{Geometry, LineString, Point, Polygon};

/// Whether `pointer` hits `geometry`
pub fn hit_test(geometry: &Geometry<f64>, pointer: &Point<f64>, tolerance: f64) -> bool {
    match geometry {
        Geometry::Point(point) => hits_point(point, pointer, tolerance),
        Geometry::MultiPoint(points) => points.iter().any(|p| hits_point(p, pointer, tolerance)),
        Geometry::LineString(line) => hits_line(line, pointer, tolerance),
        Geometry::MultiLineString(lines) => {
            lines.iter().any(|line| hits_line(line, pointer, tolerance))
        }
        Geometry::Polygon(polygon) => hits_polygon(polygon, pointer, tolerance),
        Geometry::MultiPolygon(polygons) => polygons
            .iter()
            .any(|polygon| hits_polygon(polygon, pointer, tolerance)),
        Geometry::GeometryCollection(collection) => collection
            .iter()
            .any(|geometry| hit_test(geometry, pointer, tolerance)),
        _ => false,
    }
}

fn hits_point(point: &Point<f64>, pointer: &Point<f64>, tolerance: f64) -> bool {
    point.euclidean_distance(pointer) <= tolerance
}

fn hits_line(line: &LineString<f64>, pointer: &Point<f64>, tolerance: f64) -> bool {
    match line.0.len() {
        0 => false,
        1 => hits_point(&Point::from(line.0[0]), pointer, tolerance),
        _ => pointer.euclidean_distance(line) <= tolerance,
    }
}

fn hits_polygon(polygon: &Polygon<f64>, pointer: &Point<f64>, tolerance: f64) -> bool {
    polygon.contains(pointer) || hits_line(polygon.exterior(), pointer, tolerance)
}
