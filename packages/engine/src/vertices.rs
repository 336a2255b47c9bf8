//! Vertex counting for output polygons.

use geo::Polygon;

/// Number of distinct vertices of `polygon`: total point count minus the
/// number of rings, since every closed ring repeats its first point.
#[must_use]
pub fn vertex_count(polygon: &Polygon<f64>) -> usize {
    let points = polygon.exterior().0.len()
        + polygon
            .interiors()
            .iter()
            .map(|ring| ring.0.len())
            .sum::<usize>();
    let rings = 1 + polygon.interiors().len();
    points.saturating_sub(rings)
}
