//! In-memory layers passed between geometry engine operations.
//!
//! The types encode where a layer sits in the transform chain:
//!
//! - [`Layer`]: raw feature class geometries (any kind).
//! - [`PolygonLayer`]: polygon features that may be multipart (buffer and
//!   dissolve outputs).
//! - [`SinglepartLayer`]: exploded polygons, one part per feature.
//! - [`Accumulator`]: the single layer every transform appends to.

use gdb_coverage_models::SpatialReference;
use geo::{BoundingRect, Geometry, MultiPolygon, Polygon, Rect};

use crate::EngineError;
use crate::vertices::vertex_count;

/// Geometries read from one feature class.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Qualified feature class name.
    pub name: String,
    /// Reference the coordinates are expressed in.
    pub spatial_ref: SpatialReference,
    /// Feature geometries, in container order.
    pub geometries: Vec<Geometry<f64>>,
}

impl Layer {
    /// Creates a layer.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        spatial_ref: SpatialReference,
        geometries: Vec<Geometry<f64>>,
    ) -> Self {
        Self {
            name: name.into(),
            spatial_ref,
            geometries,
        }
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    /// Returns `true` if the layer has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Bounding box of every geometry in the layer.
    #[must_use]
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.geometries
            .iter()
            .filter_map(|g| g.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    geo::coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                    geo::coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
                )
            })
    }

    /// Reinterprets a polygon feature class as a [`PolygonLayer`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] if a geometry is not areal.
    pub fn to_polygon_layer(&self) -> Result<PolygonLayer, EngineError> {
        let features = self
            .geometries
            .iter()
            .map(|geometry| {
                areal_parts(geometry).ok_or_else(|| EngineError::InvalidInput {
                    operation: "polygon",
                    layer: self.name.clone(),
                    message: format!("expected polygon geometry, found {}", type_name(geometry)),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PolygonLayer {
            name: self.name.clone(),
            spatial_ref: self.spatial_ref.clone(),
            features,
        })
    }
}

/// Polygon features; a feature may hold several parts.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonLayer {
    /// Layer name (e.g. `"rivers_buffer"`).
    pub name: String,
    /// Reference the coordinates are expressed in.
    pub spatial_ref: SpatialReference,
    /// One multipolygon per feature.
    pub features: Vec<MultiPolygon<f64>>,
}

impl PolygonLayer {
    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if the layer has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Total number of parts across all features.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.features.iter().map(|f| f.0.len()).sum()
    }

    /// Every part of every feature.
    pub fn parts(&self) -> impl Iterator<Item = &Polygon<f64>> {
        self.features.iter().flat_map(|f| f.0.iter())
    }
}

/// Singlepart polygons produced by an explode.
#[derive(Debug, Clone, PartialEq)]
pub struct SinglepartLayer {
    /// Layer name (e.g. `"rivers_finished"`).
    pub name: String,
    /// Reference the coordinates are expressed in.
    pub spatial_ref: SpatialReference,
    /// One polygon (exterior ring plus holes) per feature.
    pub polygons: Vec<Polygon<f64>>,
}

impl SinglepartLayer {
    /// Number of polygons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    /// Returns `true` if the layer has no polygons.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Vertex count (points minus rings) of every polygon, in order.
    #[must_use]
    pub fn vertex_counts(&self) -> Vec<usize> {
        self.polygons.iter().map(vertex_count).collect()
    }
}

/// The polygon layer every transform appends to.
///
/// Its reference is fixed at creation. Polygons are only ever added; the
/// finalize step reads it back as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    spatial_ref: SpatialReference,
    polygons: Vec<Polygon<f64>>,
}

impl Accumulator {
    /// Creates an empty accumulator in `spatial_ref`.
    #[must_use]
    pub const fn new(spatial_ref: SpatialReference) -> Self {
        Self {
            spatial_ref,
            polygons: Vec::new(),
        }
    }

    /// Reference fixed at creation.
    #[must_use]
    pub const fn spatial_ref(&self) -> &SpatialReference {
        &self.spatial_ref
    }

    /// Number of polygons appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    /// Returns `true` if nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Appended polygons, in append order.
    #[must_use]
    pub fn polygons(&self) -> &[Polygon<f64>] {
        &self.polygons
    }

    /// Appends every polygon of `layer` and returns how many were added.
    ///
    /// Degenerate polygons (an exterior ring with fewer than four
    /// coordinates) are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SpatialReferenceMismatch`] if `layer` is in
    /// a reference that is not compatible with the accumulator's.
    pub fn append(&mut self, layer: SinglepartLayer) -> Result<usize, EngineError> {
        if !self.spatial_ref.is_compatible(&layer.spatial_ref) {
            return Err(EngineError::SpatialReferenceMismatch {
                layer: layer.name,
                expected: describe(&self.spatial_ref),
                found: describe(&layer.spatial_ref),
            });
        }

        let before = self.polygons.len();
        let offered = layer.polygons.len();
        self.polygons.extend(
            layer
                .polygons
                .into_iter()
                .filter(|p| p.exterior().0.len() >= 4),
        );
        let appended = self.polygons.len() - before;

        if appended < offered {
            log::warn!(
                "{}: dropped {} degenerate polygons",
                layer.name,
                offered - appended
            );
        }

        Ok(appended)
    }

    /// The accumulated polygons as a polygon layer (one feature each).
    #[must_use]
    pub fn to_polygon_layer(&self, name: impl Into<String>) -> PolygonLayer {
        PolygonLayer {
            name: name.into(),
            spatial_ref: self.spatial_ref.clone(),
            features: self
                .polygons
                .iter()
                .map(|p| MultiPolygon::new(vec![p.clone()]))
                .collect(),
        }
    }
}

fn areal_parts(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        Geometry::GeometryCollection(gc) => {
            let mut parts = Vec::new();
            for g in gc {
                parts.extend(areal_parts(g)?.0);
            }
            Some(MultiPolygon::new(parts))
        }
        Geometry::Point(_)
        | Geometry::Line(_)
        | Geometry::LineString(_)
        | Geometry::MultiPoint(_)
        | Geometry::MultiLineString(_) => None,
    }
}

const fn type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

fn describe(spatial_ref: &SpatialReference) -> String {
    spatial_ref.name().unwrap_or("<unknown>").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, polygon};

    fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
            (x: x, y: y),
        ]
    }

    fn singlepart(name: &str, srs: SpatialReference, polygons: Vec<Polygon<f64>>) -> SinglepartLayer {
        SinglepartLayer {
            name: name.to_string(),
            spatial_ref: srs,
            polygons,
        }
    }

    #[test]
    fn accumulator_grows_monotonically() {
        let mut acc = Accumulator::new(SpatialReference::wgs84());

        let first = acc
            .append(singlepart(
                "a",
                SpatialReference::wgs84(),
                vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0)],
            ))
            .unwrap();
        let second = acc
            .append(singlepart(
                "b",
                SpatialReference::unknown(),
                vec![square(10.0, 10.0, 1.0)],
            ))
            .unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 1);
        assert_eq!(acc.len(), first + second);
    }

    #[test]
    fn accumulator_rejects_mismatched_reference() {
        let mut acc = Accumulator::new(SpatialReference::wgs84());
        let projected = SpatialReference::from_wkt(
            "PROJCS[\"Lambert\",GEOGCS[\"GCS_NAD83\"],UNIT[\"Meter\",1.0]]",
        );

        let err = acc
            .append(singlepart("lambert", projected, vec![square(0.0, 0.0, 1.0)]))
            .unwrap_err();

        assert!(matches!(err, EngineError::SpatialReferenceMismatch { .. }));
        assert!(acc.is_empty());
    }

    #[test]
    fn accumulator_drops_degenerate_polygons() {
        let mut acc = Accumulator::new(SpatialReference::unknown());
        let degenerate = Polygon::new(geo::LineString::new(vec![]), vec![]);

        let appended = acc
            .append(singlepart(
                "mixed",
                SpatialReference::unknown(),
                vec![degenerate, square(0.0, 0.0, 1.0)],
            ))
            .unwrap();

        assert_eq!(appended, 1);
    }

    #[test]
    fn polygon_layer_from_areal_geometries() {
        let layer = Layer::new(
            "parcels",
            SpatialReference::unknown(),
            vec![
                Geometry::Polygon(square(0.0, 0.0, 1.0)),
                Geometry::MultiPolygon(MultiPolygon::new(vec![
                    square(2.0, 0.0, 1.0),
                    square(4.0, 0.0, 1.0),
                ])),
            ],
        );

        let polygons = layer.to_polygon_layer().unwrap();
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons.part_count(), 3);
    }

    #[test]
    fn polygon_layer_rejects_points() {
        let layer = Layer::new(
            "wells",
            SpatialReference::unknown(),
            vec![Geometry::Point(point!(x: 1.0, y: 2.0))],
        );

        let err = layer.to_polygon_layer().unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[test]
    fn layer_bounding_rect_spans_all_geometries() {
        let layer = Layer::new(
            "wells",
            SpatialReference::unknown(),
            vec![
                Geometry::Point(point!(x: -1.0, y: 2.0)),
                Geometry::Point(point!(x: 3.0, y: -4.0)),
            ],
        );

        let rect = layer.bounding_rect().unwrap();
        assert!((rect.min().x - -1.0).abs() < f64::EPSILON);
        assert!((rect.max().y - 2.0).abs() < f64::EPSILON);
    }
}
