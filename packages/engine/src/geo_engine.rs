//! [`GeometryEngine`] backed by the `geo` crate.

use geo::{Buffer as _, MultiPolygon, unary_union};

use crate::frame::{LocalFrame, looks_geographic};
use crate::{BufferDissolve, EngineError, GeometryEngine, Layer, PolygonLayer};

/// Geometry engine using `geo`'s buffer and boolean operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoEngine;

impl GeoEngine {
    fn is_geographic(layer: &Layer) -> bool {
        layer.spatial_ref.is_geographic().unwrap_or_else(|| {
            layer
                .bounding_rect()
                .is_some_and(|rect| looks_geographic(&rect))
        })
    }
}

impl GeometryEngine for GeoEngine {
    fn buffer(
        &self,
        layer: &Layer,
        distance_m: f64,
        dissolve: BufferDissolve,
    ) -> Result<PolygonLayer, EngineError> {
        if !distance_m.is_finite() || distance_m < 0.0 {
            return Err(EngineError::InvalidInput {
                operation: "buffer",
                layer: layer.name.clone(),
                message: format!("buffer distance must be a non-negative number, got {distance_m}"),
            });
        }

        let geographic = Self::is_geographic(layer);
        let distance = if geographic {
            distance_m
        } else {
            distance_m / layer.spatial_ref.linear_unit_metres()
        };

        log::debug!(
            "{}: buffering {} geometries by {distance_m} m ({})",
            layer.name,
            layer.len(),
            if geographic { "local frame" } else { "planar" }
        );

        let buffered = layer
            .geometries
            .iter()
            .filter_map(|geometry| {
                let polygons = if geographic {
                    let frame = LocalFrame::centred_on(geometry)?;
                    frame.to_geographic(&frame.to_local(geometry).buffer(distance))
                } else {
                    geometry.buffer(distance)
                };
                (!polygons.0.is_empty()).then_some(polygons)
            })
            .collect::<Vec<_>>();

        let features = match dissolve {
            BufferDissolve::None => buffered,
            BufferDissolve::All => {
                let merged = unary_union(buffered.iter().flat_map(|mp| mp.0.iter()));
                if merged.0.is_empty() {
                    vec![]
                } else {
                    vec![merged]
                }
            }
        };

        Ok(PolygonLayer {
            name: format!("{}_buffer", layer.name),
            spatial_ref: layer.spatial_ref.clone(),
            features,
        })
    }

    fn dissolve(&self, layer: &PolygonLayer) -> Result<PolygonLayer, EngineError> {
        let merged: MultiPolygon<f64> = unary_union(layer.parts());

        log::debug!(
            "{}: dissolved {} parts into {}",
            layer.name,
            layer.part_count(),
            merged.0.len()
        );

        Ok(PolygonLayer {
            name: format!("{}_dissolved", layer.name),
            spatial_ref: layer.spatial_ref.clone(),
            features: if merged.0.is_empty() {
                vec![]
            } else {
                vec![merged]
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex_count;
    use gdb_coverage_models::SpatialReference;
    use geo::{BoundingRect as _, Geometry, Polygon, line_string, point, polygon};

    fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
        ]
    }

    fn polygon_layer(polygons: Vec<Polygon<f64>>) -> PolygonLayer {
        PolygonLayer {
            name: "parcels".to_string(),
            spatial_ref: SpatialReference::unknown(),
            features: polygons
                .into_iter()
                .map(|p| MultiPolygon::new(vec![p]))
                .collect(),
        }
    }

    #[test]
    fn nearby_points_merge_into_one_polygon() {
        // ~1 km apart in latitude
        let layer = Layer::new(
            "wells",
            SpatialReference::wgs84(),
            vec![
                Geometry::Point(point!(x: -75.7, y: 45.4)),
                Geometry::Point(point!(x: -75.7, y: 45.409)),
            ],
        );

        let buffered = GeoEngine.buffer(&layer, 5000.0, BufferDissolve::All).unwrap();
        let exploded = GeoEngine.explode(&buffered);

        assert_eq!(buffered.len(), 1);
        assert_eq!(exploded.len(), 1);
        assert!(vertex_count(&exploded.polygons[0]) >= 3);
    }

    #[test]
    fn distant_points_stay_separate() {
        let layer = Layer::new(
            "wells",
            SpatialReference::wgs84(),
            vec![
                Geometry::Point(point!(x: -75.7, y: 45.4)),
                Geometry::Point(point!(x: -73.5, y: 45.5)),
            ],
        );

        let buffered = GeoEngine.buffer(&layer, 5000.0, BufferDissolve::All).unwrap();

        assert_eq!(buffered.len(), 1);
        assert_eq!(buffered.part_count(), 2);
    }

    #[test]
    fn line_buffers_without_dissolve_keep_one_feature_per_line() {
        let layer = Layer::new(
            "roads",
            SpatialReference::unknown(),
            vec![
                Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0)]),
                Geometry::LineString(line_string![(x: 0.0, y: 100.0), (x: 1000.0, y: 100.0)]),
            ],
        );

        let buffered = GeoEngine.buffer(&layer, 5000.0, BufferDissolve::None).unwrap();
        assert_eq!(buffered.len(), 2);

        let dissolved = GeoEngine.dissolve(&buffered).unwrap();
        assert_eq!(dissolved.len(), 1);
        assert_eq!(dissolved.part_count(), 1);
    }

    #[test]
    fn projected_distance_is_converted_to_layer_units() {
        let feet = SpatialReference::from_wkt(
            "PROJCS[\"NAD83_StatePlane\",GEOGCS[\"GCS_North_American_1983\",\
             UNIT[\"Degree\",0.0174532925199433]],UNIT[\"Foot_US\",0.3048006096012192]]",
        );
        let layer = Layer::new(
            "wells",
            feet,
            vec![Geometry::Point(point!(x: 500_000.0, y: 500_000.0))],
        );

        // 10 000 US survey feet
        let buffered = GeoEngine
            .buffer(&layer, 3048.006_096, BufferDissolve::None)
            .unwrap();
        let rect = buffered.features[0].bounding_rect().unwrap();

        assert!((rect.width() - 20_000.0).abs() < 200.0, "{}", rect.width());
    }

    #[test]
    fn negative_distance_is_rejected() {
        let layer = Layer::new(
            "wells",
            SpatialReference::unknown(),
            vec![Geometry::Point(point!(x: 0.0, y: 0.0))],
        );

        let err = GeoEngine
            .buffer(&layer, -1.0, BufferDissolve::All)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { operation: "buffer", .. }));
    }

    #[test]
    fn disjoint_polygons_dissolve_to_two_parts() {
        let layer = polygon_layer(vec![square(0.0, 0.0, 1.0), square(5.0, 5.0, 1.0)]);

        let dissolved = GeoEngine.dissolve(&layer).unwrap();
        let exploded = GeoEngine.explode(&dissolved);

        assert_eq!(dissolved.len(), 1);
        assert_eq!(exploded.len(), 2);
        assert!(exploded.vertex_counts().iter().all(|&n| n >= 3));
    }

    #[test]
    fn overlapping_polygons_dissolve_to_one_part() {
        let layer = polygon_layer(vec![square(0.0, 0.0, 2.0), square(1.0, 1.0, 2.0)]);

        let exploded = GeoEngine.explode(&GeoEngine.dissolve(&layer).unwrap());

        assert_eq!(exploded.len(), 1);
        assert!(exploded.vertex_counts()[0] >= 8);
    }

    #[test]
    fn dissolving_nothing_yields_an_empty_layer() {
        let dissolved = GeoEngine.dissolve(&polygon_layer(vec![])).unwrap();
        assert!(dissolved.is_empty());
    }
}
