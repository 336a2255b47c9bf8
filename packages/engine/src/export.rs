//! GeoJSON export of engine layers.
//!
//! Output documents are pretty-printed feature collections. Polygons are
//! written with RFC 7946 winding (counter-clockwise shells, clockwise
//! holes) and 2D coordinates only.

use std::io::{BufWriter, Write as _};
use std::path::Path;

use geo::algorithm::orient::{Direction, Orient as _};
use geojson::{Feature, FeatureCollection, JsonObject, feature::Id};

use crate::vertices::vertex_count;
use crate::{EngineError, PolygonLayer, SinglepartLayer};

/// Name of the per-feature vertex count property.
pub const VERTICES_PROPERTY: &str = "VERTICES";

/// Totals of an exported singlepart layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Features written.
    pub polygon_count: usize,
    /// Sum of `VERTICES` over all features.
    pub total_vertices: usize,
}

/// Writes `layer` to `path`, one feature per polygon with a `VERTICES`
/// property. Feature ids are 1-based.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_singlepart_layer(
    layer: &SinglepartLayer,
    path: &Path,
) -> Result<ExportStats, EngineError> {
    let mut stats = ExportStats::default();

    let features = layer
        .polygons
        .iter()
        .enumerate()
        .map(|(i, polygon)| {
            let vertices = vertex_count(polygon);
            stats.polygon_count += 1;
            stats.total_vertices += vertices;

            let mut properties = JsonObject::new();
            properties.insert(VERTICES_PROPERTY.to_string(), vertices.into());

            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(
                    &polygon.orient(Direction::Default),
                ))),
                id: Some(Id::Number((i + 1).into())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect::<Vec<_>>();

    write_collection(features, path)?;

    log::info!(
        "Wrote {} polygons ({} vertices) to {}",
        stats.polygon_count,
        stats.total_vertices,
        path.display()
    );

    Ok(stats)
}

/// Writes a (possibly multipart) polygon layer to `path`, one feature per
/// layer feature with a `PARTS` property. Used for intermediate artifacts.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_polygon_layer(layer: &PolygonLayer, path: &Path) -> Result<(), EngineError> {
    let features = layer
        .features
        .iter()
        .enumerate()
        .map(|(i, multi)| {
            let mut properties = JsonObject::new();
            properties.insert("PARTS".to_string(), multi.0.len().into());

            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(
                    &multi.orient(Direction::Default),
                ))),
                id: Some(Id::Number((i + 1).into())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect::<Vec<_>>();

    write_collection(features, path)?;
    log::debug!("Wrote {} ({} features)", path.display(), layer.len());

    Ok(())
}

fn write_collection(features: Vec<Feature>, path: &Path) -> Result<(), EngineError> {
    let io_err = |source| EngineError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| EngineError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };

    let file = std::fs::File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &collection)?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)?;

    Ok(())
}
