//! File Geodatabase backend through GDAL's `OpenFileGDB` driver.
//!
//! GDAL lists the feature classes of nested feature datasets alongside the
//! top-level ones, so no dataset walk is needed here.

use std::path::{Path, PathBuf};

use gdal::Dataset;
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::vector::{LayerAccess, geometry_type_to_name};
use gdb_coverage_engine::Layer;
use gdb_coverage_models::{FeatureClassRef, GeometryKind, SpatialReference};

use crate::{Catalogue, CatalogueError};

/// Reads feature classes from a `.gdb` directory.
pub struct GdalCatalogue {
    path: PathBuf,
    dataset: Dataset,
    reproject_to_wgs84: bool,
}

impl std::fmt::Debug for GdalCatalogue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GdalCatalogue")
            .field("path", &self.path)
            .field("reproject_to_wgs84", &self.reproject_to_wgs84)
            .finish_non_exhaustive()
    }
}

impl GdalCatalogue {
    /// Opens the geodatabase at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::UnsupportedContainer`] if GDAL cannot open
    /// it.
    pub fn open(path: &Path, reproject_to_wgs84: bool) -> Result<Self, CatalogueError> {
        let dataset = Dataset::open(path).map_err(|e| CatalogueError::UnsupportedContainer {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        log::info!(
            "Opened {} with GDAL driver {}",
            path.display(),
            dataset.driver().short_name()
        );

        Ok(Self {
            path: path.to_path_buf(),
            dataset,
            reproject_to_wgs84,
        })
    }
}

fn wgs84() -> Result<SpatialRef, gdal::errors::GdalError> {
    let mut srs = SpatialRef::from_epsg(4326)?;
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

impl Catalogue for GdalCatalogue {
    fn path(&self) -> &Path {
        &self.path
    }

    fn list_feature_classes(&self) -> Result<Vec<FeatureClassRef>, CatalogueError> {
        Ok(self
            .dataset
            .layers()
            .map(|layer| {
                let shape_type = layer
                    .defn()
                    .geom_fields()
                    .next()
                    .map_or_else(|| "None".to_string(), |field| {
                        geometry_type_to_name(field.field_type())
                    });
                let spatial_ref = layer
                    .spatial_ref()
                    .and_then(|srs| srs.to_wkt().ok())
                    .map_or_else(SpatialReference::unknown, SpatialReference::from_wkt);

                FeatureClassRef {
                    name: layer.name(),
                    kind: GeometryKind::from_shape_type(&shape_type),
                    spatial_ref,
                    path: None,
                }
            })
            .collect())
    }

    fn read(&self, class: &FeatureClassRef) -> Result<Layer, CatalogueError> {
        let read_err = |message: String| CatalogueError::Read {
            class: class.name.clone(),
            message,
        };

        let mut layer = self
            .dataset
            .layer_by_name(&class.name)
            .map_err(|e| read_err(e.to_string()))?;

        let transform = match (self.reproject_to_wgs84, layer.spatial_ref()) {
            (true, Some(source)) => {
                let target = wgs84().map_err(|e| read_err(e.to_string()))?;
                let mut source = source;
                source.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
                Some(CoordTransform::new(&source, &target).map_err(|e| read_err(e.to_string()))?)
            }
            _ => None,
        };

        let mut geometries = Vec::new();
        for feature in layer.features() {
            let Some(geometry) = feature.geometry() else {
                continue;
            };
            let geometry = match &transform {
                Some(ct) => geometry
                    .transform(ct)
                    .and_then(|g| g.to_geo())
                    .map_err(|e| read_err(e.to_string()))?,
                None => geometry.to_geo().map_err(|e| read_err(e.to_string()))?,
            };
            geometries.push(geometry);
        }

        let spatial_ref = if transform.is_some() {
            SpatialReference::wgs84()
        } else {
            class.spatial_ref.clone()
        };

        Ok(Layer::new(class.name.clone(), spatial_ref, geometries))
    }
}
