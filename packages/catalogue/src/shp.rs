//! Shapefile directory backend.
//!
//! Every `*.shp` below the container directory is a feature class. A
//! shapefile inside a sub-directory belongs to that feature dataset and
//! is named `dataset/class`. The spatial reference is read from the
//! sibling `.prj` file when one exists. Projected classes can be
//! reprojected to WGS 84 while reading.

use std::path::{Path, PathBuf};

use gdb_coverage_engine::Layer;
use gdb_coverage_models::{FeatureClassRef, GeometryKind, SpatialReference};
use shapefile::{Shape, ShapeReader};

use crate::reproject::ToWgs84;
use crate::{Catalogue, CatalogueError, has_extension};

/// Reads feature classes from a directory of shapefiles.
#[derive(Debug, Clone)]
pub struct ShapefileCatalogue {
    root: PathBuf,
    reproject_to_wgs84: bool,
}

impl ShapefileCatalogue {
    /// Opens the directory at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::ContainerNotFound`] if `root` is not a
    /// directory.
    pub fn open(root: &Path) -> Result<Self, CatalogueError> {
        if !root.is_dir() {
            return Err(CatalogueError::ContainerNotFound(
                root.display().to_string(),
            ));
        }
        Ok(Self {
            root: root.to_path_buf(),
            reproject_to_wgs84: false,
        })
    }

    /// Returns projected classes in WGS 84 degrees when `enabled`.
    #[must_use]
    pub const fn with_reprojection(mut self, enabled: bool) -> Self {
        self.reproject_to_wgs84 = enabled;
        self
    }

    fn class_name(&self, shp: &Path) -> String {
        let relative = shp.strip_prefix(&self.root).unwrap_or(shp);
        relative
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Catalogue for ShapefileCatalogue {
    fn path(&self) -> &Path {
        &self.root
    }

    fn list_feature_classes(&self) -> Result<Vec<FeatureClassRef>, CatalogueError> {
        let mut shapefiles = Vec::new();
        collect_shapefiles(&self.root, &mut shapefiles)?;
        shapefiles.sort();

        shapefiles
            .into_iter()
            .map(|shp| {
                let name = self.class_name(&shp);
                let reader = ShapeReader::from_path(&shp).map_err(|e| CatalogueError::Read {
                    class: name.clone(),
                    message: e.to_string(),
                })?;
                let shape_type = format!("{:?}", reader.header().shape_type);

                Ok(FeatureClassRef {
                    kind: GeometryKind::from_shape_type(&shape_type),
                    spatial_ref: read_prj(&shp)?,
                    path: Some(shp),
                    name,
                })
            })
            .collect()
    }

    fn read(&self, class: &FeatureClassRef) -> Result<Layer, CatalogueError> {
        let path = class
            .path
            .clone()
            .unwrap_or_else(|| self.root.join(format!("{}.shp", class.name)));
        let read_err = |message: String| CatalogueError::Read {
            class: class.name.clone(),
            message,
        };

        let mut reader = ShapeReader::from_path(&path).map_err(|e| read_err(e.to_string()))?;

        let mut geometries = Vec::new();
        let mut null_shapes = 0usize;
        for shape in reader.iter_shapes() {
            let shape = shape.map_err(|e| read_err(e.to_string()))?;
            if matches!(shape, Shape::NullShape) {
                null_shapes += 1;
                continue;
            }
            let geometry =
                geo::Geometry::<f64>::try_from(shape).map_err(|e| read_err(e.to_string()))?;
            geometries.push(geometry);
        }

        if null_shapes > 0 {
            log::debug!("{}: skipped {null_shapes} null shapes", class.name);
        }

        let reprojection = if self.reproject_to_wgs84 {
            ToWgs84::from_spatial_ref(&class.spatial_ref).map_err(|source| {
                CatalogueError::Reproject {
                    class: class.name.clone(),
                    source,
                }
            })?
        } else {
            None
        };

        let Some(to_wgs84) = reprojection else {
            return Ok(Layer::new(
                class.name.clone(),
                class.spatial_ref.clone(),
                geometries,
            ));
        };

        log::info!("{}: reprojecting {} geometries to WGS 84", class.name, geometries.len());
        let geometries = geometries
            .iter()
            .map(|g| to_wgs84.geometry(g))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| CatalogueError::Reproject {
                class: class.name.clone(),
                source,
            })?;

        Ok(Layer::new(
            class.name.clone(),
            SpatialReference::wgs84(),
            geometries,
        ))
    }
}

fn collect_shapefiles(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), CatalogueError> {
    let io_err = |source| CatalogueError::Io {
        path: dir.display().to_string(),
        source,
    };

    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_dir() {
            collect_shapefiles(&path, out)?;
        } else if has_extension(&path, "shp") {
            out.push(path);
        }
    }

    Ok(())
}

fn read_prj(shp: &Path) -> Result<SpatialReference, CatalogueError> {
    let prj = shp.with_extension("prj");
    if !prj.exists() {
        return Ok(SpatialReference::unknown());
    }
    std::fs::read_to_string(&prj)
        .map(SpatialReference::from_wkt)
        .map_err(|e| CatalogueError::Io {
            path: prj.display().to_string(),
            source: e,
        })
}
