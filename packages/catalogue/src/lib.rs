#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Feature class enumeration for extracted geodatabase containers.
//!
//! A container is either a File Geodatabase (`*.gdb` directory, read
//! through GDAL when the `gdal` feature is enabled) or a directory of
//! shapefiles, where each sub-directory plays the role of a feature
//! dataset. Both are exposed through the [`Catalogue`] trait.

#[cfg(feature = "gdal")]
pub mod fgdb;
pub mod reproject;
pub mod shp;

use std::path::{Path, PathBuf};

use gdb_coverage_engine::Layer;
use gdb_coverage_models::FeatureClassRef;

pub use reproject::{ReprojectError, ToWgs84};
pub use shp::ShapefileCatalogue;

/// Whether this build can read File Geodatabase (`*.gdb`) containers.
pub const FILE_GEODATABASE_SUPPORTED: bool = cfg!(feature = "gdal");

/// How deep [`locate_container`] searches below the extraction directory.
const MAX_SEARCH_DEPTH: usize = 3;

/// A geodatabase container opened for reading.
pub trait Catalogue {
    /// Container location on disk.
    fn path(&self) -> &Path;

    /// Every feature class in the container, including those nested in
    /// feature datasets. Order is whatever the backend reports.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be listed.
    fn list_feature_classes(&self) -> Result<Vec<FeatureClassRef>, CatalogueError>;

    /// Reads every geometry of `class`. Features without geometry are
    /// skipped; Z and M values are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the class cannot be read or a geometry cannot
    /// be decoded.
    fn read(&self, class: &FeatureClassRef) -> Result<Layer, CatalogueError>;
}

/// Errors from container discovery and reading.
#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    /// No container was found where one was expected.
    #[error("No geodatabase container found in {0}")]
    ContainerNotFound(String),

    /// The container format cannot be read by this build.
    #[error("Unsupported container {path}: {message}")]
    UnsupportedContainer {
        /// Container path.
        path: String,
        /// Why it cannot be read.
        message: String,
    },

    /// A feature class could not be read.
    #[error("Failed to read feature class {class}: {message}")]
    Read {
        /// Feature class name.
        class: String,
        /// Reader message.
        message: String,
    },

    /// A projected feature class could not be converted to WGS 84.
    #[error("Failed to reproject feature class {class}: {source}")]
    Reproject {
        /// Feature class name.
        class: String,
        /// Reprojection failure.
        source: ReprojectError,
    },

    /// I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Finds the container inside `extract_dir`.
///
/// A configured name is resolved directly. Otherwise the first `*.gdb`
/// directory (by path order) within a few levels is used, falling back to
/// `extract_dir` itself when it holds shapefiles.
///
/// # Errors
///
/// Returns [`CatalogueError::ContainerNotFound`] if nothing usable exists.
pub fn locate_container(
    extract_dir: &Path,
    configured: Option<&str>,
) -> Result<PathBuf, CatalogueError> {
    if let Some(name) = configured {
        let path = extract_dir.join(name);
        return if path.exists() {
            Ok(path)
        } else {
            Err(CatalogueError::ContainerNotFound(path.display().to_string()))
        };
    }

    let mut found = Vec::new();
    let mut has_shapefiles = false;
    walk(extract_dir, 0, &mut found, &mut has_shapefiles)?;
    found.sort();

    if let Some(gdb) = found.into_iter().next() {
        log::info!("Found geodatabase container {}", gdb.display());
        return Ok(gdb);
    }

    if has_shapefiles {
        log::info!("Using shapefile directory {}", extract_dir.display());
        return Ok(extract_dir.to_path_buf());
    }

    Err(CatalogueError::ContainerNotFound(
        extract_dir.display().to_string(),
    ))
}

fn walk(
    dir: &Path,
    depth: usize,
    gdbs: &mut Vec<PathBuf>,
    has_shapefiles: &mut bool,
) -> Result<(), CatalogueError> {
    let entries = std::fs::read_dir(dir).map_err(|e| CatalogueError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;

    for entry in entries {
        let path = entry
            .map_err(|e| CatalogueError::Io {
                path: dir.display().to_string(),
                source: e,
            })?
            .path();

        if path.is_dir() {
            if is_file_geodatabase(&path) {
                gdbs.push(path);
            } else if depth < MAX_SEARCH_DEPTH {
                walk(&path, depth + 1, gdbs, has_shapefiles)?;
            }
        } else if has_extension(&path, "shp") {
            *has_shapefiles = true;
        }
    }

    Ok(())
}

/// Opens `path` with the backend matching its format.
///
/// `reproject_to_wgs84` asks the backend to return projected classes in
/// WGS 84 coordinates.
///
/// # Errors
///
/// Returns [`CatalogueError::UnsupportedContainer`] for a File Geodatabase
/// when the `gdal` feature is disabled, or if the container cannot be
/// opened.
pub fn open_catalogue(
    path: &Path,
    reproject_to_wgs84: bool,
) -> Result<Box<dyn Catalogue>, CatalogueError> {
    if is_file_geodatabase(path) {
        #[cfg(feature = "gdal")]
        {
            return Ok(Box::new(fgdb::GdalCatalogue::open(path, reproject_to_wgs84)?));
        }
        #[cfg(not(feature = "gdal"))]
        {
            return Err(CatalogueError::UnsupportedContainer {
                path: path.display().to_string(),
                message: "File Geodatabase support requires the `gdal` feature".to_string(),
            });
        }
    }

    Ok(Box::new(
        ShapefileCatalogue::open(path)?.with_reprojection(reproject_to_wgs84),
    ))
}

/// Returns `true` for a `*.gdb` directory.
#[must_use]
pub fn is_file_geodatabase(path: &Path) -> bool {
    path.is_dir() && has_extension(path, "gdb")
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}
