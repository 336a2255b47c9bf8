#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geometry engine for the coverage pipeline.
//!
//! The pipeline never touches geometry algorithms directly. It calls the
//! five operations of [`GeometryEngine`] (buffer, dissolve, explode,
//! append, export), so it can run against [`GeoEngine`] in production and
//! a recording fake in tests.

pub mod export;
pub mod frame;
pub mod geo_engine;
pub mod layer;
pub mod vertices;

use std::path::Path;

pub use export::{ExportStats, write_polygon_layer, write_singlepart_layer};
pub use geo_engine::GeoEngine;
pub use layer::{Accumulator, Layer, PolygonLayer, SinglepartLayer};
pub use vertices::vertex_count;

/// How buffers of one layer are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferDissolve {
    /// One output feature per input feature.
    None,
    /// All buffers merged into a single feature.
    All,
}

/// Errors from geometry engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The operation cannot be applied to this input.
    #[error("{operation} failed on {layer}: {message}")]
    InvalidInput {
        /// Operation name (`buffer`, `dissolve`, ...).
        operation: &'static str,
        /// Layer name.
        layer: String,
        /// What was wrong.
        message: String,
    },

    /// Appended layer is in a different reference than the accumulator.
    #[error("Cannot append {layer}: expected {expected}, found {found}")]
    SpatialReferenceMismatch {
        /// Layer name.
        layer: String,
        /// Accumulator reference name.
        expected: String,
        /// Layer reference name.
        found: String,
    },

    /// I/O error writing an export.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// GeoJSON serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// The geoprocessing operations the pipeline is built from.
///
/// `buffer` and `dissolve` must be provided. The remaining operations have
/// default implementations that only rearrange data and are rarely worth
/// overriding outside of tests.
pub trait GeometryEngine {
    /// Buffers every geometry of `layer` by `distance_m` metres with round
    /// caps and joins.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] for a negative or non-finite
    /// distance, or geometries that cannot be buffered.
    fn buffer(
        &self,
        layer: &Layer,
        distance_m: f64,
        dissolve: BufferDissolve,
    ) -> Result<PolygonLayer, EngineError>;

    /// Merges every feature of `layer` into a single (possibly multipart)
    /// feature. Overlapping and touching parts become one part; disjoint
    /// parts stay separate.
    ///
    /// # Errors
    ///
    /// Returns an error if the union cannot be computed.
    fn dissolve(&self, layer: &PolygonLayer) -> Result<PolygonLayer, EngineError>;

    /// Splits every multipart feature into singlepart polygons.
    fn explode(&self, layer: &PolygonLayer) -> SinglepartLayer {
        SinglepartLayer {
            name: layer.name.clone(),
            spatial_ref: layer.spatial_ref.clone(),
            polygons: layer.parts().cloned().collect(),
        }
    }

    /// Appends `layer` to `accumulator`, returning the number of polygons
    /// added.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SpatialReferenceMismatch`] if the references
    /// are incompatible.
    fn append(
        &self,
        accumulator: &mut Accumulator,
        layer: SinglepartLayer,
    ) -> Result<usize, EngineError> {
        accumulator.append(layer)
    }

    /// Writes `layer` as a GeoJSON feature collection with a `VERTICES`
    /// property on every feature.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn to_geojson(&self, layer: &SinglepartLayer, path: &Path) -> Result<ExportStats, EngineError> {
        write_singlepart_layer(layer, path)
    }
}
