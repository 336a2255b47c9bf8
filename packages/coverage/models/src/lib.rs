#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for the geodatabase coverage pipeline.
//!
//! Describes the feature classes found inside a geodatabase container, the
//! spatial reference attached to each one, the pipeline configuration and
//! the summary reported at the end of a run.

pub mod config;
pub mod spatial_ref;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use config::{CleanupPolicy, CoverageConfig};
pub use spatial_ref::SpatialReference;

/// The geometry kind of a feature class.
///
/// Anything that is not a polygon, point or polyline class is carried as
/// [`GeometryKind::Unsupported`] with the shape type name reported by the
/// container, so it can be skipped and reported rather than silently
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum GeometryKind {
    /// Polygon (or multipatch) features.
    Polygon,
    /// Single point features.
    Point,
    /// Polyline / line string features.
    Polyline,
    /// Any other shape type (multipoint, null shapes, ...).
    Unsupported(String),
}

impl GeometryKind {
    /// Classifies an Esri / OGR shape type name.
    ///
    /// Matching is case-insensitive and ignores `Z`/`M` suffixes and
    /// spaces, so `"PolygonZ"`, `"Multi Polygon"` and `"polygon"` all map
    /// to [`GeometryKind::Polygon`].
    #[must_use]
    pub fn from_shape_type(name: &str) -> Self {
        let lowered: String = name
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        let unprefixed = lowered
            .strip_prefix("3d")
            .or_else(|| lowered.strip_prefix("measured"))
            .unwrap_or(&lowered);
        let base = unprefixed
            .strip_suffix("zm")
            .or_else(|| unprefixed.strip_suffix('z'))
            .or_else(|| unprefixed.strip_suffix('m'))
            .unwrap_or(unprefixed);

        match base {
            "polygon" | "multipolygon" | "multipatch" | "multisurface" => Self::Polygon,
            "point" => Self::Point,
            "polyline" | "linestring" | "multilinestring" | "multicurve" => Self::Polyline,
            _ => Self::Unsupported(name.to_string()),
        }
    }

    /// Returns `true` for the kinds the pipeline knows how to transform.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Polygon => f.write_str("Polygon"),
            Self::Point => f.write_str("Point"),
            Self::Polyline => f.write_str("Polyline"),
            Self::Unsupported(name) => write!(f, "Unsupported({name})"),
        }
    }
}

/// Identifies one feature class inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureClassRef {
    /// Feature class name, qualified with its feature dataset when nested
    /// (e.g. `"hydro/rivers"`).
    pub name: String,
    /// Geometry kind declared by the container.
    pub kind: GeometryKind,
    /// Spatial reference declared by the container.
    pub spatial_ref: SpatialReference,
    /// On-disk location, when the backend stores one file per class.
    pub path: Option<PathBuf>,
}

impl FeatureClassRef {
    /// Name safe to use as a file stem (dataset separators flattened).
    #[must_use]
    pub fn file_stem(&self) -> String {
        self.name.replace(['/', '\\'], "__")
    }
}

/// Per-feature-class outcome recorded in the [`RunSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassReport {
    /// Qualified feature class name.
    pub name: String,
    /// Geometry kind that selected the transform.
    pub kind: GeometryKind,
    /// Number of input geometries read from the container.
    pub input_features: usize,
    /// Number of singlepart polygons appended to the accumulator.
    pub appended: usize,
    /// Degenerate polygons the accumulator refused.
    #[serde(default)]
    pub dropped: usize,
}

/// Why a feature class was not transformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The geometry kind has no polygon transform.
    UnsupportedKind {
        /// Shape type name reported by the container.
        kind: String,
    },
    /// The feature class has no geometries.
    Empty,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedKind { kind } => write!(f, "unsupported geometry kind {kind}"),
            Self::Empty => f.write_str("no features"),
        }
    }
}

/// A feature class that was left out of the coverage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFeatureClass {
    /// Qualified feature class name.
    pub name: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Totals reported once a run finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Bytes written by the fetch step (0 when a local archive was used).
    pub downloaded_bytes: u64,
    /// Files written by the extract step.
    pub extracted_files: u64,
    /// Transformed feature classes, in processing order.
    pub classes: Vec<ClassReport>,
    /// Feature classes that were skipped.
    pub skipped: Vec<SkippedFeatureClass>,
    /// Accumulator size before finalizing.
    pub accumulated_polygons: usize,
    /// Number of singlepart polygons in the output.
    pub polygon_count: usize,
    /// Sum of `VERTICES` over every output polygon.
    pub total_vertices: usize,
    /// Where the GeoJSON document was written.
    pub output: Option<PathBuf>,
}

impl RunSummary {
    /// Total singlepart polygons appended across all transformed classes.
    #[must_use]
    pub fn appended_total(&self) -> usize {
        self.classes.iter().map(|c| c.appended).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_esri_shape_types() {
        assert_eq!(GeometryKind::from_shape_type("Polygon"), GeometryKind::Polygon);
        assert_eq!(GeometryKind::from_shape_type("PolygonZ"), GeometryKind::Polygon);
        assert_eq!(GeometryKind::from_shape_type("MultiPatch"), GeometryKind::Polygon);
        assert_eq!(GeometryKind::from_shape_type("Point"), GeometryKind::Point);
        assert_eq!(GeometryKind::from_shape_type("PointM"), GeometryKind::Point);
        assert_eq!(GeometryKind::from_shape_type("Polyline"), GeometryKind::Polyline);
    }

    #[test]
    fn classifies_ogr_type_names() {
        assert_eq!(
            GeometryKind::from_shape_type("Multi Polygon"),
            GeometryKind::Polygon
        );
        assert_eq!(
            GeometryKind::from_shape_type("Line String"),
            GeometryKind::Polyline
        );
        assert_eq!(
            GeometryKind::from_shape_type("3D Multi Line String"),
            GeometryKind::Polyline
        );
        assert_eq!(
            GeometryKind::from_shape_type("Multi Point"),
            GeometryKind::Unsupported("Multi Point".to_string())
        );
    }

    #[test]
    fn multipoint_is_unsupported() {
        let kind = GeometryKind::from_shape_type("Multipoint");
        assert_eq!(kind, GeometryKind::Unsupported("Multipoint".to_string()));
        assert!(!kind.is_supported());
        assert_eq!(kind.to_string(), "Unsupported(Multipoint)");
    }

    #[test]
    fn file_stem_flattens_dataset_separator() {
        let class = FeatureClassRef {
            name: "hydro/rivers".to_string(),
            kind: GeometryKind::Polyline,
            spatial_ref: SpatialReference::unknown(),
            path: None,
        };
        assert_eq!(class.file_stem(), "hydro__rivers");
    }

    #[test]
    fn appended_total_sums_classes() {
        let summary = RunSummary {
            classes: vec![
                ClassReport {
                    name: "a".to_string(),
                    kind: GeometryKind::Point,
                    input_features: 2,
                    appended: 1,
                    dropped: 0,
                },
                ClassReport {
                    name: "b".to_string(),
                    kind: GeometryKind::Polygon,
                    input_features: 5,
                    appended: 3,
                    dropped: 1,
                },
            ],
            ..RunSummary::default()
        };
        assert_eq!(summary.appended_total(), 4);
    }
}
