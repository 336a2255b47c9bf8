//! Filesystem locations used by one run.
//!
//! Each intermediate artifact gets its own path. Per-class artifacts live
//! under `intermediate/classes/` so a feature class can never shadow the
//! accumulator's artifacts.

use std::path::{Path, PathBuf};

use gdb_coverage_models::{CoverageConfig, FeatureClassRef};

/// Paths derived from a [`CoverageConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    archive: PathBuf,
    extract_dir: PathBuf,
    intermediate_dir: PathBuf,
    output: PathBuf,
}

impl ArtifactPaths {
    /// Resolves every path of a run.
    #[must_use]
    pub fn new(config: &CoverageConfig) -> Self {
        Self {
            archive: config
                .archive
                .clone()
                .unwrap_or_else(|| config.work_dir.join(&config.archive_name)),
            extract_dir: config.work_dir.join("extracted"),
            intermediate_dir: config.work_dir.join("intermediate"),
            output: config.output.clone(),
        }
    }

    /// Downloaded (or configured local) archive.
    #[must_use]
    pub fn archive(&self) -> &Path {
        &self.archive
    }

    /// Directory the archive is extracted into.
    #[must_use]
    pub fn extract_dir(&self) -> &Path {
        &self.extract_dir
    }

    /// Root of all intermediate artifacts.
    #[must_use]
    pub fn intermediate_dir(&self) -> &Path {
        &self.intermediate_dir
    }

    /// Final GeoJSON document.
    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Buffer output of a point or line class.
    #[must_use]
    pub fn class_buffer(&self, class: &FeatureClassRef) -> PathBuf {
        self.class_artifact(class, "buffer")
    }

    /// Dissolve output of a polygon or line class.
    #[must_use]
    pub fn class_dissolved(&self, class: &FeatureClassRef) -> PathBuf {
        self.class_artifact(class, "dissolved")
    }

    /// Singlepart polygons appended for a class.
    #[must_use]
    pub fn class_finished(&self, class: &FeatureClassRef) -> PathBuf {
        self.class_artifact(class, "finished")
    }

    /// Dissolved accumulator, before the final explode.
    #[must_use]
    pub fn accumulator_dissolved(&self) -> PathBuf {
        self.intermediate_dir.join("accumulator_dissolved.geojson")
    }

    fn class_artifact(&self, class: &FeatureClassRef, step: &str) -> PathBuf {
        self.intermediate_dir
            .join("classes")
            .join(format!("{}_{step}.geojson", class.file_stem()))
    }
}
