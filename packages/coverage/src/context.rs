//! State owned by one pipeline run.

use std::path::Path;

use gdb_coverage_engine::{
    Accumulator, GeometryEngine, PolygonLayer, SinglepartLayer, write_polygon_layer,
};
use gdb_coverage_models::{
    ClassReport, CoverageConfig, FeatureClassRef, RunSummary, SkipReason, SkippedFeatureClass,
    SpatialReference,
};

use crate::CoverageError;
use crate::artifacts::ArtifactPaths;

/// Configuration, engine, accumulator and summary of a single run.
///
/// Created by the driver and passed by `&mut` to every transform, so the
/// accumulator has exactly one writer.
pub struct PipelineContext<'a> {
    config: &'a CoverageConfig,
    artifacts: &'a ArtifactPaths,
    engine: &'a dyn GeometryEngine,
    accumulator: Accumulator,
    summary: RunSummary,
}

impl<'a> PipelineContext<'a> {
    /// Starts a run with an empty WGS 84 accumulator.
    #[must_use]
    pub fn new(
        config: &'a CoverageConfig,
        artifacts: &'a ArtifactPaths,
        engine: &'a dyn GeometryEngine,
    ) -> Self {
        Self::with_spatial_ref(config, artifacts, engine, SpatialReference::wgs84())
    }

    /// Starts a run with an empty accumulator in `spatial_ref`.
    #[must_use]
    pub fn with_spatial_ref(
        config: &'a CoverageConfig,
        artifacts: &'a ArtifactPaths,
        engine: &'a dyn GeometryEngine,
        spatial_ref: SpatialReference,
    ) -> Self {
        Self {
            config,
            artifacts,
            engine,
            accumulator: Accumulator::new(spatial_ref),
            summary: RunSummary::default(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &'a CoverageConfig {
        self.config
    }

    #[must_use]
    pub const fn artifacts(&self) -> &'a ArtifactPaths {
        self.artifacts
    }

    #[must_use]
    pub fn engine(&self) -> &'a dyn GeometryEngine {
        self.engine
    }

    #[must_use]
    pub const fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    #[must_use]
    pub const fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub const fn summary_mut(&mut self) -> &mut RunSummary {
        &mut self.summary
    }

    /// Appends the finished polygons of `class` and records the class in
    /// the summary.
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::GeometryEngine`] if the append is
    /// rejected.
    pub fn append(
        &mut self,
        class: &FeatureClassRef,
        input_features: usize,
        layer: SinglepartLayer,
    ) -> Result<usize, CoverageError> {
        let before = self.accumulator.len();
        let offered = layer.len();
        let appended = self
            .engine
            .append(&mut self.accumulator, layer)
            .map_err(CoverageError::engine(&class.name))?;

        log::debug!(
            "{}: appended {appended} polygons (accumulator {before} -> {})",
            class.name,
            self.accumulator.len()
        );

        self.summary.classes.push(ClassReport {
            name: class.name.clone(),
            kind: class.kind.clone(),
            input_features,
            appended,
            dropped: offered.saturating_sub(appended),
        });

        Ok(appended)
    }

    /// Records `class` as skipped.
    pub fn skip(&mut self, class: &FeatureClassRef, reason: SkipReason) {
        log::warn!("Skipping {}: {reason}", class.name);
        self.summary.skipped.push(SkippedFeatureClass {
            name: class.name.clone(),
            reason,
        });
    }

    /// Writes a polygon intermediate when intermediates are kept.
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::GeometryEngine`] if the file cannot be
    /// written.
    pub fn keep_polygons(&self, layer: &PolygonLayer, path: &Path) -> Result<(), CoverageError> {
        if !self.config.keep_intermediates {
            return Ok(());
        }
        write_polygon_layer(layer, path).map_err(CoverageError::engine(&layer.name))
    }

    /// Writes a singlepart intermediate when intermediates are kept.
    ///
    /// # Errors
    ///
    /// Returns [`CoverageError::GeometryEngine`] if the file cannot be
    /// written.
    pub fn keep_singlepart(
        &self,
        layer: &SinglepartLayer,
        path: &Path,
    ) -> Result<(), CoverageError> {
        if !self.config.keep_intermediates {
            return Ok(());
        }
        self.engine
            .to_geojson(layer, path)
            .map(|_| ())
            .map_err(CoverageError::engine(&layer.name))
    }

    /// Ends the run and returns its summary.
    #[must_use]
    pub fn into_summary(self) -> RunSummary {
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdb_coverage_engine::GeoEngine;
    use gdb_coverage_models::GeometryKind;
    use geo::{LineString, Polygon, polygon};

    #[test]
    fn append_records_degenerate_polygons_as_dropped() {
        let config = CoverageConfig {
            work_dir: std::env::temp_dir().join("gdb_coverage_context_dropped"),
            ..CoverageConfig::default()
        };
        let artifacts = ArtifactPaths::new(&config);
        let mut ctx = PipelineContext::new(&config, &artifacts, &GeoEngine);
        let class = FeatureClassRef {
            name: "parks".to_string(),
            kind: GeometryKind::Polygon,
            spatial_ref: SpatialReference::wgs84(),
            path: None,
        };
        let layer = SinglepartLayer {
            name: "parks_finished".to_string(),
            spatial_ref: SpatialReference::wgs84(),
            polygons: vec![
                polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)],
                Polygon::new(LineString::new(vec![]), vec![]),
            ],
        };

        let appended = ctx.append(&class, 2, layer).unwrap();

        assert_eq!(appended, 1);
        let report = &ctx.summary().classes[0];
        assert_eq!(report.appended, 1);
        assert_eq!(report.dropped, 1);
        assert_eq!(ctx.accumulator().len(), 1);
    }
}
