#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geodatabase coverage pipeline.
//!
//! Downloads a zipped geodatabase, extracts it, turns every point, line
//! and polygon feature class into singlepart polygons, merges them into
//! one accumulator and writes the dissolved result as GeoJSON:
//!
//! Fetch -> Extract -> Enumerate -> dispatch per feature class -> Finalize
//!
//! Any failure aborts the run. Feature classes of unsupported kinds are
//! skipped and listed in the returned [`RunSummary`].

pub mod artifacts;
pub mod cleanup;
pub mod config;
pub mod context;
pub mod dispatch;
mod error;
pub mod finalize;
pub mod progress;
pub mod transform;

use std::path::Path;
use std::sync::Arc;

use gdb_coverage_catalogue::{locate_container, open_catalogue};
use gdb_coverage_engine::GeometryEngine;
use gdb_coverage_models::{CoverageConfig, FeatureClassRef, RunSummary};

use crate::artifacts::ArtifactPaths;
use crate::context::PipelineContext;
use crate::progress::ProgressCallback;

pub use error::CoverageError;

/// Runs the whole pipeline for `config`.
///
/// Working files are removed afterwards according to `config.cleanup`,
/// on failure as well as on success.
///
/// # Errors
///
/// Returns the error of the first step that fails.
pub async fn run(
    config: &CoverageConfig,
    engine: &dyn GeometryEngine,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<RunSummary, CoverageError> {
    config::validate(config)?;
    config::check_container_support(config)?;

    let artifacts = ArtifactPaths::new(config);
    let result = run_steps(config, &artifacts, engine, progress).await;

    if config.cleanup.applies(result.is_ok()) {
        log::info!("Cleaning up working files ({})", config.cleanup);
        cleanup::remove_working_files(&artifacts, config.archive.is_none());
    }

    result
}

async fn run_steps(
    config: &CoverageConfig,
    artifacts: &ArtifactPaths,
    engine: &dyn GeometryEngine,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<RunSummary, CoverageError> {
    let downloaded_bytes = if config.archive.is_some() {
        log::info!("Using local archive {}", artifacts.archive().display());
        0
    } else {
        progress.set_message("Downloading".to_string());
        let client = gdb_coverage_archive::build_client()?;
        gdb_coverage_archive::download_file(&client, &config.url, artifacts.archive()).await?
    };

    progress.set_message("Extracting".to_string());
    let extract_dir = artifacts.extract_dir();
    if extract_dir.exists() {
        log::debug!("Clearing previous extraction {}", extract_dir.display());
        std::fs::remove_dir_all(extract_dir).map_err(|e| CoverageError::Io {
            path: extract_dir.display().to_string(),
            source: e,
        })?;
    }
    let extracted_files = gdb_coverage_archive::extract_all(artifacts.archive(), extract_dir)?;

    let container = locate_container(extract_dir, config.container.as_deref())?;

    let mut summary = process_container(config, artifacts, engine, &container, progress)?;
    summary.downloaded_bytes = downloaded_bytes;
    summary.extracted_files = extracted_files;

    Ok(summary)
}

/// Enumerates `container`, transforms every feature class and finalizes
/// the output. This is the part of [`run`] after extraction.
///
/// # Errors
///
/// Returns an error if the container cannot be read or a transform or
/// the export fails.
pub fn process_container(
    config: &CoverageConfig,
    artifacts: &ArtifactPaths,
    engine: &dyn GeometryEngine,
    container: &Path,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<RunSummary, CoverageError> {
    let catalogue = open_catalogue(container, config.reproject_to_wgs84)?;
    let classes = catalogue.list_feature_classes()?;
    log::info!(
        "Found {} feature classes in {}",
        classes.len(),
        container.display()
    );

    let mut ctx = PipelineContext::new(config, artifacts, engine);

    progress.set_total(classes.len() as u64);
    for class in &classes {
        progress.set_message(class.name.clone());
        dispatch::process_feature_class(&mut ctx, catalogue.as_ref(), class)?;
        progress.inc(1);
    }

    progress.set_message("Finalizing".to_string());
    let stats = finalize::finalize(&mut ctx)?;
    progress.finish(format!("{} polygons", stats.polygon_count));

    Ok(ctx.into_summary())
}

/// Lists the feature classes of an extracted container.
///
/// # Errors
///
/// Returns an error if the container cannot be opened or listed.
pub fn list_feature_classes(
    container: &Path,
    reproject_to_wgs84: bool,
) -> Result<Vec<FeatureClassRef>, CoverageError> {
    Ok(open_catalogue(container, reproject_to_wgs84)?.list_feature_classes()?)
}
