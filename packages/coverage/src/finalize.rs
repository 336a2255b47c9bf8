//! Final dissolve, explode and export of the accumulator.

use gdb_coverage_engine::ExportStats;

use crate::CoverageError;
use crate::context::PipelineContext;

const ACCUMULATOR: &str = "accumulator";

/// Dissolves the accumulator, explodes the result into singlepart
/// polygons and writes them with their vertex counts to the configured
/// output.
///
/// # Errors
///
/// Returns [`CoverageError::GeometryEngine`] if the dissolve or the export
/// fails.
pub fn finalize(ctx: &mut PipelineContext<'_>) -> Result<ExportStats, CoverageError> {
    let engine = ctx.engine();
    let engine_err = CoverageError::engine(ACCUMULATOR);

    let accumulated = ctx.accumulator().to_polygon_layer(ACCUMULATOR);
    if accumulated.is_empty() {
        log::warn!("No polygons were accumulated; the output will be empty");
    }
    log::info!("Dissolving {} accumulated polygons", accumulated.len());

    let dissolved = engine.dissolve(&accumulated).map_err(&engine_err)?;
    ctx.keep_polygons(&dissolved, &ctx.artifacts().accumulator_dissolved())?;

    let exploded = engine.explode(&dissolved);
    log::info!("Number of polygons: {}", exploded.len());

    let output = ctx.artifacts().output();
    let stats = engine.to_geojson(&exploded, output).map_err(&engine_err)?;

    let summary = ctx.summary_mut();
    summary.accumulated_polygons = accumulated.len();
    summary.polygon_count = stats.polygon_count;
    summary.total_vertices = stats.total_vertices;
    summary.output = Some(output.to_path_buf());

    Ok(stats)
}
