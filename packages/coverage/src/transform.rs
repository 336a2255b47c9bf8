//! Per-kind normalization of a feature class into singlepart polygons.
//!
//! Each transform ends by appending to the run's accumulator and returns
//! the number of polygons it appended.

use gdb_coverage_engine::{BufferDissolve, Layer};
use gdb_coverage_models::FeatureClassRef;

use crate::CoverageError;
use crate::context::PipelineContext;

/// Signature shared by the three transforms.
pub type Transform =
    fn(&mut PipelineContext<'_>, &FeatureClassRef, &Layer) -> Result<usize, CoverageError>;

/// Polygon input: dissolve everything into one multipart footprint, then
/// explode and append.
///
/// # Errors
///
/// Returns [`CoverageError::GeometryEngine`] if a geometry is not areal
/// or an engine step fails.
pub fn polygon(
    ctx: &mut PipelineContext<'_>,
    class: &FeatureClassRef,
    layer: &Layer,
) -> Result<usize, CoverageError> {
    let engine = ctx.engine();
    let artifacts = ctx.artifacts();
    let engine_err = CoverageError::engine(&class.name);

    let polygons = layer.to_polygon_layer().map_err(&engine_err)?;
    let dissolved = engine.dissolve(&polygons).map_err(&engine_err)?;
    ctx.keep_polygons(&dissolved, &artifacts.class_dissolved(class))?;

    let finished = engine.explode(&dissolved);
    ctx.keep_singlepart(&finished, &artifacts.class_finished(class))?;

    ctx.append(class, layer.len(), finished)
}

/// Point input: buffer with all buffers merged by the buffer step itself,
/// then explode and append.
///
/// # Errors
///
/// Returns [`CoverageError::GeometryEngine`] if an engine step fails.
pub fn point(
    ctx: &mut PipelineContext<'_>,
    class: &FeatureClassRef,
    layer: &Layer,
) -> Result<usize, CoverageError> {
    let engine = ctx.engine();
    let artifacts = ctx.artifacts();
    let engine_err = CoverageError::engine(&class.name);

    let buffered = engine
        .buffer(layer, ctx.config().point_buffer_m, BufferDissolve::All)
        .map_err(&engine_err)?;
    ctx.keep_polygons(&buffered, &artifacts.class_buffer(class))?;

    let finished = engine.explode(&buffered);
    ctx.keep_singlepart(&finished, &artifacts.class_finished(class))?;

    ctx.append(class, layer.len(), finished)
}

/// Line input: buffer each line on its own, dissolve the buffers, then
/// explode and append.
///
/// # Errors
///
/// Returns [`CoverageError::GeometryEngine`] if an engine step fails.
pub fn line(
    ctx: &mut PipelineContext<'_>,
    class: &FeatureClassRef,
    layer: &Layer,
) -> Result<usize, CoverageError> {
    let engine = ctx.engine();
    let artifacts = ctx.artifacts();
    let engine_err = CoverageError::engine(&class.name);

    let buffered = engine
        .buffer(layer, ctx.config().line_buffer_m, BufferDissolve::None)
        .map_err(&engine_err)?;
    ctx.keep_polygons(&buffered, &artifacts.class_buffer(class))?;

    let dissolved = engine.dissolve(&buffered).map_err(&engine_err)?;
    ctx.keep_polygons(&dissolved, &artifacts.class_dissolved(class))?;

    let finished = engine.explode(&dissolved);
    ctx.keep_singlepart(&finished, &artifacts.class_finished(class))?;

    ctx.append(class, layer.len(), finished)
}
