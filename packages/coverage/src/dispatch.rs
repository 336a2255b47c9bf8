//! Routes each feature class to the transform for its geometry kind.

use gdb_coverage_catalogue::Catalogue;
use gdb_coverage_models::{FeatureClassRef, GeometryKind, SkipReason};

use crate::CoverageError;
use crate::context::PipelineContext;
use crate::transform::{self, Transform};

/// Reads `class` from `catalogue` and runs the matching transform.
///
/// Unsupported kinds and empty classes are recorded as skipped and do
/// not fail the run. Returns the number of polygons appended.
///
/// # Errors
///
/// Returns an error if the class cannot be read or its transform fails.
pub fn process_feature_class(
    ctx: &mut PipelineContext<'_>,
    catalogue: &dyn Catalogue,
    class: &FeatureClassRef,
) -> Result<usize, CoverageError> {
    let transform: Transform = match &class.kind {
        GeometryKind::Polygon => transform::polygon,
        GeometryKind::Point => transform::point,
        GeometryKind::Polyline => transform::line,
        GeometryKind::Unsupported(kind) => {
            ctx.skip(class, SkipReason::UnsupportedKind { kind: kind.clone() });
            return Ok(0);
        }
    };

    let layer = catalogue.read(class)?;
    if layer.is_empty() {
        ctx.skip(class, SkipReason::Empty);
        return Ok(0);
    }

    log::info!(
        "{} is a {} feature class ({} features)",
        class.name,
        class.kind,
        layer.len()
    );

    transform(ctx, class, &layer)
}
