//! quiltpath-motion: Pure motion-path pipeline (sans-IO).
//!
//! Turns flattened vector geometry into the path a long-arm quilting
//! machine sews:
//! normalize -> optional optimize -> optional pantograph layout ->
//! switchback composition.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! geometry and returns structured data. Serialization to file formats
//! lives in `quiltpath-export`; filesystem access lives in
//! `quiltpath-io`.

pub mod layout;
#[cfg(test)]
mod log_capture;
pub mod measure;
pub mod normalize;
pub mod optimize;
pub mod reroute;
pub mod summary;
pub mod switchback;
pub mod types;

use serde::{Deserialize, Serialize};

pub use layout::{LayoutInstance, PantographLayout, layout, layout_bounds, pattern_pitch};
pub use measure::{PathMeasure, Y_MISMATCH_THRESHOLD_MM, y_mismatch};
pub use normalize::normalize;
pub use optimize::{
    OptimizerKind, PathOptimizer, crossing_count, crossing_count_within, optimize,
};
pub use summary::PathSummary;
pub use switchback::{compose_layout, compose_switchback};
pub use types::{Bounds, MotionError, MotionPath, Point, Segment, SegmentKind, TOLERANCE_MM};

/// Everything that shapes the exported path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Pantograph tiling parameters, used when
    /// [`export_entire_layout`](Self::export_entire_layout) is set.
    pub layout: PantographLayout,

    /// Optimization applied to the base pattern, if any.
    pub optimizer: Option<OptimizerKind>,

    /// Compose the whole pantograph instead of the single pattern.
    pub export_entire_layout: bool,
}

/// Normalize sub-paths and apply the optional optimizer.
///
/// The result is the single base pattern, before any tiling. Its start
/// and end anchors are the ones the Y-axis check applies to.
///
/// # Errors
///
/// Returns [`MotionError::EmptyInput`] if no sub-path has two distinct
/// points.
pub fn prepare_base<S: AsRef<[Point]>>(
    subpaths: &[S],
    optimizer: Option<OptimizerKind>,
) -> Result<MotionPath, MotionError> {
    let base = normalize(subpaths)?;
    Ok(match optimizer {
        Some(kind) => kind.optimize(&base),
        None => base,
    })
}

/// Turn a prepared base pattern into the exported path.
///
/// Returns a copy of `base` unless
/// [`export_entire_layout`](MotionConfig::export_entire_layout) is set.
///
/// # Errors
///
/// Returns [`MotionError::EmptyPattern`] if a layout is requested for a
/// pattern with no length.
pub fn compose(base: &MotionPath, config: &MotionConfig) -> Result<MotionPath, MotionError> {
    if config.export_entire_layout {
        compose_layout(base, &config.layout)
    } else {
        Ok(base.clone())
    }
}

/// Run the motion pipeline.
///
/// # Pipeline steps
///
/// 1. Normalize sub-paths into a motion path
/// 2. Optional optimization of the base pattern
/// 3. Optional layout and switchback composition
///
/// Callers that also need the base pattern use [`prepare_base`] and
/// [`compose`] directly.
///
/// # Errors
///
/// Returns [`MotionError::EmptyInput`] if no sub-path has two distinct
/// points, and [`MotionError::EmptyPattern`] if a layout is requested
/// for a pattern with no length.
pub fn process<S: AsRef<[Point]>>(
    subpaths: &[S],
    config: &MotionConfig,
) -> Result<MotionPath, MotionError> {
    let base = prepare_base(subpaths, config.optimizer)?;
    compose(&base, config)
}
