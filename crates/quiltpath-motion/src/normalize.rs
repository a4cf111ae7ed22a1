//! Geometry normalization: flattened sub-paths to a [`MotionPath`].
//!
//! Each sub-path becomes a run of [`Stitch`](SegmentKind::Stitch)
//! segments in input order, and exactly one
//! [`Travel`](SegmentKind::Travel) segment bridges the end of one kept
//! sub-path to the start of the next.
//!
//! Flattening leaves behind repeated vertices and sub-paths that
//! collapse to a single point. Repeated vertices (within
//! [`TOLERANCE_MM`](crate::types::TOLERANCE_MM)) are merged and
//! collapsed sub-paths are dropped; neither is an error.

use crate::types::{MotionError, MotionPath, Point, Segment};

/// Remove consecutive vertices that coincide with their predecessor.
fn dedup_consecutive(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last().is_none_or(|last| !last.coincides(p)) {
            out.push(p);
        }
    }
    out
}

/// Build the canonical motion path from flattened sub-paths.
///
/// Sub-paths with fewer than two distinct points are dropped.
///
/// # Errors
///
/// Returns [`MotionError::EmptyInput`] if no sub-path survives
/// filtering.
pub fn normalize<S: AsRef<[Point]>>(subpaths: &[S]) -> Result<MotionPath, MotionError> {
    let mut segments = Vec::new();
    let mut previous_end: Option<Point> = None;
    let mut dropped = 0_usize;

    for subpath in subpaths {
        let points = dedup_consecutive(subpath.as_ref());
        if points.len() < 2 {
            dropped += 1;
            continue;
        }

        if let Some(end) = previous_end {
            segments.push(Segment::travel(end, points[0]));
        }
        segments.extend(points.windows(2).map(|w| Segment::stitch(w[0], w[1])));
        previous_end = points.last().copied();
    }

    if dropped > 0 {
        tracing::warn!(dropped, "dropped degenerate sub-paths");
    }

    let path = MotionPath::from_segments(segments)?;
    tracing::debug!(
        segments = path.len(),
        subpaths = subpaths.len() - dropped,
        "normalized geometry"
    );
    Ok(path)
}
