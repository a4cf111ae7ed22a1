//! Path optimization: reduce self-overlap inside stitch runs.
//!
//! A path is split at its [`Travel`](SegmentKind::Travel) segments into
//! independent stitch runs. Each run is improved on its own with its
//! start and end anchors pinned, so the travel segments, their count
//! and the sub-path boundaries they bridge never change.
//!
//! This module defines the [`PathOptimizer`] trait for pluggable
//! strategies and the [`OptimizerKind`] enum for runtime selection.
//! Every strategy is best-effort and bounded: when it cannot improve a
//! run it returns the run unchanged.

use geo::Line;
use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use serde::{Deserialize, Serialize};

use crate::reroute::reroute_run;
use crate::types::{MotionPath, Point, Segment, SegmentKind, TOLERANCE_MM};

/// Passes over a run before the uncrossing search gives up.
const MAX_PASSES: usize = 64;

/// Segment-pair intersection tests allowed per run.
pub const MAX_PAIR_TESTS: usize = 4_000_000;

/// Selects which optimization strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    /// Remove self-crossings with 2-opt reversals.
    ///
    /// Whenever two non-adjacent segments of a run cross, the stretch
    /// between them is reversed, which swaps the crossing pair for two
    /// non-crossing ones. A reversal is kept only if it strictly lowers
    /// the run's crossing count.
    #[default]
    Uncross,

    /// Re-sew each run as an Eulerian trail over its distinct edges.
    ///
    /// Removes retraced (double-sewn) stretches that are not needed to
    /// get from the run's start to its end. Every distinct edge is still
    /// sewn at least once. See [`crate::reroute`].
    Reroute,
}

/// Trait for path optimization strategies.
pub trait PathOptimizer {
    /// Return an improved copy of `path`.
    ///
    /// The first and last points and every travel segment are preserved.
    fn optimize(&self, path: &MotionPath) -> MotionPath;
}

impl PathOptimizer for OptimizerKind {
    fn optimize(&self, path: &MotionPath) -> MotionPath {
        match *self {
            Self::Uncross => optimize_runs(path, uncross_run),
            Self::Reroute => optimize_runs(path, reroute_run),
        }
    }
}

/// Optimize with the default strategy.
#[must_use]
pub fn optimize(path: &MotionPath) -> MotionPath {
    OptimizerKind::default().optimize(path)
}

// ---------------------------------------------------------------------------
// Run splitting
// ---------------------------------------------------------------------------

/// A maximal stitch run (as vertices) or a travel segment.
#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Run(Vec<Point>),
    Travel(Segment),
}

/// Split a path at its travel segments.
fn split_runs(path: &MotionPath) -> Vec<Piece> {
    let mut pieces = Vec::new();
    for segment in path.segments() {
        match (segment.kind, pieces.last_mut()) {
            (SegmentKind::Travel, _) => pieces.push(Piece::Travel(*segment)),
            (SegmentKind::Stitch, Some(Piece::Run(points))) => points.push(segment.to),
            (SegmentKind::Stitch, _) => pieces.push(Piece::Run(vec![segment.from, segment.to])),
        }
    }
    pieces
}

/// Apply `improve` to every stitch run and reassemble the path.
///
/// `improve` returns `None` to keep a run unchanged.
fn optimize_runs(
    path: &MotionPath,
    improve: impl Fn(&[Point]) -> Option<Vec<Point>>,
) -> MotionPath {
    let mut segments = Vec::with_capacity(path.len());
    let mut improved = 0_usize;
    for piece in split_runs(path) {
        match piece {
            Piece::Travel(segment) => segments.push(segment),
            Piece::Run(points) => {
                let points = improve(&points).map_or(points, |better| {
                    improved += 1;
                    better
                });
                segments.extend(points.windows(2).map(|w| Segment::stitch(w[0], w[1])));
            }
        }
    }

    match MotionPath::from_segments(segments) {
        Ok(optimized) => {
            tracing::debug!(
                improved_runs = improved,
                before = path.len(),
                after = optimized.len(),
                "optimized path"
            );
            optimized
        }
        Err(e) => {
            tracing::warn!("optimizer broke path continuity, keeping input: {e}");
            path.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Crossing detection
// ---------------------------------------------------------------------------

/// Convert a motion `Point` to a `geo::Coord`.
const fn point_to_coord(p: Point) -> geo::Coord<f64> {
    geo::Coord { x: p.x, y: p.y }
}

/// Whether two segments cross.
///
/// A crossing is a proper intersection (interior to both) or a collinear
/// overlap longer than [`TOLERANCE_MM`]. Touching at an endpoint does
/// not count.
fn segments_cross(a: (Point, Point), b: (Point, Point)) -> bool {
    let la = Line::new(point_to_coord(a.0), point_to_coord(a.1));
    let lb = Line::new(point_to_coord(b.0), point_to_coord(b.1));
    match line_intersection(la, lb) {
        Some(LineIntersection::SinglePoint { is_proper, .. }) => is_proper,
        Some(LineIntersection::Collinear { intersection }) => {
            let d = intersection.delta();
            d.x.hypot(d.y) > TOLERANCE_MM
        }
        None => false,
    }
}

/// Edge `k` of a run: vertices `k` and `k + 1`.
fn edge(points: &[Point], k: usize) -> (Point, Point) {
    (points[k], points[k + 1])
}

/// Crossings between non-adjacent edges of one run.
fn run_crossings(points: &[Point]) -> usize {
    let edges = points.len().saturating_sub(1);
    let mut count = 0;
    for i in 0..edges {
        for j in i + 2..edges {
            if segments_cross(edge(points, i), edge(points, j)) {
                count += 1;
            }
        }
    }
    count
}

/// Non-adjacent edge pairs [`run_crossings`] tests for a run.
const fn run_pair_tests(points: &[Point]) -> usize {
    let edges = points.len().saturating_sub(1);
    if edges < 3 {
        0
    } else {
        (edges - 1) * (edges - 2) / 2
    }
}

/// Total self-crossings over every stitch run of `path`, or `None` if
/// counting would take more than `max_pair_tests` intersection tests.
#[must_use]
pub fn crossing_count_within(path: &MotionPath, max_pair_tests: usize) -> Option<usize> {
    let pieces = split_runs(path);
    let tests = pieces
        .iter()
        .map(|piece| match piece {
            Piece::Run(points) => run_pair_tests(points),
            Piece::Travel(_) => 0,
        })
        .fold(0_usize, usize::saturating_add);
    if tests > max_pair_tests {
        tracing::debug!(tests, max_pair_tests, "crossing count skipped");
        return None;
    }
    Some(
        pieces
            .iter()
            .map(|piece| match piece {
                Piece::Run(points) => run_crossings(points),
                Piece::Travel(_) => 0,
            })
            .sum(),
    )
}

/// Total self-crossings over every stitch run of `path`.
///
/// Crossings between different runs are not counted.
#[must_use]
pub fn crossing_count(path: &MotionPath) -> usize {
    split_runs(path)
        .iter()
        .map(|piece| match piece {
            Piece::Run(points) => run_crossings(points),
            Piece::Travel(_) => 0,
        })
        .sum()
}

// ---------------------------------------------------------------------------
// Uncross (2-opt)
// ---------------------------------------------------------------------------

/// Change in crossing count if `points[i + 1..=j]` were reversed.
///
/// Reversal replaces edges `i` and `j` with `(p[i], p[j])` and
/// `(p[i + 1], p[j + 1])`. Every other edge keeps its geometry and its
/// neighbours, so only pairs involving the two replaced edges change.
fn reversal_delta(points: &[Point], i: usize, j: usize, tests: &mut usize) -> isize {
    let edges = points.len() - 1;
    let old_i = edge(points, i);
    let old_j = edge(points, j);
    let new_i = (points[i], points[j]);
    let new_j = (points[i + 1], points[j + 1]);

    let mut before = isize::from(segments_cross(old_i, old_j));
    let mut after = isize::from(segments_cross(new_i, new_j));
    for k in (0..edges).filter(|&k| k != i && k != j) {
        let other = edge(points, k);
        *tests += 4;
        if k + 1 != i && k != i + 1 && segments_cross(old_i, other) {
            before += 1;
        }
        if k + 1 != j && k != j + 1 && segments_cross(old_j, other) {
            before += 1;
        }
        if k + 1 != i && k + 1 != j && segments_cross(new_i, other) {
            after += 1;
        }
        if k != i + 1 && k != j + 1 && segments_cross(new_j, other) {
            after += 1;
        }
    }
    after - before
}

/// Remove crossings from one run by 2-opt reversal.
fn uncross_run(points: &[Point]) -> Option<Vec<Point>> {
    let edges = points.len().saturating_sub(1);
    if edges < 3 {
        return None;
    }

    let mut points = points.to_vec();
    let mut tests = 0_usize;
    let mut changed = false;

    'passes: for _ in 0..MAX_PASSES {
        let mut improved = false;
        for i in 0..edges - 2 {
            for j in i + 2..edges {
                tests += 1;
                if tests > MAX_PAIR_TESTS {
                    tracing::debug!(edges, "uncross budget exhausted");
                    break 'passes;
                }
                if !segments_cross(edge(&points, i), edge(&points, j)) {
                    continue;
                }
                if reversal_delta(&points, i, j, &mut tests) < 0 {
                    points[i + 1..=j].reverse();
                    improved = true;
                    changed = true;
                }
            }
        }
        if !improved {
            break;
        }
    }

    changed.then_some(points)
}
