//! Arc-length measurement along a [`MotionPath`].
//!
//! [`PathMeasure`] precomputes cumulative segment lengths so a position
//! along the path can be looked up by distance travelled. Animated
//! previews use this to advance the needle at a constant speed
//! regardless of how the path is subdivided.

use crate::types::{MotionPath, Point, Segment, SegmentKind};

/// Anchor Y difference above which the pattern will not tile cleanly.
pub const Y_MISMATCH_THRESHOLD_MM: f64 = 0.1;

/// Slack added to [`Y_MISMATCH_THRESHOLD_MM`] to absorb float noise.
const Y_MISMATCH_EPSILON: f64 = 1e-9;

/// Cumulative arc-length index over a path.
#[derive(Debug, Clone)]
pub struct PathMeasure<'a> {
    path: &'a MotionPath,
    /// `ends[i]` is the distance travelled at the end of segment `i`.
    ends: Vec<f64>,
}

impl<'a> PathMeasure<'a> {
    /// Index the given path.
    #[must_use]
    pub fn new(path: &'a MotionPath) -> Self {
        let ends = path
            .segments()
            .iter()
            .scan(0.0, |acc, s| {
                *acc += s.length();
                Some(*acc)
            })
            .collect();
        Self { path, ends }
    }

    /// Total length in millimetres.
    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.ends.last().copied().unwrap_or(0.0)
    }

    /// Length of needle-down motion.
    #[must_use]
    pub fn stitch_length(&self) -> f64 {
        self.kind_length(SegmentKind::Stitch)
    }

    /// Length of needle-up motion.
    #[must_use]
    pub fn travel_length(&self) -> f64 {
        self.kind_length(SegmentKind::Travel)
    }

    fn kind_length(&self, kind: SegmentKind) -> f64 {
        self.path
            .segments()
            .iter()
            .filter(|s| s.kind == kind)
            .map(Segment::length)
            .sum()
    }

    /// Locate the segment containing `distance` and the fraction along it.
    fn locate(&self, distance: f64) -> (usize, f64) {
        let distance = distance.clamp(0.0, self.total_length());
        let last = self.ends.len().saturating_sub(1);
        let index = self.ends.partition_point(|&end| end < distance).min(last);
        let start = if index == 0 { 0.0 } else { self.ends[index - 1] };
        let length = self.ends[index] - start;
        let t = if length > 0.0 {
            ((distance - start) / length).clamp(0.0, 1.0)
        } else {
            1.0
        };
        (index, t)
    }

    /// Position and needle state after travelling `distance` millimetres.
    ///
    /// `distance` is clamped to `[0, total_length]`.
    #[must_use]
    pub fn point_at(&self, distance: f64) -> (Point, SegmentKind) {
        let segments = self.path.segments();
        if segments.is_empty() {
            return (self.path.first_point(), SegmentKind::default());
        }
        let (index, t) = self.locate(distance);
        let segment = segments[index];
        (segment.from.lerp(segment.to, t), segment.kind)
    }

    /// The segments traversed after travelling `distance` millimetres.
    ///
    /// The final segment is cut at the current position. A zero
    /// distance yields a single zero-length segment at the start anchor.
    #[must_use]
    pub fn prefix(&self, distance: f64) -> Vec<Segment> {
        let segments = self.path.segments();
        if segments.is_empty() {
            return Vec::new();
        }
        let (index, t) = self.locate(distance);
        let mut out = segments[..index].to_vec();
        let current = segments[index];
        out.push(Segment::new(
            current.from,
            current.from.lerp(current.to, t),
            current.kind,
        ));
        out
    }
}

/// Vertical drift between the start and end anchors, if large enough to
/// misalign tiled rows.
///
/// Returns `Some(|dy|)` when the anchors differ in y by more than
/// [`Y_MISMATCH_THRESHOLD_MM`].
#[must_use]
pub fn y_mismatch(path: &MotionPath) -> Option<f64> {
    let dy = (path.last_point().y - path.first_point().y).abs();
    (dy > Y_MISMATCH_THRESHOLD_MM + Y_MISMATCH_EPSILON).then_some(dy)
}
