//! Shared types for the quiltpath motion pipeline.

use serde::{Deserialize, Serialize};

/// Distance in millimetres below which two points are the same point.
pub const TOLERANCE_MM: f64 = 1e-6;

/// A 2D point in millimetres.
///
/// Coordinates follow the editor convention: x grows to the right and
/// y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position in millimetres.
    pub x: f64,
    /// Vertical position in millimetres (downward).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Returns `true` if the two points are within [`TOLERANCE_MM`].
    #[must_use]
    pub fn coincides(self, other: Self) -> bool {
        self.distance(other) <= TOLERANCE_MM
    }

    /// Linear interpolation towards `other`; `t = 0` is `self`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self::new(
            (other.x - self.x).mul_add(t, self.x),
            (other.y - self.y).mul_add(t, self.y),
        )
    }
}

/// Whether the needle is down (sewing) or up (repositioning).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Needle-down motion following the design.
    #[default]
    Stitch,
    /// Needle-up jump between disconnected sub-paths.
    Travel,
}

/// One straight move of the machine head.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start of the move.
    pub from: Point,
    /// End of the move.
    pub to: Point,
    /// Needle state during the move.
    #[serde(default)]
    pub kind: SegmentKind,
}

impl Segment {
    /// Create a new segment.
    #[must_use]
    pub const fn new(from: Point, to: Point, kind: SegmentKind) -> Self {
        Self { from, to, kind }
    }

    /// Create a needle-down segment.
    #[must_use]
    pub const fn stitch(from: Point, to: Point) -> Self {
        Self::new(from, to, SegmentKind::Stitch)
    }

    /// Create a needle-up segment.
    #[must_use]
    pub const fn travel(from: Point, to: Point) -> Self {
        Self::new(from, to, SegmentKind::Travel)
    }

    /// Length of the move in millimetres.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.from.distance(self.to)
    }

    /// The same move traversed in the opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self::new(self.to, self.from, self.kind)
    }

    /// Returns `true` if the needle is down.
    #[must_use]
    pub fn is_stitch(&self) -> bool {
        self.kind == SegmentKind::Stitch
    }
}

/// Axis-aligned bounding box in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Smallest x.
    pub min_x: f64,
    /// Smallest y.
    pub min_y: f64,
    /// Largest x.
    pub max_x: f64,
    /// Largest y.
    pub max_y: f64,
}

impl Bounds {
    /// Bounding box of a set of points, or `None` if there are none.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let init = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(points.fold(init, |b, p| Self {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    /// Width in millimetres.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height in millimetres.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Centre of the box.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// The box moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }
}

/// An ordered, rail-connected, non-empty sequence of segments.
///
/// Segment order is machine execution order. Every constructor checks
/// that each segment starts where the previous one ended (within
/// [`TOLERANCE_MM`]), so holders of a `MotionPath` never need to
/// re-validate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Segment>", into = "Vec<Segment>")]
pub struct MotionPath(Vec<Segment>);

impl MotionPath {
    /// Build a path from segments, checking the invariants.
    ///
    /// # Errors
    ///
    /// Returns [`MotionError::EmptyInput`] if `segments` is empty and
    /// [`MotionError::Disconnected`] at the first pair of neighbours
    /// that do not meet.
    pub fn from_segments(segments: Vec<Segment>) -> Result<Self, MotionError> {
        if segments.is_empty() {
            return Err(MotionError::EmptyInput);
        }
        for (i, pair) in segments.windows(2).enumerate() {
            if !pair[0].to.coincides(pair[1].from) {
                return Err(MotionError::Disconnected {
                    index: i + 1,
                    gap_mm: pair[0].to.distance(pair[1].from),
                });
            }
        }
        Ok(Self(segments))
    }

    /// Returns a slice of all segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Consumes the path and returns the underlying segments.
    #[must_use]
    pub fn into_segments(self) -> Vec<Segment> {
        self.0
    }

    /// Number of segments. Never zero.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with collections.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Start anchor.
    #[must_use]
    pub fn first_point(&self) -> Point {
        self.0.first().map_or(Point::new(0.0, 0.0), |s| s.from)
    }

    /// End anchor.
    #[must_use]
    pub fn last_point(&self) -> Point {
        self.0.last().map_or(Point::new(0.0, 0.0), |s| s.to)
    }

    /// Every vertex in traversal order: the first `from`, then each `to`.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        std::iter::once(self.first_point()).chain(self.0.iter().map(|s| s.to))
    }

    /// Bounding box of every vertex.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        let anchor = self.first_point();
        Bounds::from_points(self.points()).unwrap_or(Bounds {
            min_x: anchor.x,
            min_y: anchor.y,
            max_x: anchor.x,
            max_y: anchor.y,
        })
    }

    /// Total length of all segments in millimetres.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.0.iter().map(Segment::length).sum()
    }

    /// Number of segments of the given kind.
    #[must_use]
    pub fn count(&self, kind: SegmentKind) -> usize {
        self.0.iter().filter(|s| s.kind == kind).count()
    }
}

impl TryFrom<Vec<Segment>> for MotionPath {
    type Error = MotionError;

    fn try_from(segments: Vec<Segment>) -> Result<Self, Self::Error> {
        Self::from_segments(segments)
    }
}

impl From<MotionPath> for Vec<Segment> {
    fn from(path: MotionPath) -> Self {
        path.0
    }
}

/// Errors from the motion pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MotionError {
    /// No sub-path had two distinct points.
    #[error("no usable geometry: every sub-path has fewer than two distinct points")]
    EmptyInput,

    /// A layout was composed from a degenerate base pattern or no tiles.
    #[error("cannot compose a layout from an empty pattern")]
    EmptyPattern,

    /// Segment `index` does not start where segment `index - 1` ends.
    #[error("segment {index} starts {gap_mm:.6} mm away from the previous segment's end")]
    Disconnected {
        /// Index of the segment that does not connect.
        index: usize,
        /// Size of the gap in millimetres.
        gap_mm: f64,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    // --- Point ---

    #[test]
    fn distance_is_euclidean() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn coincides_within_tolerance() {
        let a = Point::new(1.0, 1.0);
        assert!(a.coincides(Point::new(1.0 + 5e-7, 1.0)));
        assert!(!a.coincides(Point::new(1.0 + 1e-5, 1.0)));
    }

    #[test]
    fn lerp_midpoint() {
        let m = Point::new(0.0, 0.0).lerp(Point::new(10.0, -4.0), 0.5);
        assert_eq!(m, Point::new(5.0, -2.0));
    }

    // --- Segment ---

    #[test]
    fn reversed_swaps_endpoints_and_keeps_kind() {
        let s = Segment::travel(Point::new(1.0, 2.0), Point::new(3.0, 4.0));
        let r = s.reversed();
        assert_eq!(r.from, s.to);
        assert_eq!(r.to, s.from);
        assert_eq!(r.kind, SegmentKind::Travel);
    }

    // --- MotionPath ---

    #[test]
    fn empty_path_rejected() {
        assert_eq!(
            MotionPath::from_segments(Vec::new()),
            Err(MotionError::EmptyInput)
        );
    }

    #[test]
    fn disconnected_path_rejected_at_gap() {
        let segments = vec![
            Segment::stitch(Point::new(0.0, 0.0), Point::new(1.0, 0.0)),
            Segment::stitch(Point::new(1.0, 0.0), Point::new(2.0, 0.0)),
            Segment::stitch(Point::new(2.5, 0.0), Point::new(3.0, 0.0)),
        ];
        assert_eq!(
            MotionPath::from_segments(segments),
            Err(MotionError::Disconnected {
                index: 2,
                gap_mm: 0.5
            })
        );
    }

    #[test]
    fn anchors_bounds_and_counts() {
        let path = MotionPath::from_segments(vec![
            Segment::stitch(Point::new(0.0, 0.0), Point::new(4.0, 0.0)),
            Segment::travel(Point::new(4.0, 0.0), Point::new(4.0, 3.0)),
            Segment::stitch(Point::new(4.0, 3.0), Point::new(-1.0, 3.0)),
        ])
        .unwrap();
        assert_eq!(path.first_point(), Point::new(0.0, 0.0));
        assert_eq!(path.last_point(), Point::new(-1.0, 3.0));
        assert_eq!(path.count(SegmentKind::Stitch), 2);
        assert_eq!(path.count(SegmentKind::Travel), 1);
        assert!((path.length() - 12.0).abs() < 1e-12);
        assert_eq!(
            path.bounds(),
            Bounds {
                min_x: -1.0,
                min_y: 0.0,
                max_x: 4.0,
                max_y: 3.0,
            }
        );
        assert_eq!(path.points().count(), 4);
    }

    #[test]
    fn serde_round_trip_revalidates() {
        let path = MotionPath::from_segments(vec![Segment::stitch(
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
        )])
        .unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert!(json.contains("\"stitch\""));
        let back: MotionPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);

        let broken = r#"[
            {"from":{"x":0,"y":0},"to":{"x":1,"y":0}},
            {"from":{"x":5,"y":0},"to":{"x":6,"y":0}}
        ]"#;
        assert!(serde_json::from_str::<MotionPath>(broken).is_err());
    }

    #[test]
    fn bounds_union_and_center() {
        let a = Bounds::from_points([Point::new(0.0, 0.0), Point::new(2.0, 2.0)]).unwrap();
        let b = a.translated(Point::new(3.0, 0.0));
        let u = a.union(&b);
        assert!((u.width() - 5.0).abs() < f64::EPSILON);
        assert!((u.height() - 2.0).abs() < f64::EPSILON);
        assert_eq!(u.center(), Point::new(2.5, 1.0));
        assert!(Bounds::from_points(std::iter::empty()).is_none());
    }
}
