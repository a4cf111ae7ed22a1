//! Human- and machine-readable summary of a motion path.

use serde::Serialize;

use crate::measure::{PathMeasure, y_mismatch};
use crate::optimize::{MAX_PAIR_TESTS, crossing_count_within};
use crate::types::{Bounds, MotionPath, Point, SegmentKind};

/// Counts and measurements describing a [`MotionPath`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathSummary {
    /// Total number of segments.
    pub segments: usize,
    /// Needle-down segments.
    pub stitch_segments: usize,
    /// Needle-up segments.
    pub travel_segments: usize,
    /// Needle-down distance in millimetres.
    pub stitch_length_mm: f64,
    /// Needle-up distance in millimetres.
    pub travel_length_mm: f64,
    /// Bounding box of every vertex.
    pub bounds: Bounds,
    /// First point of the path.
    pub start: Point,
    /// Last point of the path.
    pub end: Point,
    /// Start/end Y drift of the base pattern when it exceeds the tiling
    /// threshold.
    pub y_mismatch_mm: Option<f64>,
    /// Self-crossings inside stitch runs, `None` if the path is too long
    /// to count within the optimizer's pair-test budget.
    pub crossings: Option<usize>,
}

impl PathSummary {
    /// Measure a single pattern.
    #[must_use]
    pub fn of(path: &MotionPath) -> Self {
        Self::of_layout(path, path)
    }

    /// Measure `path`, taking the Y-axis anchor check from `base`.
    ///
    /// A composed layout starts and ends on different rows, so its own
    /// anchors say nothing about whether the pattern tiles cleanly.
    #[must_use]
    pub fn of_layout(base: &MotionPath, path: &MotionPath) -> Self {
        let measure = PathMeasure::new(path);
        Self {
            segments: path.len(),
            stitch_segments: path.count(SegmentKind::Stitch),
            travel_segments: path.count(SegmentKind::Travel),
            stitch_length_mm: measure.stitch_length(),
            travel_length_mm: measure.travel_length(),
            bounds: path.bounds(),
            start: path.first_point(),
            end: path.last_point(),
            y_mismatch_mm: y_mismatch(base),
            crossings: crossing_count_within(path, MAX_PAIR_TESTS),
        }
    }

    /// Format the summary as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Motion Path Summary\n{}", "=".repeat(40)));
        lines.push(format!(
            "{:<18} {:>8}  ({} stitch, {} travel)",
            "Segments:", self.segments, self.stitch_segments, self.travel_segments,
        ));
        lines.push(format!(
            "{:<18} {:>8.2} mm",
            "Stitch length:", self.stitch_length_mm
        ));
        lines.push(format!(
            "{:<18} {:>8.2} mm",
            "Travel length:", self.travel_length_mm
        ));
        lines.push(format!(
            "{:<18} {:.2} x {:.2} mm",
            "Size:",
            self.bounds.width(),
            self.bounds.height(),
        ));
        lines.push(format!(
            "{:<18} ({:.3}, {:.3}) -> ({:.3}, {:.3})",
            "Anchors:", self.start.x, self.start.y, self.end.x, self.end.y,
        ));
        let crossings = self
            .crossings
            .map_or_else(|| "skipped".to_owned(), |n| n.to_string());
        lines.push(format!("{:<18} {crossings:>8}", "Self-crossings:"));
        if let Some(dy) = self.y_mismatch_mm {
            lines.push(format!(
                "WARNING: start and end anchors differ in Y by {dy:.3} mm"
            ));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::Segment;

    fn sample() -> MotionPath {
        MotionPath::from_segments(vec![
            Segment::stitch(Point::new(0.0, 0.0), Point::new(10.0, 0.0)),
            Segment::travel(Point::new(10.0, 0.0), Point::new(10.0, 2.0)),
            Segment::stitch(Point::new(10.0, 2.0), Point::new(20.0, 2.0)),
        ])
        .unwrap()
    }

    #[test]
    fn counts_and_lengths() {
        let s = PathSummary::of(&sample());
        assert_eq!(s.segments, 3);
        assert_eq!(s.stitch_segments, 2);
        assert_eq!(s.travel_segments, 1);
        assert!((s.stitch_length_mm - 20.0).abs() < 1e-12);
        assert!((s.travel_length_mm - 2.0).abs() < 1e-12);
        assert_eq!(s.crossings, Some(0));
        assert!(s.y_mismatch_mm.is_some());
    }

    #[test]
    fn report_mentions_mismatch() {
        let report = PathSummary::of(&sample()).report();
        assert!(report.contains("Segments:"));
        assert!(report.contains("differ in Y by 2.000 mm"));
    }

    #[test]
    fn layout_takes_anchor_check_from_base() {
        use crate::layout::PantographLayout;
        use crate::switchback::compose_layout;

        let base = MotionPath::from_segments(vec![
            Segment::stitch(Point::new(0.0, 0.0), Point::new(5.0, 4.0)),
            Segment::stitch(Point::new(5.0, 4.0), Point::new(10.0, 0.0)),
        ])
        .unwrap();
        let params = PantographLayout {
            repeats: 3,
            rows: 2,
            ..PantographLayout::default()
        };
        let composed = compose_layout(&base, &params).unwrap();

        let s = PathSummary::of_layout(&base, &composed);
        assert_eq!(s.y_mismatch_mm, None);
        assert_eq!(s.segments, composed.len());
        assert!(!s.report().contains("WARNING"));
    }

    #[test]
    fn serializes_to_json() {
        let json = serde_json::to_value(PathSummary::of(&sample())).unwrap();
        assert_eq!(json["travel_segments"], 1);
        assert_eq!(json["bounds"]["max_x"], 20.0);
    }
}
