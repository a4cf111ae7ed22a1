//! DXF export serializers.
//!
//! DXF is a sequence of group-code / value line pairs. Two variants are
//! written:
//!
//! - [`LwPolylineDxf`]: one `LWPOLYLINE` per contiguous run of
//!   same-kind segments, stitch runs on layer `STITCH` and travel runs on
//!   layer `TRAVEL`. A `$INSUNITS` header fixes the unit to millimetres.
//! - [`LineDxf`]: one `LINE` per segment on a single layer named `Layer`,
//!   CRLF line endings and trimmed numbers, for quilting controllers that
//!   cannot parse polylines. Stitch and travel are flattened in path
//!   order.
//!
//! Motion paths are Y-down; DXF is Y-up, so every writer emits `(x, -y)`.
//!
//! These are pure functions with no I/O -- they return the file bytes.

use std::fmt::Write;

use quiltpath_motion::{MotionPath, Point, SegmentKind};

use crate::profile::{ExportError, ExportOptions, PathWriter};

/// `$INSUNITS` value for millimetres.
const INSUNITS_MILLIMETRES: u32 = 4;

/// Layer name for needle-down runs.
pub const STITCH_LAYER: &str = "STITCH";
/// Layer name for needle-up runs.
pub const TRAVEL_LAYER: &str = "TRAVEL";
/// Single layer used by the line variant.
pub const LINE_LAYER: &str = "Layer";

/// Lightweight-polyline DXF writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LwPolylineDxf;

/// Line-entity DXF writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineDxf;

impl PathWriter for LwPolylineDxf {
    fn write(&self, path: &MotionPath, _options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
        Ok(to_dxf(path).into_bytes())
    }
}

impl PathWriter for LineDxf {
    fn write(&self, path: &MotionPath, _options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
        Ok(to_line_dxf(path).into_bytes())
    }
}

/// Convert an editor point to DXF coordinates.
fn cartesian(p: Point) -> (f64, f64) {
    (p.x, -p.y)
}

/// Format a coordinate with four decimals, without a negative zero.
fn format_fixed(value: f64) -> String {
    let text = format!("{value:.4}");
    if text == "-0.0000" {
        "0.0000".to_owned()
    } else {
        text
    }
}

/// Format a coordinate with trailing zeros trimmed, e.g. `10` or `2.5`.
fn format_trimmed(value: f64) -> String {
    format_fixed(value)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_owned()
}

/// Split a path into maximal same-kind runs, each as its vertex list.
pub(crate) fn kind_runs(path: &MotionPath) -> Vec<(SegmentKind, Vec<Point>)> {
    let mut runs: Vec<(SegmentKind, Vec<Point>)> = Vec::new();
    for segment in path.segments() {
        match runs.last_mut() {
            Some((kind, points)) if *kind == segment.kind => points.push(segment.to),
            _ => runs.push((segment.kind, vec![segment.from, segment.to])),
        }
    }
    runs
}

/// Serialize a path as a polyline DXF string.
///
/// # Examples
///
/// ```
/// use quiltpath_motion::{MotionPath, Point, Segment};
/// use quiltpath_export::dxf::to_dxf;
///
/// let path = MotionPath::from_segments(vec![Segment::stitch(
///     Point::new(0.0, 0.0),
///     Point::new(10.0, 0.0),
/// )])
/// .unwrap();
/// let dxf = to_dxf(&path);
/// assert_eq!(dxf.matches("LWPOLYLINE").count(), 1);
/// assert!(dxf.contains("10\n10.0000\n20\n0.0000\n"));
/// ```
#[must_use]
pub fn to_dxf(path: &MotionPath) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "0\nSECTION\n2\nHEADER");
    let _ = writeln!(out, "9\n$INSUNITS\n70\n{INSUNITS_MILLIMETRES}");
    let _ = writeln!(out, "0\nENDSEC");

    let _ = writeln!(out, "0\nSECTION\n2\nENTITIES");
    for (kind, points) in kind_runs(path) {
        let layer = match kind {
            SegmentKind::Stitch => STITCH_LAYER,
            SegmentKind::Travel => TRAVEL_LAYER,
        };
        let _ = writeln!(out, "0\nLWPOLYLINE\n8\n{layer}");
        let _ = writeln!(out, "90\n{}\n70\n0", points.len());
        for p in points {
            let (x, y) = cartesian(p);
            let _ = writeln!(out, "10\n{}\n20\n{}", format_fixed(x), format_fixed(y));
        }
    }
    let _ = writeln!(out, "0\nENDSEC");
    let _ = write!(out, "0\nEOF");

    out
}

/// Serialize a path as a line-entity DXF string with CRLF endings.
///
/// Group codes are padded with one space on each side and numbers carry
/// a trailing space, matching what the target controllers expect.
#[must_use]
pub fn to_line_dxf(path: &MotionPath) -> String {
    fn code(out: &mut String, code: u32, value: &str) {
        let _ = write!(out, " {code} \r\n{value}\r\n");
    }
    let number = |value: f64| format!("{} ", format_trimmed(value));

    let mut out = String::new();

    code(&mut out, 0, "SECTION");
    code(&mut out, 2, "ENTITIES");
    for segment in path.segments() {
        let (x1, y1) = cartesian(segment.from);
        let (x2, y2) = cartesian(segment.to);
        code(&mut out, 0, "LINE");
        code(&mut out, 8, LINE_LAYER);
        code(&mut out, 10, &number(x1));
        code(&mut out, 20, &number(y1));
        code(&mut out, 11, &number(x2));
        code(&mut out, 21, &number(y2));
    }
    code(&mut out, 0, "ENDSEC");
    code(&mut out, 0, "EOF");

    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use quiltpath_motion::Segment;

    fn path_of(segments: Vec<Segment>) -> MotionPath {
        MotionPath::from_segments(segments).unwrap()
    }

    fn straight() -> MotionPath {
        path_of(vec![Segment::stitch(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
        )])
    }

    fn mixed() -> MotionPath {
        path_of(vec![
            Segment::stitch(Point::new(0.0, 0.0), Point::new(5.0, 2.5)),
            Segment::stitch(Point::new(5.0, 2.5), Point::new(10.0, 0.0)),
            Segment::travel(Point::new(10.0, 0.0), Point::new(20.0, 0.0)),
            Segment::stitch(Point::new(20.0, 0.0), Point::new(30.0, 0.0)),
        ])
    }

    /// Parse `(code, value)` pairs from LF-separated DXF text.
    fn pairs(dxf: &str) -> Vec<(String, String)> {
        let lines: Vec<&str> = dxf.lines().collect();
        lines
            .chunks(2)
            .map(|c| (c[0].trim().to_owned(), c[1].trim().to_owned()))
            .collect()
    }

    // --- number formatting ---

    #[test]
    fn negative_zero_normalized() {
        assert_eq!(format_fixed(-0.0), "0.0000");
        assert_eq!(format_fixed(-0.00001), "0.0000");
        assert_eq!(format_fixed(-1.5), "-1.5000");
    }

    #[test]
    fn trimmed_numbers() {
        assert_eq!(format_trimmed(10.0), "10");
        assert_eq!(format_trimmed(-2.5), "-2.5");
        assert_eq!(format_trimmed(0.12346), "0.1235");
        assert_eq!(format_trimmed(-0.0), "0");
    }

    // --- polyline DXF ---

    #[test]
    fn straight_stitch_round_trip() {
        let p = pairs(&to_dxf(&straight()));
        let entities: Vec<usize> = p
            .iter()
            .enumerate()
            .filter(|(_, (c, v))| c == "0" && v == "LWPOLYLINE")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(entities.len(), 1);
        let e = entities[0];
        assert_eq!(p[e + 1], ("8".to_owned(), "STITCH".to_owned()));
        assert_eq!(p[e + 2], ("90".to_owned(), "2".to_owned()));
        let coords: Vec<&str> = p[e + 4..e + 8].iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(coords, vec!["0.0000", "0.0000", "10.0000", "0.0000"]);
    }

    #[test]
    fn runs_split_by_kind_onto_layers() {
        let dxf = to_dxf(&mixed());
        let layers: Vec<String> = pairs(&dxf)
            .into_iter()
            .filter(|(c, _)| c == "8")
            .map(|(_, v)| v)
            .collect();
        assert_eq!(layers, vec!["STITCH", "TRAVEL", "STITCH"]);
        // First stitch run has three vertices.
        assert!(dxf.contains("LWPOLYLINE\n8\nSTITCH\n90\n3\n"));
    }

    #[test]
    fn y_axis_flipped() {
        let dxf = to_dxf(&mixed());
        assert!(dxf.contains("10\n5.0000\n20\n-2.5000\n"));
    }

    #[test]
    fn millimetre_header_and_terminator() {
        let dxf = to_dxf(&straight());
        assert!(dxf.starts_with("0\nSECTION\n2\nHEADER\n9\n$INSUNITS\n70\n4\n"));
        assert!(dxf.ends_with("0\nEOF"));
    }

    // --- line DXF ---

    #[test]
    fn line_variant_one_entity_per_segment() {
        let dxf = to_line_dxf(&mixed());
        assert_eq!(dxf.matches(" 0 \r\nLINE\r\n").count(), 4);
        assert!(!dxf.replace("\r\n", "").contains('\n'));
        assert!(dxf.ends_with(" 0 \r\nEOF\r\n"));
        assert!(!dxf.contains("STITCH"));
        assert!(dxf.contains(" 8 \r\nLayer\r\n"));
    }

    #[test]
    fn line_variant_coordinates() {
        let dxf = to_line_dxf(&straight());
        assert!(dxf.contains(" 10 \r\n0 \r\n 20 \r\n0 \r\n 11 \r\n10 \r\n 21 \r\n0 \r\n"));
    }

    #[test]
    fn line_variant_preserves_order() {
        let dxf = to_line_dxf(&mixed());
        let travel_start = dxf.find(" 10 \r\n10 \r\n").unwrap();
        let last_start = dxf.find(" 10 \r\n20 \r\n").unwrap();
        assert!(travel_start < last_start);
    }
}
