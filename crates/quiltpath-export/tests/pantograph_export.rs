//! Integration test: normalize a wave, tile it as a pantograph, and export
//! the composed path in every registered format.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use quiltpath_export::{ExportOptions, PROFILES, export, profile};
use quiltpath_motion::{
    MotionPath, PantographLayout, Point, Segment, SegmentKind, compose_layout, normalize,
};

fn wave() -> Vec<Vec<Point>> {
    vec![vec![
        Point::new(0.0, 0.0),
        Point::new(5.0, -4.0),
        Point::new(10.0, 0.0),
        Point::new(15.0, 4.0),
        Point::new(20.0, 0.0),
    ]]
}

fn pantograph() -> MotionPath {
    let base = normalize(&wave()).unwrap();
    let params = PantographLayout {
        repeats: 3,
        rows: 2,
        row_spacing_mm: 12.0,
        ..PantographLayout::default()
    };
    compose_layout(&base, &params).unwrap()
}

#[test]
fn every_format_exports_deterministically() {
    let path = pantograph();
    let options = ExportOptions {
        export_entire_layout: true,
        ..ExportOptions::default()
    };
    for p in PROFILES {
        let first = export(&path, p, &options).unwrap();
        let second = export(&path, p, &options).unwrap();
        assert!(!first.is_empty(), "{} produced no bytes", p.id);
        assert_eq!(first, second, "{} output differs between runs", p.id);
    }
}

#[test]
fn composed_layout_is_one_stitch_run() {
    let path = pantograph();
    assert_eq!(path.count(SegmentKind::Travel), 0);
    let bytes = export(&path, profile("DXF").unwrap(), &ExportOptions::default()).unwrap();
    let dxf = String::from_utf8(bytes).unwrap();
    assert_eq!(dxf.matches("LWPOLYLINE").count(), 1);
    assert!(!dxf.contains("TRAVEL"));
}

#[test]
fn straight_stitch_dxf_coordinates() {
    let path = MotionPath::from_segments(vec![Segment::stitch(
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
    )])
    .unwrap();
    let bytes = export(&path, profile("dxf").unwrap(), &ExportOptions::default()).unwrap();
    let dxf = String::from_utf8(bytes).unwrap();

    let lines: Vec<&str> = dxf.lines().collect();
    let xs: Vec<&str> = lines
        .chunks(2)
        .filter(|pair| pair[0] == "10")
        .map(|pair| pair[1])
        .collect();
    let ys: Vec<&str> = lines
        .chunks(2)
        .filter(|pair| pair[0] == "20")
        .map(|pair| pair[1])
        .collect();
    assert_eq!(xs, vec!["0.0000", "10.0000"]);
    assert_eq!(ys, vec!["0.0000", "0.0000"]);
}

#[test]
fn qct_flattens_travel_in_order() {
    let base = normalize(&[
        vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
        vec![Point::new(20.0, 0.0), Point::new(30.0, 0.0)],
    ])
    .unwrap();
    let bytes = export(&base, profile("QCT").unwrap(), &ExportOptions::default()).unwrap();
    let dxf = String::from_utf8(bytes).unwrap();
    assert_eq!(dxf.matches("LINE\r\n").count(), 3);
}
