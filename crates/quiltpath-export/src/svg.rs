//! SVG preview serializer.
//!
//! Emits a millimetre-sized document whose user units are the path's own
//! millimetres, so the preview prints at true scale. Stitch runs go into
//! `<g id="stitch">`; travel runs go into a dashed `<g id="travel">`.
//! Both SVG and the motion path are Y-down, so coordinates are copied
//! unchanged.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::Text;
use svg::node::element::path::Data;
use svg::node::element::{Description, Group, Path, Title};

use quiltpath_motion::{MotionPath, Point, SegmentKind};

use crate::dxf::kind_runs;
use crate::profile::{ExportError, ExportOptions, PathWriter};

/// Blank border around the drawing in millimetres.
const MARGIN_MM: f64 = 5.0;

const STITCH_COLOR: &str = "#008080";
const TRAVEL_COLOR: &str = "#f4a1a1";

/// SVG preview writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgPreview;

impl PathWriter for SvgPreview {
    fn write(&self, path: &MotionPath, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
        Ok(to_svg(path, options).into_bytes())
    }
}

fn path_data(points: &[Point]) -> Data {
    let mut data = Data::new();
    if let Some((first, rest)) = points.split_first() {
        data = data.move_to((first.x, first.y));
        for p in rest {
            data = data.line_to((p.x, p.y));
        }
    }
    data
}

/// Serialize a path into an SVG document string.
///
/// # Examples
///
/// ```
/// use quiltpath_export::ExportOptions;
/// use quiltpath_export::svg::to_svg;
/// use quiltpath_motion::{MotionPath, Point, Segment};
///
/// let path = MotionPath::from_segments(vec![Segment::stitch(
///     Point::new(0.0, 0.0),
///     Point::new(10.0, 5.0),
/// )])
/// .unwrap();
/// let svg = to_svg(&path, &ExportOptions::default());
/// assert!(svg.contains(r#"<g id="stitch""#));
/// assert!(svg.contains("M0,0 L10,5"));
/// ```
#[must_use]
pub fn to_svg(path: &MotionPath, options: &ExportOptions) -> String {
    let bounds = path.bounds();
    let width = 2.0f64.mul_add(MARGIN_MM, bounds.width());
    let height = 2.0f64.mul_add(MARGIN_MM, bounds.height());

    let scope = if options.export_entire_layout {
        "entire layout"
    } else {
        "single pattern"
    };
    let description = format!(
        "Quilting motion path ({scope}): {} segments, {:.1} mm",
        path.len(),
        path.length(),
    );

    let mut stitch = Group::new()
        .set("id", "stitch")
        .set("fill", "none")
        .set("stroke", STITCH_COLOR)
        .set("stroke-width", 0.5)
        .set("stroke-linecap", "round")
        .set("stroke-linejoin", "round");
    let mut travel = Group::new()
        .set("id", "travel")
        .set("fill", "none")
        .set("stroke", TRAVEL_COLOR)
        .set("stroke-width", 0.3)
        .set("stroke-dasharray", "1 1");

    for (kind, points) in kind_runs(path) {
        let element = Path::new().set("d", path_data(&points));
        match kind {
            SegmentKind::Stitch => stitch = stitch.add(element),
            SegmentKind::Travel => travel = travel.add(element),
        }
    }

    let doc = Document::new()
        .set("width", format!("{width}mm"))
        .set("height", format!("{height}mm"))
        .set(
            "viewBox",
            format!(
                "{} {} {width} {height}",
                bounds.min_x - MARGIN_MM,
                bounds.min_y - MARGIN_MM,
            ),
        )
        .add(Title::new("quiltpath motion path"))
        .add(Description::new().add(Text::new(description)))
        .add(travel)
        .add(stitch);

    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use quiltpath_motion::Segment;

    fn mixed() -> MotionPath {
        MotionPath::from_segments(vec![
            Segment::stitch(Point::new(0.0, 0.0), Point::new(10.0, 0.0)),
            Segment::travel(Point::new(10.0, 0.0), Point::new(10.0, 20.0)),
            Segment::stitch(Point::new(10.0, 20.0), Point::new(30.0, 20.0)),
        ])
        .unwrap()
    }

    #[test]
    fn sized_in_millimetres_with_margin() {
        let svg = to_svg(&mixed(), &ExportOptions::default());
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg"));
        assert!(svg.contains(r#"width="40mm""#));
        assert!(svg.contains(r#"height="30mm""#));
        assert!(svg.contains(r#"viewBox="-5 -5 40 30""#));
    }

    #[test]
    fn runs_grouped_by_kind() {
        let svg = to_svg(&mixed(), &ExportOptions::default());
        let stitch = svg.find(r#"<g id="stitch""#).unwrap();
        let travel = svg.find(r#"<g id="travel""#).unwrap();
        assert!(travel < stitch);
        assert_eq!(svg.matches("<path").count(), 3);
        assert!(svg[travel..stitch].contains("M10,0 L10,20"));
        assert!(svg[stitch..].contains("M10,20 L30,20"));
    }

    #[test]
    fn description_records_scope() {
        let single = to_svg(&mixed(), &ExportOptions::default());
        assert!(single.contains("single pattern"));
        let options = ExportOptions {
            export_entire_layout: true,
            ..ExportOptions::default()
        };
        let layout = to_svg(&mixed(), &options);
        assert!(layout.contains("entire layout"));
        assert!(layout.contains("<title>quiltpath motion path</title>"));
    }
}
