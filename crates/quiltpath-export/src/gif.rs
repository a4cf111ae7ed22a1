//! Animated GIF preview of the needle sewing a path.
//!
//! Every frame draws the whole path faintly (stitch teal, travel pink),
//! overlays the sewn prefix in dark blue, and marks the needle with a
//! dot whose colour tells stitch from travel. Frame `n` of
//! [`FRAME_COUNT`] shows `n / FRAME_COUNT` of the total length, so the
//! last frame is the finished path.
//!
//! Rendering uses [`tiny_skia`]; encoding uses the `image` crate's GIF
//! codec. This is a pure function with no I/O -- it returns the file
//! bytes.

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, Rgba, RgbaImage};
use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform,
};

use quiltpath_motion::{Bounds, MotionPath, PathMeasure, Point, Segment, SegmentKind};

use crate::profile::{ExportError, ExportOptions, PathWriter};

/// Frames in a full animation.
pub const FRAME_COUNT: u32 = 60;
/// Canvas width and height in pixels.
pub const CANVAS_SIZE: u32 = 700;
/// Display time of each frame in milliseconds.
pub const FRAME_DELAY_MS: u32 = 60;

/// Fraction of the canvas the drawing may fill.
const FILL_RATIO: f64 = 0.9;
/// NeuQuant sampling factor: 1 is slowest, 30 is fastest.
const QUANTIZER_SPEED: i32 = 10;
/// Smallest span used for scaling, so a straight line still fits.
const MIN_SPAN_MM: f64 = 1e-3;

const BACKGROUND: [u8; 3] = [0xfe, 0xfe, 0xfe];
const STITCH_BASE: [u8; 3] = [0x00, 0x80, 0x80];
const TRAVEL_BASE: [u8; 3] = [0xf4, 0xa1, 0xa1];
const PROGRESS: [u8; 3] = [0x00, 0x3c, 0x83];
const NEEDLE_STITCH: [u8; 3] = [0xe5, 0x39, 0x35];
const NEEDLE_TRAVEL: [u8; 3] = [0xf0, 0x62, 0x92];

const BASE_WIDTH: f32 = 2.0;
const PROGRESS_WIDTH: f32 = 3.0;
const NEEDLE_RADIUS: f32 = 4.0;

/// Animated GIF writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnimatedGif;

impl PathWriter for AnimatedGif {
    fn write(&self, path: &MotionPath, _options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
        to_gif(path)
    }
}

/// Uniform scale-and-translate from millimetres to canvas pixels.
#[derive(Debug, Clone, Copy)]
struct Viewport {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Viewport {
    /// Fit `bounds` centred inside a `size` x `size` canvas.
    fn fit(bounds: &Bounds, size: u32) -> Self {
        let size = f64::from(size);
        let span_x = bounds.width().max(MIN_SPAN_MM);
        let span_y = bounds.height().max(MIN_SPAN_MM);
        let scale = (size * FILL_RATIO / span_x).min(size * FILL_RATIO / span_y);
        Self {
            scale,
            offset_x: (size - span_x * scale) / 2.0 - bounds.min_x * scale,
            offset_y: (size - span_y * scale) / 2.0 - bounds.min_y * scale,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn map(&self, p: Point) -> (f32, f32) {
        (
            p.x.mul_add(self.scale, self.offset_x) as f32,
            p.y.mul_add(self.scale, self.offset_y) as f32,
        )
    }
}

fn paint_of(rgb: [u8; 3]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgb[0], rgb[1], rgb[2], 255);
    paint.anti_alias = true;
    paint
}

fn round_stroke(width: f32) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    }
}

/// Stroke the given segments as one path. Degenerate input draws nothing.
fn stroke_segments<'a>(
    pixmap: &mut Pixmap,
    viewport: &Viewport,
    segments: impl IntoIterator<Item = &'a Segment>,
    rgb: [u8; 3],
    width: f32,
) {
    let mut pb = PathBuilder::new();
    let mut pen: Option<Point> = None;
    for segment in segments {
        if pen != Some(segment.from) {
            let (x, y) = viewport.map(segment.from);
            pb.move_to(x, y);
        }
        let (x, y) = viewport.map(segment.to);
        pb.line_to(x, y);
        pen = Some(segment.to);
    }
    let Some(path) = pb.finish() else {
        return;
    };
    pixmap.stroke_path(
        &path,
        &paint_of(rgb),
        &round_stroke(width),
        Transform::identity(),
        None,
    );
}

/// Convert a premultiplied pixmap into a straight-alpha image.
#[allow(clippy::cast_possible_truncation)]
fn to_image(pixmap: &Pixmap) -> RgbaImage {
    let data = pixmap.data();
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (i, pixel) in img.pixels_mut().enumerate() {
        let off = i * 4;
        let a = data[off + 3];
        if a == 0 {
            *pixel = Rgba([0, 0, 0, 0]);
        } else {
            let r = u16::from(data[off]) * 255 / u16::from(a);
            let g = u16::from(data[off + 1]) * 255 / u16::from(a);
            let b = u16::from(data[off + 2]) * 255 / u16::from(a);
            *pixel = Rgba([r as u8, g as u8, b as u8, a]);
        }
    }
    img
}

/// Render the frame showing the first `distance` millimetres sewn.
fn render_frame(
    base: &Pixmap,
    viewport: &Viewport,
    measure: &PathMeasure<'_>,
    distance: f64,
) -> RgbaImage {
    let mut pixmap = base.clone();

    let sewn = measure.prefix(distance);
    stroke_segments(&mut pixmap, viewport, &sewn, PROGRESS, PROGRESS_WIDTH);

    let (needle, kind) = measure.point_at(distance);
    let (x, y) = viewport.map(needle);
    if let Some(dot) = PathBuilder::from_circle(x, y, NEEDLE_RADIUS) {
        let color = match kind {
            SegmentKind::Stitch => NEEDLE_STITCH,
            SegmentKind::Travel => NEEDLE_TRAVEL,
        };
        pixmap.fill_path(
            &dot,
            &paint_of(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    to_image(&pixmap)
}

/// Render the sewing animation for a path.
///
/// A path with no length yields a single frame.
///
/// # Errors
///
/// Returns [`ExportError::Canvas`] if the pixmap cannot be allocated and
/// [`ExportError::Image`] if GIF encoding fails.
pub fn to_gif(path: &MotionPath) -> Result<Vec<u8>, ExportError> {
    let viewport = Viewport::fit(&path.bounds(), CANVAS_SIZE);
    let measure = PathMeasure::new(path);
    let total = measure.total_length();

    let mut base = Pixmap::new(CANVAS_SIZE, CANVAS_SIZE).ok_or(ExportError::Canvas {
        width: CANVAS_SIZE,
        height: CANVAS_SIZE,
    })?;
    base.fill(Color::from_rgba8(BACKGROUND[0], BACKGROUND[1], BACKGROUND[2], 255));
    let segments = path.segments();
    stroke_segments(
        &mut base,
        &viewport,
        segments.iter().filter(|s| s.is_stitch()),
        STITCH_BASE,
        BASE_WIDTH,
    );
    stroke_segments(
        &mut base,
        &viewport,
        segments.iter().filter(|s| !s.is_stitch()),
        TRAVEL_BASE,
        BASE_WIDTH,
    );

    let frame_count = if total > 0.0 { FRAME_COUNT } else { 1 };
    let delay = Delay::from_numer_denom_ms(FRAME_DELAY_MS, 1);
    let frames = (1..=frame_count).map(|n| {
        let distance = total * f64::from(n) / f64::from(frame_count);
        let img = render_frame(&base, &viewport, &measure, distance);
        Frame::from_parts(img, 0, 0, delay)
    });

    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut bytes, QUANTIZER_SPEED);
        encoder.set_repeat(Repeat::Infinite)?;
        encoder.encode_frames(frames)?;
    }

    tracing::debug!(frames = frame_count, bytes = bytes.len(), "rendered GIF");
    Ok(bytes)
}
