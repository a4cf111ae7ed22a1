//! Pantograph layout: place copies of one pattern on a staggered grid.
//!
//! A pantograph is a row of edge-to-edge copies of a pattern, repeated
//! down the quilt. The horizontal pitch is the distance between the
//! pattern's start and end anchors rather than its bounding-box width,
//! so the end of one copy lands exactly on the start of the next even
//! when the pattern overhangs its anchors.
//!
//! Staggered rows are shifted sideways by a fraction of the pitch. The
//! gap this opens at the row's leading edge is closed by adding one more
//! whole copy there; the copy is not clipped and may overhang the
//! nominal rectangle.
//!
//! Mirroring and flipping are recorded on each [`LayoutInstance`] and
//! applied only when an instance is materialized, so the base pattern is
//! never modified.

use serde::{Deserialize, Serialize};

use crate::types::{Bounds, MotionPath, Point, Segment, TOLERANCE_MM};

/// Pantograph tiling parameters.
///
/// All fields have defaults so partial JSON configs deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PantographLayout {
    /// Copies per row. Values below 1 are treated as 1.
    pub repeats: u32,

    /// Number of rows. Values below 1 are treated as 1.
    pub rows: u32,

    /// Vertical distance between rows in millimetres.
    ///
    /// Zero or negative values are accepted; rows then overlap.
    pub row_spacing_mm: f64,

    /// Shift odd rows sideways by [`stagger_percent`](Self::stagger_percent).
    pub stagger: bool,

    /// Odd-row shift as a percentage of the pattern pitch, `0..=100`.
    pub stagger_percent: f64,

    /// Mirror odd rows left-to-right.
    pub mirror_every_other_row_h: bool,

    /// Mirror odd rows top-to-bottom.
    pub mirror_every_other_row_v: bool,

    /// Mirror every copy left-to-right.
    pub flip_h: bool,

    /// Mirror every copy top-to-bottom.
    pub flip_v: bool,
}

impl PantographLayout {
    /// Default number of copies per row.
    pub const DEFAULT_REPEATS: u32 = 2;
    /// Default number of rows.
    pub const DEFAULT_ROWS: u32 = 2;
    /// Default row spacing in millimetres.
    pub const DEFAULT_ROW_SPACING_MM: f64 = 50.0;
    /// Default stagger as a percentage of the pitch.
    pub const DEFAULT_STAGGER_PERCENT: f64 = 50.0;

    /// Default parameters with the row spacing set to the pattern height,
    /// so rows sit flush above one another.
    #[must_use]
    pub fn for_pattern(base: &MotionPath) -> Self {
        Self {
            row_spacing_mm: base.bounds().height(),
            ..Self::default()
        }
    }

    /// `repeats`, at least 1.
    #[must_use]
    pub fn effective_repeats(&self) -> u32 {
        self.repeats.max(1)
    }

    /// `rows`, at least 1.
    #[must_use]
    pub fn effective_rows(&self) -> u32 {
        self.rows.max(1)
    }

    /// Horizontal shift of row `row` in millimetres for a given pitch.
    #[must_use]
    pub fn row_offset(&self, row: u32, pitch: f64) -> f64 {
        if self.stagger && row % 2 == 1 {
            self.stagger_percent.clamp(0.0, 100.0) / 100.0 * pitch
        } else {
            0.0
        }
    }
}

impl Default for PantographLayout {
    fn default() -> Self {
        Self {
            repeats: Self::DEFAULT_REPEATS,
            rows: Self::DEFAULT_ROWS,
            row_spacing_mm: Self::DEFAULT_ROW_SPACING_MM,
            stagger: false,
            stagger_percent: Self::DEFAULT_STAGGER_PERCENT,
            mirror_every_other_row_h: false,
            mirror_every_other_row_v: false,
            flip_h: false,
            flip_v: false,
        }
    }
}

/// One placed copy of the base pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutInstance {
    /// Row index, 0 at the top.
    pub row: u32,
    /// Column index in pitch units. Edge-fill copies sit at -1 or
    /// `repeats`.
    pub column: i32,
    /// Translation applied after mirroring.
    pub offset: Point,
    /// Per-row horizontal mirror.
    pub mirror_h: bool,
    /// Per-row vertical mirror.
    pub mirror_v: bool,
    /// Global horizontal flip.
    pub flip_h: bool,
    /// Global vertical flip.
    pub flip_v: bool,
}

impl LayoutInstance {
    /// Whether the net horizontal orientation is mirrored.
    ///
    /// A row mirror and a global flip cancel out.
    #[must_use]
    pub const fn net_mirror_h(&self) -> bool {
        self.mirror_h ^ self.flip_h
    }

    /// Whether the net vertical orientation is mirrored.
    #[must_use]
    pub const fn net_mirror_v(&self) -> bool {
        self.mirror_v ^ self.flip_v
    }

    /// Map a base-pattern point into this instance.
    ///
    /// Mirrors about `center` (the base pattern's bounding-box centre),
    /// then translates by [`offset`](Self::offset).
    #[must_use]
    pub fn transform(&self, p: Point, center: Point) -> Point {
        let x = if self.net_mirror_h() {
            2.0f64.mul_add(center.x, -p.x)
        } else {
            p.x
        };
        let y = if self.net_mirror_v() {
            2.0f64.mul_add(center.y, -p.y)
        } else {
            p.y
        };
        Point::new(x + self.offset.x, y + self.offset.y)
    }

    /// The base pattern's segments placed by this instance, in the base
    /// pattern's traversal order.
    #[must_use]
    pub fn materialize(&self, base: &MotionPath) -> Vec<Segment> {
        let center = base.bounds().center();
        base.segments()
            .iter()
            .map(|s| {
                Segment::new(
                    self.transform(s.from, center),
                    self.transform(s.to, center),
                    s.kind,
                )
            })
            .collect()
    }
}

/// Horizontal pitch between adjacent copies.
///
/// The signed x distance from the start anchor to the end anchor; falls
/// back to the bounding-box width when the anchors are vertically
/// aligned.
#[must_use]
pub fn pattern_pitch(base: &MotionPath) -> f64 {
    let dx = base.last_point().x - base.first_point().x;
    if dx.abs() < TOLERANCE_MM {
        base.bounds().width()
    } else {
        dx
    }
}

/// Place copies of `base` on the pantograph grid.
///
/// Instances are ordered by row, then by column.
#[must_use]
pub fn layout(base: &MotionPath, params: &PantographLayout) -> Vec<LayoutInstance> {
    let pitch = pattern_pitch(base);
    let step = pitch.abs();
    let repeats = params.effective_repeats();
    let rows = params.effective_rows();
    let row_width = f64::from(repeats) * step;

    let mut instances = Vec::new();
    for row in 0..rows {
        let shift = params.row_offset(row, pitch);
        // Shift measured along the direction copies advance.
        let advance = shift * pitch.signum();

        let mut first = 0_i32;
        let mut last = i32::try_from(repeats).unwrap_or(i32::MAX) - 1;
        if step > TOLERANCE_MM {
            while f64::from(first).mul_add(step, advance) > TOLERANCE_MM {
                first -= 1;
            }
            while f64::from(last + 1).mul_add(step, advance) < row_width - TOLERANCE_MM {
                last += 1;
            }
        }

        let odd = row % 2 == 1;
        for column in first..=last {
            instances.push(LayoutInstance {
                row,
                column,
                offset: Point::new(
                    f64::from(column).mul_add(pitch, shift),
                    f64::from(row) * params.row_spacing_mm,
                ),
                mirror_h: odd && params.mirror_every_other_row_h,
                mirror_v: odd && params.mirror_every_other_row_v,
                flip_h: params.flip_h,
                flip_v: params.flip_v,
            });
        }
        if first < 0 || last >= i32::try_from(repeats).unwrap_or(i32::MAX) {
            tracing::debug!(row, first, last, "added edge-fill copies to staggered row");
        }
    }
    instances
}

/// Rectangle covered by the nominal `repeats × rows` grid.
///
/// Ignores stagger and edge-fill copies.
#[must_use]
pub fn layout_bounds(base: &MotionPath, params: &PantographLayout) -> Bounds {
    let pitch = pattern_pitch(base);
    let bounds = base.bounds();
    let last_column = f64::from(params.effective_repeats() - 1) * pitch;
    let last_row = f64::from(params.effective_rows() - 1) * params.row_spacing_mm;
    bounds.union(&bounds.translated(Point::new(last_column, last_row)))
}
