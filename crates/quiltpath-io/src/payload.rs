//! Preview payload written by the editor integration.
//!
//! The editor flattens its selection into polylines in document pixels
//! and records the pixel-to-millimetre factor alongside them:
//!
//! ```json
//! { "segments": [ { "points": [[0, 0], [10, 0]], "needle_down": true } ],
//!   "px_to_mm": 0.2645833 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use quiltpath_motion::Point;

use crate::IoError;

const fn default_needle_down() -> bool {
    true
}

const fn default_px_to_mm() -> f64 {
    1.0
}

/// One polyline of the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadSegment {
    /// Vertices in document pixels.
    pub points: Vec<[f64; 2]>,

    /// Whether the needle is down along this polyline.
    #[serde(default = "default_needle_down")]
    pub needle_down: bool,
}

/// Geometry handed over by the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Polylines in drawing order.
    #[serde(default)]
    pub segments: Vec<PayloadSegment>,

    /// Millimetres per document pixel.
    #[serde(default = "default_px_to_mm")]
    pub px_to_mm: f64,
}

impl Payload {
    /// Parse a payload from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Payload`] if the text is not a valid payload.
    pub fn from_json(text: &str) -> Result<Self, IoError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Needle-down polylines converted to millimetres, in order.
    ///
    /// Needle-up polylines are dropped; the normalizer regenerates travel
    /// between the remaining sub-paths.
    #[must_use]
    pub fn subpaths_mm(&self) -> Vec<Vec<Point>> {
        self.segments
            .iter()
            .filter(|s| s.needle_down)
            .map(|s| {
                s.points
                    .iter()
                    .map(|&[x, y]| Point::new(x * self.px_to_mm, y * self.px_to_mm))
                    .collect()
            })
            .collect()
    }
}

/// Read and parse a payload file.
///
/// # Errors
///
/// Returns [`IoError::Read`] if the file cannot be read and
/// [`IoError::Payload`] if it does not parse.
pub fn load_payload(path: &Path) -> Result<Payload, IoError> {
    let text = std::fs::read_to_string(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let payload = Payload::from_json(&text)?;
    tracing::debug!(
        path = %path.display(),
        segments = payload.segments.len(),
        px_to_mm = payload.px_to_mm,
        "loaded payload"
    );
    Ok(payload)
}
