//! Export profiles: the registry of output formats.
//!
//! Every format implements [`PathWriter`] and is registered once in
//! [`PROFILES`] under a short identifier. Callers look a profile up with
//! [`profile`] and serialize with [`export`]; nothing else in the
//! workspace dispatches on format names.

use std::fmt;

use quiltpath_motion::MotionPath;

use crate::dxf::{LineDxf, LwPolylineDxf};
use crate::gif::AnimatedGif;
use crate::svg::SvgPreview;

/// Output length unit. Only millimetres are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    /// Millimetres.
    #[default]
    Millimetre,
}

/// Options passed to every writer alongside the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportOptions {
    /// Length unit of the output coordinates.
    pub unit: Unit,

    /// Whether the path is a composed layout rather than the single
    /// base pattern. Writers may record this but must not change the
    /// geometry because of it.
    pub export_entire_layout: bool,
}

/// A serializer from a motion path to file bytes.
///
/// Implementations are pure: the output depends only on the arguments.
pub trait PathWriter: Sync {
    /// Serialize `path`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExportError`] if the format cannot represent the path.
    fn write(&self, path: &MotionPath, options: &ExportOptions) -> Result<Vec<u8>, ExportError>;
}

/// A registered output format.
pub struct ExportProfile {
    /// Lookup key, e.g. `"DXF"`.
    pub id: &'static str,
    /// Human-readable name.
    pub title: &'static str,
    /// File extension without the dot.
    pub extension: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// The serializer.
    pub writer: &'static dyn PathWriter,
}

impl fmt::Debug for ExportProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportProfile")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("extension", &self.extension)
            .finish_non_exhaustive()
    }
}

/// Every supported format.
pub static PROFILES: &[ExportProfile] = &[
    ExportProfile {
        id: "DXF",
        title: "AutoCAD DXF (polyline)",
        extension: "dxf",
        description: "Lightweight polyline DXF with STITCH and TRAVEL layers",
        writer: &LwPolylineDxf,
    },
    ExportProfile {
        id: "QCT",
        title: "QCT DXF (lines)",
        extension: "dxf",
        description: "Line-entity DXF for controllers that cannot read polylines",
        writer: &LineDxf,
    },
    ExportProfile {
        id: "GIF",
        title: "Animated GIF",
        extension: "gif",
        description: "Looping preview of the needle sewing the path",
        writer: &AnimatedGif,
    },
    ExportProfile {
        id: "SVG",
        title: "SVG preview",
        extension: "svg",
        description: "Vector preview with stitch and travel groups",
        writer: &SvgPreview,
    },
];

/// Look up a profile by identifier, ignoring ASCII case.
///
/// # Errors
///
/// Returns [`ExportError::UnsupportedFormat`] if no profile matches.
pub fn profile(id: &str) -> Result<&'static ExportProfile, ExportError> {
    PROFILES
        .iter()
        .find(|p| p.id.eq_ignore_ascii_case(id))
        .ok_or_else(|| ExportError::UnsupportedFormat(id.to_owned()))
}

/// Serialize `path` with the given profile.
///
/// This is a pure function with no I/O -- it returns the file bytes.
///
/// # Errors
///
/// Propagates the writer's [`ExportError`].
pub fn export(
    path: &MotionPath,
    profile: &ExportProfile,
    options: &ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    let bytes = profile.writer.write(path, options)?;
    tracing::debug!(
        format = profile.id,
        segments = path.len(),
        bytes = bytes.len(),
        "exported path"
    );
    Ok(bytes)
}

/// Errors that can occur during export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// No profile is registered under the requested identifier.
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// The raster canvas could not be allocated.
    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// Image encoding failed.
    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(profile("dxf").unwrap().id, "DXF");
        assert_eq!(profile("Gif").unwrap().extension, "gif");
    }

    #[test]
    fn unknown_format_rejected() {
        let err = profile("PES").unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedFormat(ref id) if id == "PES"));
        assert_eq!(err.to_string(), "unsupported export format: PES");
    }

    #[test]
    fn identifiers_unique() {
        for (i, a) in PROFILES.iter().enumerate() {
            for b in &PROFILES[i + 1..] {
                assert!(!a.id.eq_ignore_ascii_case(b.id));
            }
        }
    }

    #[test]
    fn default_options_are_millimetres_single_pattern() {
        let options = ExportOptions::default();
        assert_eq!(options.unit, Unit::Millimetre);
        assert!(!options.export_entire_layout);
    }
}
