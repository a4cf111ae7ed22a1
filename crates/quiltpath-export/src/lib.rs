//! quiltpath-export: Pure format serializers (sans-IO)
//!
//! Converts motion paths into machine and preview formats: polyline DXF,
//! line-entity DXF for QCT controllers, an animated GIF of the needle,
//! and an SVG preview. Formats are looked up through the [`profile`]
//! registry.

pub mod dxf;
pub mod gif;
pub mod profile;
pub mod svg;

pub use dxf::{to_dxf, to_line_dxf};
pub use gif::to_gif;
pub use profile::{
    ExportError, ExportOptions, ExportProfile, PROFILES, PathWriter, Unit, export, profile,
};
pub use svg::to_svg;
