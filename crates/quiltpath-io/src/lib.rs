//! quiltpath-io: Filesystem boundary for the motion pipeline.
//!
//! Everything that touches the disk lives here: reading the editor's
//! preview payload and replacing export destinations atomically. The
//! pipeline and serializer crates stay free of I/O.

pub mod payload;
pub mod write;

use std::path::PathBuf;

use quiltpath_export::ExportError;
use quiltpath_motion::MotionError;

pub use payload::{Payload, PayloadSegment, load_payload};
pub use write::{export_to_file, write_atomic};

/// Errors that can occur at the filesystem boundary.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// The input file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The temporary output file could not be created or written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Final destination.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The finished temporary file could not replace the destination.
    #[error("failed to replace {}: {source}", path.display())]
    Persist {
        /// Final destination.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The payload is not valid JSON of the expected shape.
    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// Serialization failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// The geometry could not be turned into a motion path.
    #[error(transparent)]
    Motion(#[from] MotionError),
}
