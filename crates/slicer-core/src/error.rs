//! Error types for the slicer core.

use thiserror::Error;

/// Errors that can occur while building, slicing, or processing a model.
///
/// Only `LoadError`, `ConfigOutOfRange`, and `UnsupportedOption` are fatal
/// (abort `process_file`); `DegenerateSlice` and `OpenContour` are logged
/// and processing continues with the best-effort output.
#[derive(Error, Debug)]
pub enum SlicerError {
    /// Mesh has no triangles, or the file could not be read.
    #[error("model load failed: {0}")]
    LoadError(String),

    /// Mesh has degenerate geometry (e.g. zero-area triangles only).
    #[error("mesh has degenerate geometry: {0}")]
    DegenerateMesh(String),

    /// A configuration value makes geometry impossible (negative spacing,
    /// zero wall count with nonzero infill, etc).
    #[error("config out of range: {0}")]
    ConfigOutOfRange(String),

    /// Slicing produced no usable layers at all.
    #[error("slicing failed: {0}")]
    SliceFailed(String),

    /// An unknown infill or support pattern name was requested.
    #[error("unsupported option: {0}")]
    UnsupportedOption(String),
}

/// Result type for slicer-core operations.
pub type Result<T> = std::result::Result<T, SlicerError>;
