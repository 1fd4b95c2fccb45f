//! Error types for G-code planning and emission.

use thiserror::Error;

/// Errors raised while planning or emitting G-code.
#[derive(Error, Debug)]
pub enum GcodeError {
    /// The output destination could not be written to.
    #[error("gcode output failed: {0}")]
    OutputError(String),

    /// A requested extruder index has no matching machine profile entry.
    #[error("unknown extruder: {0}")]
    UnknownExtruder(u32),
}

/// Result type for slicer-gcode operations.
pub type Result<T> = std::result::Result<T, GcodeError>;
