//! Our error types for the detector control facade.

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error type for detector group control.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// A caller-supplied parameter name is not in any translation table.
    #[error("unknown parameter name: {name}")]
    UnknownParameter { name: String },
    /// The requested module index did not resolve to a live module.
    #[error("no module at index {index}")]
    ModuleNotFound { index: usize },
    /// The firmware rejected a request, surfaced through the error mask.
    #[error("hardware rejected the request: {message}")]
    Hardware { message: String },
    /// A value reported by the control server could not be parsed into the
    /// expected numeric type.
    #[error("could not convert reported value: {value:?}")]
    Conversion { value: String },
    /// Operation reserved for a different detector variant.
    #[error("operation not supported on this detector: {operation}")]
    Unsupported { operation: &'static str },
    /// Invalid range for this parameter.
    #[error("{what} out of range: {value}")]
    OutOfRange { what: &'static str, value: i64 },
    /// A broadcast write was given the wrong number of per-module values.
    #[error("expected {expected} per-module values, got {got}")]
    LengthMismatch { expected: usize, got: usize },
}
