//! Error codes reported by the conversion engine.

use thiserror::Error;

/// Errors reported by [`Engine`](crate::Engine) operations.
///
/// Every variant carries a stable numeric code (see [`EngineError::code`])
/// so hosts that log or persist codes can map them back to a description
/// with [`describe_code`].
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("channel count must be at least 1")]
    BadChannelCount,

    #[error("conversion ratio is outside the supported range")]
    BadRatio,

    #[error("buffer length is not a whole number of frames")]
    MisalignedBuffer,
}

impl EngineError {
    /// Stable numeric code for this error. Zero is reserved for "no error".
    pub fn code(&self) -> i32 {
        match self {
            EngineError::BadChannelCount => 1,
            EngineError::BadRatio => 2,
            EngineError::MisalignedBuffer => 3,
        }
    }

    /// Inverse of [`EngineError::code`], `None` for unassigned codes.
    pub fn from_code(code: i32) -> Option<EngineError> {
        match code {
            1 => Some(EngineError::BadChannelCount),
            2 => Some(EngineError::BadRatio),
            3 => Some(EngineError::MisalignedBuffer),
            _ => None,
        }
    }
}

/// Human-readable description for a numeric engine error code.
pub fn describe_code(code: i32) -> &'static str {
    match code {
        0 => "no error",
        1 => "channel count must be at least 1",
        2 => "conversion ratio is outside the supported range",
        3 => "buffer length is not a whole number of frames",
        _ => "unknown error code",
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
