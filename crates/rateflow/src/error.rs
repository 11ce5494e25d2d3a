//! Error types for conversion sessions.

use rateflow_engine::EngineError;
use thiserror::Error;

/// Errors reported by a [`ConverterSession`](crate::ConverterSession).
///
/// Engine error codes are translated into these variants at the session
/// boundary; the engine's own description always rides along as the source.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The engine instance could not be created. Fatal to the construction
    /// attempt; no session exists afterwards.
    #[error("engine initialization failed: {0}")]
    Init(#[source] EngineError),

    /// The engine rejected a ratio change or a reset. The session stays
    /// usable; retry with a corrected value.
    #[error("engine rejected the request: {0}")]
    Engine(#[source] EngineError),

    /// A processing call failed inside the engine.
    #[error("conversion failed: {0}")]
    Conversion(#[source] EngineError),

    /// Caller-supplied window is inconsistent with the buffer it indexes.
    /// Raised before the engine is touched; no engine-side effects occur.
    #[error("{buffer} window out of range: offset {offset} + len {len} exceeds {actual}")]
    InvalidArgument {
        buffer: &'static str,
        offset: usize,
        len: usize,
        actual: usize,
    },

    /// Operation attempted after the session released its engine.
    #[error("session is closed")]
    Closed,

    /// The engine refused to release its handle on close. Surfaced rather
    /// than swallowed: a stuck handle is a leak.
    #[error("engine release failed: {0}")]
    Release(#[source] EngineError),
}

/// Result type for session operations.
pub type ConvertResult<T> = Result<T, ConvertError>;
