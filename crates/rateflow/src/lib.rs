//! # rateflow
//!
//! Streaming sample-rate conversion sessions.
//!
//! A [`ConverterSession`] converts one interleaved multi-channel stream to a
//! different (possibly continuously varying) sample rate, fed in chunks of
//! whatever size the caller has on hand. Every call reports exactly how many
//! storage units it consumed and produced, so pipelines that cannot hold a
//! whole signal in memory stay correct across chunk boundaries.
//!
//! ## Usage
//!
//! ```
//! use rateflow::{ConverterSession, ConverterType};
//!
//! # fn main() -> Result<(), rateflow::ConvertError> {
//! let mut session = ConverterSession::new(ConverterType::Linear, 2)?;
//! session.set_ratio(48_000.0 / 44_100.0)?;
//!
//! let input = vec![0.0f32; 2048];
//! let mut output = vec![0.0f32; 4096];
//! let outcome = session.process_f32(&input, 0, 2048, &mut output, 0, 4096, false)?;
//! let converted = &output[..outcome.output_generated];
//! # let _ = converted;
//!
//! // At end of stream, flush with end_of_input until output stops coming.
//! loop {
//!     let drained = session.process_f32(&[], 0, 0, &mut output, 0, 4096, true)?;
//!     if drained.output_generated == 0 {
//!         break;
//!     }
//! }
//! session.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! Ratio changes either step in immediately ([`ConverterSession::set_ratio`])
//! or glide across the next call ([`ConverterSession::set_ratio_smooth`]).
//! The conversion algorithm is chosen per session from [`ConverterType`].

#![forbid(unsafe_code)]

mod error;
mod samples;
mod session;

pub use error::{ConvertError, ConvertResult};
pub use session::{ConverterSession, ProcessOutcome};

// Engine types that appear in the public API.
pub use rateflow_engine::{describe_code, ConverterType, EngineError, MAX_RATIO};
