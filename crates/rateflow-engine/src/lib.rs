//! Streaming sample-rate converters.
//!
//! One [`Engine`] converts one interleaved multi-channel stream, fed in
//! arbitrary-sized chunks through [`Engine::process`]. Each call reports how
//! many input frames were consumed and output frames produced, so callers
//! can advance through their own buffers at whatever pace the converter
//! allows. The conversion ratio may change between calls: a stepped ratio
//! (see [`Engine::set_ratio`]) takes effect at the start of the next call,
//! while a ratio passed straight to `process` is approached with a linear
//! ramp across that call's output span.
//!
//! The algorithm is picked at construction from the closed [`ConverterType`]
//! set; all variants share the same streaming contract.

#![forbid(unsafe_code)]

mod error;
mod hold;
mod linear;
mod sinc;

use tracing::{debug, trace};

pub use error::{describe_code, EngineError, EngineResult};

/// Largest supported resampling factor. Valid ratios lie in
/// `[1.0 / MAX_RATIO, MAX_RATIO]`.
pub const MAX_RATIO: f64 = 256.0;

/// Ratio differences below this are treated as "not changing" and skip the
/// per-call ramp.
const MIN_RATIO_DIFF: f64 = 1e-20;

/// Conversion algorithm selection.
///
/// Quality rises with CPU cost from bottom to top of the sinc tiers; the
/// two non-sinc variants trade fidelity for near-zero cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConverterType {
    /// Windowed-sinc, 64 frames per kernel side. Mastering-grade.
    SincBestQuality,
    /// Windowed-sinc, 32 frames per side. Good default for playback.
    SincMediumQuality,
    /// Windowed-sinc, 16 frames per side. Cheapest band-limited option.
    SincFastest,
    /// Repeat the previous frame. No filtering.
    ZeroOrderHold,
    /// Two-point linear interpolation. No filtering.
    Linear,
}

/// Frames moved by a single [`Engine::process`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcessCounts {
    /// Input frames the converter accepted this call.
    pub frames_consumed: usize,
    /// Output frames written this call.
    pub frames_produced: usize,
}

/// Per-call ratio trajectory: linear ramp from the previous call's effective
/// ratio toward the requested target, spread over the requested output span.
pub(crate) struct RatioRamp {
    start: f64,
    target: f64,
    span: f64,
}

impl RatioRamp {
    pub(crate) fn new(start: f64, target: f64, out_frames: usize) -> Self {
        Self {
            start,
            target,
            span: out_frames as f64,
        }
    }

    /// Ratio in effect while producing output frame `produced` (0-based).
    pub(crate) fn at(&self, produced: usize) -> f64 {
        if self.span <= 0.0 || (self.target - self.start).abs() < MIN_RATIO_DIFF {
            self.target
        } else {
            self.start + produced as f64 * (self.target - self.start) / self.span
        }
    }
}

#[derive(Debug)]
enum Converter {
    Sinc(sinc::SincConverter),
    Hold(hold::HoldConverter),
    Linear(linear::LinearConverter),
}

/// One streaming conversion instance.
///
/// Owns all converter state for a single stream; create one engine per
/// stream and feed it chunks in order.
#[derive(Debug)]
pub struct Engine {
    channels: usize,
    converter_type: ConverterType,
    converter: Converter,
    /// Effective ratio when the previous call finished; ramp origin for the
    /// next call. `None` until a ratio is stepped in or a call has run.
    last_ratio: Option<f64>,
}

impl Engine {
    /// Create an engine for `channels`-channel interleaved audio.
    pub fn new(converter: ConverterType, channels: usize) -> EngineResult<Engine> {
        if channels == 0 {
            return Err(EngineError::BadChannelCount);
        }
        let state = match converter {
            ConverterType::SincBestQuality => Converter::Sinc(sinc::SincConverter::new(channels, 64)),
            ConverterType::SincMediumQuality => {
                Converter::Sinc(sinc::SincConverter::new(channels, 32))
            }
            ConverterType::SincFastest => Converter::Sinc(sinc::SincConverter::new(channels, 16)),
            ConverterType::ZeroOrderHold => Converter::Hold(hold::HoldConverter::new(channels)),
            ConverterType::Linear => Converter::Linear(linear::LinearConverter::new(channels)),
        };
        debug!(?converter, channels, "converter engine created");
        Ok(Engine {
            channels,
            converter_type: converter,
            converter: state,
            last_ratio: None,
        })
    }

    /// Channel count fixed at construction.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Algorithm selected at construction.
    pub fn converter_type(&self) -> ConverterType {
        self.converter_type
    }

    /// Whether `ratio` is within the supported resampling-factor range.
    pub fn is_valid_ratio(ratio: f64) -> bool {
        ratio.is_finite() && ratio >= 1.0 / MAX_RATIO && ratio <= MAX_RATIO
    }

    /// Make `ratio` take effect immediately at the start of the next
    /// [`Engine::process`] call instead of ramping toward it.
    pub fn set_ratio(&mut self, ratio: f64) -> EngineResult<()> {
        if !Self::is_valid_ratio(ratio) {
            return Err(EngineError::BadRatio);
        }
        self.last_ratio = Some(ratio);
        Ok(())
    }

    /// Convert one chunk.
    ///
    /// `input` and `output` are interleaved and must hold a whole number of
    /// frames each. Consumes at most `input.len() / channels` frames and
    /// writes at most `output.len() / channels`; either count may come back
    /// smaller than the buffers allow. `end_of_input` tells the converter no
    /// further input will follow, releasing any internally delayed frames;
    /// keep calling until it reports zero produced frames.
    pub fn process(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        ratio: f64,
        end_of_input: bool,
    ) -> EngineResult<ProcessCounts> {
        if !Self::is_valid_ratio(ratio) {
            return Err(EngineError::BadRatio);
        }
        if input.len() % self.channels != 0 || output.len() % self.channels != 0 {
            return Err(EngineError::MisalignedBuffer);
        }

        let ramp = RatioRamp::new(
            self.last_ratio.unwrap_or(ratio),
            ratio,
            output.len() / self.channels,
        );
        let counts = match &mut self.converter {
            Converter::Sinc(c) => c.process(input, output, &ramp, end_of_input),
            Converter::Hold(c) => c.process(input, output, &ramp, end_of_input),
            Converter::Linear(c) => c.process(input, output, &ramp, end_of_input),
        };

        self.last_ratio = Some(if counts.frames_produced > 0 {
            ramp.at(counts.frames_produced - 1)
        } else {
            self.last_ratio.unwrap_or(ratio)
        });

        trace!(
            consumed = counts.frames_consumed,
            produced = counts.frames_produced,
            ratio,
            end_of_input,
            "processed block"
        );
        Ok(counts)
    }

    /// Forget all stream history, as if freshly constructed. The next call
    /// snaps straight to its target ratio with no ramp.
    pub fn reset(&mut self) -> EngineResult<()> {
        match &mut self.converter {
            Converter::Sinc(c) => c.reset(),
            Converter::Hold(c) => c.reset(),
            Converter::Linear(c) => c.reset(),
        }
        self.last_ratio = None;
        debug!(converter = ?self.converter_type, "engine reset");
        Ok(())
    }

    /// Release the engine. State is dropped in place; the fallible signature
    /// is part of the create/destroy contract so callers surface a refused
    /// release instead of leaking it silently.
    pub fn shutdown(self) -> EngineResult<()> {
        debug!(converter = ?self.converter_type, "engine shut down");
        Ok(())
    }
}
