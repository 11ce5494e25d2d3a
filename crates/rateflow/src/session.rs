//! Conversion session: lifecycle, ratio control and per-call accounting.

use rateflow_engine::{ConverterType, Engine, EngineError, ProcessCounts};
use tracing::{debug, trace};

use crate::error::{ConvertError, ConvertResult};
use crate::samples::{f32_to_i16, i16_to_f32};

/// Bytes per stored sample; both supported representations account at the
/// same per-frame stride.
const BYTES_PER_SAMPLE: usize = 4;

/// Storage units moved by a single processing call, counted in the caller's
/// sample representation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Input units the converter accepted.
    pub input_used: usize,
    /// Output units written.
    pub output_generated: usize,
}

/// A streaming sample-rate conversion session.
///
/// Owns one conversion engine for one interleaved multi-channel stream.
/// Feed audio through [`process_f32`](Self::process_f32) or
/// [`process_i16`](Self::process_i16) in chunks of any size; each call
/// reports exactly how far it got through both buffers, and the caller
/// re-invokes with advanced offsets until everything is through. When the
/// stream ends, keep calling with `end_of_input` until the session reports
/// zero generated output.
///
/// Calls are blocking and synchronous; a session must be driven from one
/// thread at a time (every mutating operation takes `&mut self`).
/// Independent sessions are fully independent.
#[derive(Debug)]
pub struct ConverterSession {
    /// `Some` while the engine is live, `None` once released.
    engine: Option<Engine>,
    channels: usize,
    ratio: f64,
    /// Frames of delay currently held inside the engine. Diagnostic only.
    buffered_frames: f64,
    // Scratch for the i16 path, reused across calls.
    scratch_in: Vec<f32>,
    scratch_out: Vec<f32>,
}

impl ConverterSession {
    /// Open a session for `channels`-channel interleaved audio using the
    /// given converter algorithm.
    ///
    /// The session starts at ratio 1.0, stepped into the engine so the
    /// first processing call never runs with an unconfigured ratio.
    pub fn new(converter: ConverterType, channels: usize) -> ConvertResult<Self> {
        let mut engine = Engine::new(converter, channels).map_err(ConvertError::Init)?;
        engine.set_ratio(1.0).map_err(ConvertError::Init)?;
        debug!(?converter, channels, "conversion session opened");
        Ok(Self {
            engine: Some(engine),
            channels,
            ratio: 1.0,
            buffered_frames: 0.0,
            scratch_in: Vec::new(),
            scratch_out: Vec::new(),
        })
    }

    /// Whether the engine can convert at `ratio`; check before opening or
    /// retargeting a session.
    pub fn is_valid_ratio(ratio: f64) -> bool {
        Engine::is_valid_ratio(ratio)
    }

    /// Conversion ratio the next processing call will aim for.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Channel count fixed at construction.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Whether the engine has been released.
    pub fn is_closed(&self) -> bool {
        self.engine.is_none()
    }

    /// Estimated bytes of audio currently delayed inside the converter:
    /// input consumed but not yet reflected in produced output. Purely
    /// diagnostic; may dip below zero transiently around ratio changes.
    pub fn buffered_bytes(&self) -> i64 {
        (self.buffered_frames * (self.channels * BYTES_PER_SAMPLE) as f64) as i64
    }

    /// Step the conversion ratio: the engine applies `ratio` immediately at
    /// the start of the next processing call.
    ///
    /// On rejection the previously recorded ratio stays in effect.
    pub fn set_ratio(&mut self, ratio: f64) -> ConvertResult<()> {
        let engine = self.engine.as_mut().ok_or(ConvertError::Closed)?;
        engine.set_ratio(ratio).map_err(ConvertError::Engine)?;
        self.ratio = ratio;
        debug!(ratio, "conversion ratio stepped");
        Ok(())
    }

    /// Retarget the ratio without stepping: the engine glides linearly from
    /// the previous ratio toward `ratio` across the next processing call.
    /// Used for smooth pitch and tempo changes.
    pub fn set_ratio_smooth(&mut self, ratio: f64) -> ConvertResult<()> {
        if self.engine.is_none() {
            return Err(ConvertError::Closed);
        }
        if !Engine::is_valid_ratio(ratio) {
            return Err(ConvertError::Engine(EngineError::BadRatio));
        }
        self.ratio = ratio;
        debug!(ratio, "conversion ratio target updated");
        Ok(())
    }

    /// Convert one chunk of 32-bit float samples.
    ///
    /// Offsets and lengths are in samples (storage units), not frames; a
    /// window that is not frame-aligned is floor-divided into whole frames
    /// and the remainder left untouched. Returns how many input units were
    /// consumed and output units generated; either may be smaller than the
    /// window, and the caller re-invokes with advanced offsets. With
    /// `end_of_input` set, call until `output_generated` comes back zero.
    #[allow(clippy::too_many_arguments)]
    pub fn process_f32(
        &mut self,
        input: &[f32],
        input_offset: usize,
        input_len: usize,
        output: &mut [f32],
        output_offset: usize,
        output_len: usize,
        end_of_input: bool,
    ) -> ConvertResult<ProcessOutcome> {
        let input = window(input, input_offset, input_len, "input")?;
        let output = window_mut(output, output_offset, output_len, "output")?;
        let counts = self.convert_frames(input, output, end_of_input)?;
        Ok(self.outcome(counts))
    }

    /// Convert one chunk of 16-bit integer PCM.
    ///
    /// Same window semantics as [`process_f32`](Self::process_f32); samples
    /// are normalized to float for the engine and clamped back on the way
    /// out. Counts come back in i16 storage units.
    #[allow(clippy::too_many_arguments)]
    pub fn process_i16(
        &mut self,
        input: &[i16],
        input_offset: usize,
        input_len: usize,
        output: &mut [i16],
        output_offset: usize,
        output_len: usize,
        end_of_input: bool,
    ) -> ConvertResult<ProcessOutcome> {
        let input = window(input, input_offset, input_len, "input")?;
        let output = window_mut(output, output_offset, output_len, "output")?;

        let mut scratch_in = std::mem::take(&mut self.scratch_in);
        let mut scratch_out = std::mem::take(&mut self.scratch_out);
        scratch_in.clear();
        scratch_in.extend(input.iter().map(|&s| i16_to_f32(s)));
        scratch_out.clear();
        scratch_out.resize(output.len(), 0.0);

        let result = self.convert_frames(&scratch_in, &mut scratch_out, end_of_input);
        if let Ok(counts) = &result {
            let produced = counts.frames_produced * self.channels;
            for (dst, src) in output[..produced].iter_mut().zip(&scratch_out[..produced]) {
                *dst = f32_to_i16(*src);
            }
        }
        self.scratch_in = scratch_in;
        self.scratch_out = scratch_out;

        Ok(self.outcome(result?))
    }

    /// Drop all engine history, as if the session were freshly opened. The
    /// configured target ratio is kept; a glide in progress is forgotten.
    pub fn reset(&mut self) -> ConvertResult<()> {
        let engine = self.engine.as_mut().ok_or(ConvertError::Closed)?;
        engine.reset().map_err(ConvertError::Engine)?;
        self.buffered_frames = 0.0;
        debug!("conversion session reset");
        Ok(())
    }

    /// Release the engine. Safe to call any number of times; after the
    /// first, every other operation fails with [`ConvertError::Closed`].
    ///
    /// A refused release is surfaced as [`ConvertError::Release`], but the
    /// session still becomes permanently closed, so a failed release can
    /// never lead to a use-after-release call sequence.
    pub fn close(&mut self) -> ConvertResult<()> {
        match self.engine.take() {
            None => Ok(()),
            Some(engine) => {
                debug!("conversion session closed");
                engine.shutdown().map_err(ConvertError::Release)
            }
        }
    }

    /// Shared frame-based core of both sample-representation paths.
    fn convert_frames(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        end_of_input: bool,
    ) -> ConvertResult<ProcessCounts> {
        let ch = self.channels;
        let in_frames = input.len() / ch;
        let out_frames = output.len() / ch;
        let ratio = self.ratio;

        let engine = self.engine.as_mut().ok_or(ConvertError::Closed)?;
        let counts = engine
            .process(
                &input[..in_frames * ch],
                &mut output[..out_frames * ch],
                ratio,
                end_of_input,
            )
            .map_err(ConvertError::Conversion)?;

        self.buffered_frames +=
            counts.frames_consumed as f64 - counts.frames_produced as f64 / ratio;
        trace!(
            consumed = counts.frames_consumed,
            produced = counts.frames_produced,
            buffered_frames = self.buffered_frames,
            end_of_input,
            "processed chunk"
        );
        Ok(counts)
    }

    fn outcome(&self, counts: ProcessCounts) -> ProcessOutcome {
        ProcessOutcome {
            input_used: counts.frames_consumed * self.channels,
            output_generated: counts.frames_produced * self.channels,
        }
    }
}

impl Drop for ConverterSession {
    /// Safety net for sessions dropped without an explicit
    /// [`close`](Self::close). A refused release cannot be reported from
    /// here and is dropped on the floor; close explicitly to observe it.
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            let _ = engine.shutdown();
        }
    }
}

fn window<'a, T>(
    buf: &'a [T],
    offset: usize,
    len: usize,
    name: &'static str,
) -> ConvertResult<&'a [T]> {
    match offset.checked_add(len) {
        Some(end) if end <= buf.len() => Ok(&buf[offset..end]),
        _ => Err(ConvertError::InvalidArgument {
            buffer: name,
            offset,
            len,
            actual: buf.len(),
        }),
    }
}

fn window_mut<'a, T>(
    buf: &'a mut [T],
    offset: usize,
    len: usize,
    name: &'static str,
) -> ConvertResult<&'a mut [T]> {
    let actual = buf.len();
    match offset.checked_add(len) {
        Some(end) if end <= actual => Ok(&mut buf[offset..end]),
        _ => Err(ConvertError::InvalidArgument {
            buffer: name,
            offset,
            len,
            actual,
        }),
    }
}
