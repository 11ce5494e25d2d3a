//! Windowed-sinc interpolation converter.
//!
//! Band-limited interpolation over `2 * half_taps` input frames per output
//! sample, with the kernel cutoff narrowed to the output Nyquist rate when
//! downsampling. Input is parked in a pending window until enough lookahead
//! has arrived, which is where this converter's latency comes from.

use std::f64::consts::PI;

use crate::{ProcessCounts, RatioRamp};

/// Upper bound on frames parked in the pending window. Keeps a caller that
/// pushes input without ever draining output from growing the window
/// without bound; the surplus is simply not consumed.
const MAX_PENDING_FRAMES: usize = 8192;

#[derive(Debug)]
pub(crate) struct SincConverter {
    channels: usize,
    /// Kernel half-length in frames; the kernel spans `(1 - half_taps)..=half_taps`.
    half_taps: usize,
    /// Frames received but not yet fully rendered, interleaved. Seeded with
    /// `half_taps` zero frames so the first evaluation has a full left wing.
    pending: Vec<f32>,
    /// Kernel center, in frames from the start of `pending`.
    pos: f64,
    /// Set once the end-of-input zero tail has been appended.
    flushed: bool,
    /// Per-channel accumulator reused across output samples.
    acc: Vec<f64>,
}

impl SincConverter {
    pub(crate) fn new(channels: usize, half_taps: usize) -> Self {
        let mut conv = Self {
            channels,
            half_taps,
            pending: Vec::new(),
            pos: 0.0,
            flushed: false,
            acc: vec![0.0; channels],
        };
        conv.seed();
        conv
    }

    pub(crate) fn reset(&mut self) {
        self.seed();
    }

    fn seed(&mut self) {
        self.pending.clear();
        self.pending.resize(self.half_taps * self.channels, 0.0);
        self.pos = self.half_taps as f64;
        self.flushed = false;
    }

    fn pending_frames(&self) -> usize {
        self.pending.len() / self.channels
    }

    pub(crate) fn process(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        ramp: &RatioRamp,
        end_of_input: bool,
    ) -> ProcessCounts {
        let ch = self.channels;
        let in_frames = input.len() / ch;
        let out_frames = output.len() / ch;

        // Accept as much input as the pending window has room for. Once the
        // flush tail is in place the stream is over; reset() starts a new one.
        let consumed = if self.flushed {
            0
        } else {
            let room = MAX_PENDING_FRAMES.saturating_sub(self.pending_frames());
            let take = in_frames.min(room);
            self.pending.extend_from_slice(&input[..take * ch]);
            take
        };

        if end_of_input && !self.flushed && consumed == in_frames {
            // Zero tail lets the kernel run over the delayed last frames.
            let tail = self.half_taps * ch;
            self.pending.extend(std::iter::repeat(0.0).take(tail));
            self.flushed = true;
        }

        let mut produced = 0usize;
        while produced < out_frames {
            let base = self.pos as usize;
            // The right wing must be covered by received frames.
            if base + self.half_taps >= self.pending_frames() {
                break;
            }
            let ratio = ramp.at(produced);
            self.render(base, self.pos - base as f64, ratio);
            output[produced * ch..(produced + 1) * ch]
                .iter_mut()
                .zip(&self.acc)
                .for_each(|(out, acc)| *out = *acc as f32);
            self.pos += 1.0 / ratio;
            produced += 1;
        }

        self.discard_rendered();

        ProcessCounts {
            frames_consumed: consumed,
            frames_produced: produced,
        }
    }

    /// Evaluate the kernel centered at `base + frac` into `self.acc`.
    fn render(&mut self, base: usize, frac: f64, ratio: f64) {
        let ch = self.channels;
        let half = self.half_taps as i64;
        let cutoff = ratio.min(1.0);
        self.acc.fill(0.0);
        for k in (1 - half)..=half {
            let t = k as f64 - frac;
            let weight = kernel(t, cutoff, self.half_taps as f64);
            if weight == 0.0 {
                continue;
            }
            let frame = (base as i64 + k) as usize;
            let samples = &self.pending[frame * ch..(frame + 1) * ch];
            for c in 0..ch {
                self.acc[c] += samples[c] as f64 * weight;
            }
        }
    }

    /// Drop frames the kernel's left wing can no longer reach.
    fn discard_rendered(&mut self) {
        let floor = self.pos as usize;
        let drop = floor
            .saturating_sub(self.half_taps - 1)
            .min(self.pending_frames());
        if drop > 0 {
            self.pending.drain(..drop * self.channels);
            self.pos -= drop as f64;
        }
    }
}

/// `sinc(cutoff * t)` shaped by a Blackman-Harris window spanning `half`
/// frames on each side of the center; zero outside the window.
fn kernel(t: f64, cutoff: f64, half: f64) -> f64 {
    let x = t / half;
    if x <= -1.0 || x >= 1.0 {
        return 0.0;
    }
    let window = 0.35875
        + 0.48829 * (PI * x).cos()
        + 0.14128 * (2.0 * PI * x).cos()
        + 0.01168 * (3.0 * PI * x).cos();
    cutoff * sinc(cutoff * t) * window
}

fn sinc(t: f64) -> f64 {
    if t.abs() < 1e-9 {
        1.0
    } else {
        (PI * t).sin() / (PI * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF: usize = 16;

    fn flat_ramp(ratio: f64, out_frames: usize) -> RatioRamp {
        RatioRamp::new(ratio, ratio, out_frames)
    }

    #[test]
    fn kernel_is_unity_at_center() {
        assert!((kernel(0.0, 1.0, HALF as f64) - 1.0).abs() < 1e-12);
        // On-grid taps vanish at unity cutoff.
        for k in 1..HALF as i64 {
            assert!(kernel(k as f64, 1.0, HALF as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn single_call_with_flush_preserves_frame_count() {
        let mut conv = SincConverter::new(1, HALF);
        let input = vec![0.0f32; 256];
        let mut output = vec![0.0f32; 1024];

        let counts = conv.process(&input, &mut output, &flat_ramp(1.0, 1024), true);
        assert_eq!(counts.frames_consumed, 256);
        assert_eq!(counts.frames_produced, 256);

        // Stream is over: further calls drain to zero immediately.
        let counts = conv.process(&[], &mut output, &flat_ramp(1.0, 1024), true);
        assert_eq!(counts.frames_produced, 0);
    }

    #[test]
    fn streaming_lags_by_half_taps() {
        let mut conv = SincConverter::new(1, HALF);
        let input = vec![0.0f32; 100];
        let mut output = vec![0.0f32; 256];

        let counts = conv.process(&input, &mut output, &flat_ramp(1.0, 256), false);
        assert_eq!(counts.frames_consumed, 100);
        assert_eq!(counts.frames_produced, 100 - HALF);
    }

    #[test]
    fn flush_emits_the_delayed_tail() {
        let mut conv = SincConverter::new(1, HALF);
        let input = vec![0.0f32; 100];
        let mut output = vec![0.0f32; 256];

        let first = conv.process(&input, &mut output, &flat_ramp(1.0, 256), false);
        let flush = conv.process(&[], &mut output, &flat_ramp(1.0, 256), true);
        assert_eq!(first.frames_produced + flush.frames_produced, 100);

        let done = conv.process(&[], &mut output, &flat_ramp(1.0, 256), true);
        assert_eq!(done.frames_produced, 0);
    }

    #[test]
    fn passes_dc_through() {
        let mut conv = SincConverter::new(1, HALF);
        let input = vec![0.8f32; 400];
        let mut output = vec![0.0f32; 1024];

        let counts = conv.process(&input, &mut output, &flat_ramp(1.0, 1024), false);
        // Skip the warm-up region where the left wing still sees seed zeros.
        for &s in &output[2 * HALF..counts.frames_produced] {
            assert!((s - 0.8).abs() < 1e-3, "sample {s} strayed from DC level");
        }
    }

    #[test]
    fn interleaved_channels_stay_independent() {
        let mut conv = SincConverter::new(2, HALF);
        // Left channel DC 0.5, right channel DC -0.25.
        let mut input = Vec::with_capacity(400);
        for _ in 0..200 {
            input.push(0.5f32);
            input.push(-0.25f32);
        }
        let mut output = vec![0.0f32; 1024];

        let counts = conv.process(&input, &mut output, &flat_ramp(1.0, 512), false);
        assert!(counts.frames_produced > 2 * HALF);
        for frame in output[..counts.frames_produced * 2].chunks(2).skip(2 * HALF) {
            assert!((frame[0] - 0.5).abs() < 1e-3);
            assert!((frame[1] + 0.25).abs() < 1e-3);
        }
    }

    #[test]
    fn pending_window_is_bounded() {
        let mut conv = SincConverter::new(1, HALF);
        let input = vec![0.0f32; MAX_PENDING_FRAMES + 1000];
        let mut output = vec![0.0f32; 4];

        // Tiny output buffer: almost nothing drains, so intake must stop at
        // the window bound instead of swallowing the whole slice.
        let counts = conv.process(&input, &mut output, &flat_ramp(1.0, 4), false);
        assert!(counts.frames_consumed < input.len());
        assert!(conv.pending_frames() <= MAX_PENDING_FRAMES + HALF);
    }

    #[test]
    fn reset_starts_a_fresh_stream() {
        let mut conv = SincConverter::new(1, HALF);
        let mut output = vec![0.0f32; 256];
        conv.process(&vec![0.7f32; 64], &mut output, &flat_ramp(1.0, 256), true);
        assert!(conv.flushed);

        conv.reset();
        assert!(!conv.flushed);
        let counts = conv.process(&vec![0.0f32; 64], &mut output, &flat_ramp(1.0, 256), false);
        assert_eq!(counts.frames_consumed, 64);
    }
}
