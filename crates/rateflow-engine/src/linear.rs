//! Two-point linear interpolation converter.
//!
//! Cheapest converter with sub-frame accuracy; no filtering, so aliasing is
//! audible when downsampling. The last consumed frame is carried across
//! calls so interpolation stays continuous at chunk boundaries.

use crate::{ProcessCounts, RatioRamp};

#[derive(Debug)]
pub(crate) struct LinearConverter {
    channels: usize,
    /// Most recently consumed input frame; left interpolation endpoint for
    /// read positions that fall before the current chunk.
    last_frame: Vec<f32>,
    /// Fractional read position past `last_frame`, in input frames.
    phase: f64,
    primed: bool,
}

impl LinearConverter {
    pub(crate) fn new(channels: usize) -> Self {
        Self {
            channels,
            last_frame: vec![0.0; channels],
            phase: 0.0,
            primed: false,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.last_frame.fill(0.0);
        self.phase = 0.0;
        self.primed = false;
    }

    /// End of input needs no special handling here: nothing is retained
    /// beyond `last_frame`, and a trailing sub-frame position is simply
    /// dropped when the stream ends.
    pub(crate) fn process(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        ramp: &RatioRamp,
        _end_of_input: bool,
    ) -> ProcessCounts {
        let ch = self.channels;
        let in_frames = input.len() / ch;
        let out_frames = output.len() / ch;

        if !self.primed {
            if in_frames == 0 {
                return ProcessCounts::default();
            }
            self.last_frame.copy_from_slice(&input[..ch]);
            self.primed = true;
        }

        // Read position: 0.0 is `last_frame`, n is input frame n - 1.
        let mut pos = self.phase;
        let mut produced = 0usize;

        while produced < out_frames {
            // The window [floor(pos), floor(pos) + 1] must be covered by the
            // frames received so far.
            if pos >= in_frames as f64 {
                break;
            }
            let base = pos as usize;
            let frac = pos - base as f64;
            let left = if base == 0 {
                &self.last_frame[..]
            } else {
                &input[(base - 1) * ch..base * ch]
            };
            let right = &input[base * ch..(base + 1) * ch];
            let out = &mut output[produced * ch..(produced + 1) * ch];
            for c in 0..ch {
                out[c] = (left[c] as f64 + frac * (right[c] as f64 - left[c] as f64)) as f32;
            }
            pos += 1.0 / ramp.at(produced);
            produced += 1;
        }

        let consumed = (pos as usize).min(in_frames);
        if consumed > 0 {
            self.last_frame
                .copy_from_slice(&input[(consumed - 1) * ch..consumed * ch]);
        }
        self.phase = pos - consumed as f64;

        ProcessCounts {
            frames_consumed: consumed,
            frames_produced: produced,
        }
    }
}
