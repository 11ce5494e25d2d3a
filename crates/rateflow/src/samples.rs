//! Sample representation adapters.
//!
//! The engine works in 32-bit float; 16-bit integer PCM is normalized on
//! the way in and clamped back on the way out.

/// Normalize a 16-bit PCM sample to `[-1.0, 1.0)`.
pub(crate) fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 / 32768.0
}

/// Convert a float sample back to 16-bit PCM, clamping out-of-range values.
pub(crate) fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32767.0).round().clamp(-32768.0, 32767.0) as i16
}
