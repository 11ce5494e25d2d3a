//! Streaming behavior across converter variants: chunk-boundary continuity,
//! drain termination and per-call ratio blending.

use rateflow_engine::{ConverterType, Engine};
use rstest::rstest;

/// Push `input` through in `chunk_frames`-frame slices, then drain with
/// end-of-input until the engine goes quiet. Returns all produced samples.
fn pump(
    engine: &mut Engine,
    input: &[f32],
    channels: usize,
    chunk_frames: usize,
    ratio: f64,
) -> Vec<f32> {
    let mut out = vec![0.0f32; 8192 * channels];
    let mut collected = Vec::new();
    let total_frames = input.len() / channels;

    let mut cursor = 0usize;
    while cursor < total_frames {
        let take = chunk_frames.min(total_frames - cursor);
        let counts = engine
            .process(
                &input[cursor * channels..(cursor + take) * channels],
                &mut out,
                ratio,
                false,
            )
            .unwrap();
        assert!(
            counts.frames_consumed > 0 || counts.frames_produced > 0,
            "no forward progress at frame {cursor}"
        );
        cursor += counts.frames_consumed;
        collected.extend_from_slice(&out[..counts.frames_produced * channels]);
    }

    for round in 0.. {
        assert!(round < 64, "drain did not terminate");
        let counts = engine.process(&[], &mut out, ratio, true).unwrap();
        collected.extend_from_slice(&out[..counts.frames_produced * channels]);
        if counts.frames_produced == 0 {
            break;
        }
    }
    collected
}

#[rstest]
#[case(ConverterType::SincBestQuality)]
#[case(ConverterType::SincMediumQuality)]
#[case(ConverterType::SincFastest)]
#[case(ConverterType::ZeroOrderHold)]
#[case(ConverterType::Linear)]
fn chunked_equals_single_shot(#[case] converter: ConverterType) {
    let signal: Vec<f32> = (0..1200).map(|i| (i as f32 * 0.013).sin()).collect();

    let mut whole = Engine::new(converter, 1).unwrap();
    let whole_out = pump(&mut whole, &signal, 1, 1200, 0.8);

    let mut chunked = Engine::new(converter, 1).unwrap();
    let chunked_out = pump(&mut chunked, &signal, 1, 100, 0.8);

    assert_eq!(whole_out.len(), chunked_out.len());
    for (i, (a, b)) in whole_out.iter().zip(&chunked_out).enumerate() {
        assert!((a - b).abs() < 1e-6, "sample {i} diverged: {a} vs {b}");
    }
}

#[rstest]
#[case(ConverterType::SincBestQuality)]
#[case(ConverterType::SincMediumQuality)]
#[case(ConverterType::SincFastest)]
#[case(ConverterType::ZeroOrderHold)]
#[case(ConverterType::Linear)]
fn drain_reaches_silence_with_expected_total(#[case] converter: ConverterType) {
    let mut engine = Engine::new(converter, 2).unwrap();
    let input = vec![0.0f32; 1600]; // 800 stereo frames

    let collected = pump(&mut engine, &input, 2, 160, 0.75);
    let frames = (collected.len() / 2) as i64;
    assert!(
        (frames - 600).unsigned_abs() <= 2,
        "expected ~600 frames from 800 at ratio 0.75, got {frames}"
    );
}

#[test]
fn ratio_targets_blend_between_calls() {
    let mut engine = Engine::new(ConverterType::Linear, 1).unwrap();
    engine.set_ratio(1.0).unwrap();
    let input = vec![0.0f32; 400];
    let mut out = vec![0.0f32; 4096];

    // Alternating targets never let the effective ratio settle; every call
    // must land between the pure-1.0 and pure-2.0 output counts.
    for i in 0..4 {
        let target = if i % 2 == 0 { 2.0 } else { 1.0 };
        let counts = engine.process(&input, &mut out, target, false).unwrap();
        assert_eq!(counts.frames_consumed, 400);
        assert!(
            counts.frames_produced >= 400 && counts.frames_produced <= 800,
            "call {i}: produced {} outside the blend range",
            counts.frames_produced
        );
    }
}
