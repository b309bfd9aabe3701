use std::collections::HashMap;

use serde::Deserialize;
use vizij_spline_core::{parse_spline_asset_json, BulkSplineEvaluator, SplineAsset};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

#[derive(Debug, Deserialize)]
struct ExpectedSamples {
    delta_x: f32,
    samples: HashMap<String, Vec<f32>>,
}

fn load_asset(name: &str) -> SplineAsset {
    let json = vizij_test_fixtures::splines::json(name).expect("load spline fixture");
    parse_spline_asset_json(&json).expect("parse spline asset from shared fixture")
}

#[test]
fn every_fixture_parses_and_builds() {
    for key in vizij_test_fixtures::splines::keys() {
        let asset = load_asset(&key);
        assert!(!asset.channels.is_empty(), "{key} has no channels");
        let splines = asset.build_splines().expect("build splines");
        assert_eq!(splines.len(), asset.channels.len());
        for (channel, spline) in asset.channels.iter().zip(&splines) {
            assert_eq!(spline.num_nodes() as usize, channel.nodes.len());
        }
    }
}

#[test]
fn short_fixture_honours_declared_quantization() {
    let asset = load_asset("short");
    assert_eq!(asset.name, "short");
    let channel = asset.channel("short").expect("short channel");
    let spline = channel.build_spline().expect("build short spline");

    assert_eq!(spline.x_granularity(), 0.01);
    assert_eq!(spline.range_y().start(), 0.0);
    assert_eq!(spline.range_y().end(), 1.0);
    for node in &channel.nodes {
        approx(spline.y_calculated_slowly(node.x), node.y, 1e-3);
    }
}

#[test]
fn angles_fixture_wraps_the_short_way() {
    let asset = load_asset("angles");
    let splines = asset.build_splines().expect("build angle splines");
    let mut evaluator = BulkSplineEvaluator::new();
    evaluator.set_num_indices(splines.len());
    asset.bind(&mut evaluator, 0, &splines);

    evaluator.advance_frame(0.25);
    approx(evaluator.y(0), 3.04425, 1e-3);
    assert!(evaluator.derivative(0) > 0.0);
    evaluator.advance_frame(0.5);
    approx(evaluator.y(0), -3.04425, 1e-3);
    assert!(evaluator.derivative(0) > 0.0);
}

#[test]
fn playback_fixture_matches_recorded_samples() {
    let asset = load_asset("playback");
    let expected: ExpectedSamples = vizij_test_fixtures::splines::expected("playback")
        .expect("read expected samples")
        .expect("playback fixture records expected samples");

    let splines = asset.build_splines().expect("build playback splines");
    let mut evaluator = BulkSplineEvaluator::new();
    evaluator.set_num_indices(splines.len());
    asset.bind(&mut evaluator, 0, &splines);

    let frames = expected.samples.values().map(Vec::len).max().unwrap_or(0);
    let mut recorded: HashMap<&str, Vec<f32>> = HashMap::new();
    for _ in 0..frames {
        for (index, channel) in asset.channels.iter().enumerate() {
            recorded
                .entry(channel.id.as_str())
                .or_default()
                .push(evaluator.y(index));
        }
        evaluator.advance_frame(expected.delta_x);
    }

    for (id, samples) in &expected.samples {
        let got = &recorded[id.as_str()];
        assert_eq!(got.len(), samples.len(), "channel {id}");
        for (frame, (&g, &e)) in got.iter().zip(samples).enumerate() {
            assert!((g - e).abs() <= 1e-3, "channel {id} frame {frame}: {g} vs {e}");
        }
    }
    assert!(!evaluator.is_finished(1), "looping channel never finishes");
    assert!(evaluator.is_finished(0));
}

#[test]
fn unknown_fixture_is_an_error() {
    assert!(vizij_test_fixtures::splines::json("missing").is_err());
    let none: Option<ExpectedSamples> =
        vizij_test_fixtures::splines::expected("short").expect("short is listed");
    assert!(none.is_none());
}

#[test]
fn plain_channel_rebound_over_angle_slot_stops_wrapping() {
    let angles = load_asset("angles");
    let playback = load_asset("playback");
    let angle_splines = angles.build_splines().expect("build angle splines");
    let plain_splines = playback.build_splines().expect("build playback splines");

    let mut evaluator = BulkSplineEvaluator::new();
    evaluator.set_num_indices(plain_splines.len());
    angles.bind(&mut evaluator, 0, &angle_splines);
    playback.bind(&mut evaluator, 0, &plain_splines);

    // "linear" is 2x + 1 over x in [0, 2]; wrapping would fold 5 into (-pi, pi].
    evaluator.advance_frame(2.0);
    approx(evaluator.y(0), 5.0, 1e-3);
}
