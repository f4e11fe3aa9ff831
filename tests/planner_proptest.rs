/// Property-based tests for the bitrate planner, plan builder and gate
///
/// Uses proptest to generate arbitrary frame sizes, durations and intents and
/// checks the invariants the planner must hold for all of them.
use ffgate::engine::bitrate::{MAX_QUALITY_PARAM, MIN_QUALITY_PARAM, reduction_adjustment};
use ffgate::engine::{
    EncoderChoice, MediaProbe, PlanMode, QualityIntent, QualityTier, SkipReason, SpeedPreset,
    build_plan, evaluate, plan_bitrate,
};
use proptest::prelude::*;

fn probe(codec: &str, width: u32, height: u32, duration: f64, size: u64) -> MediaProbe {
    MediaProbe {
        has_video: true,
        codec: codec.to_string(),
        width,
        height,
        duration_seconds: duration,
        file_size_bytes: size,
        color_primaries: None,
        color_transfer: None,
        color_space: None,
    }
}

fn reduction_intent(percent: f64) -> QualityIntent {
    QualityIntent {
        mode: PlanMode::Reduction,
        target_reduction_percent: percent,
        ..QualityIntent::default()
    }
}

fn any_tier() -> impl Strategy<Value = QualityTier> {
    prop::sample::select(QualityTier::ALL.to_vec())
}

fn any_preset() -> impl Strategy<Value = SpeedPreset> {
    prop::sample::select(vec![
        SpeedPreset::Fast,
        SpeedPreset::Medium,
        SpeedPreset::Slow,
        SpeedPreset::VerySlow,
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_quality_param_is_clamped(
        width in 1u32..8192,
        height in 1u32..4320,
        duration in 0.1f64..100_000.0,
        size in 1u64..200_000_000_000,
        percent in 20.0f64..=80.0,
    ) {
        let analysis = plan_bitrate(
            &probe("h264", width, height, duration, size),
            &reduction_intent(percent),
        ).unwrap();

        prop_assert!(analysis.final_quality_param >= MIN_QUALITY_PARAM);
        prop_assert!(analysis.final_quality_param <= MAX_QUALITY_PARAM);
        prop_assert!(analysis.target_bitrate_kbps <= analysis.current_bitrate_kbps.ceil());
    }

    #[test]
    fn prop_more_reduction_never_lowers_quality_param(
        width in 1u32..8192,
        height in 1u32..4320,
        a in 20.0f64..=80.0,
        b in 20.0f64..=80.0,
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let p = probe("h264", width, height, 600.0, 300_000_000);

        let q_low = plan_bitrate(&p, &reduction_intent(low)).unwrap().final_quality_param;
        let q_high = plan_bitrate(&p, &reduction_intent(high)).unwrap().final_quality_param;
        prop_assert!(q_high >= q_low, "{}% -> q{}, {}% -> q{}", low, q_low, high, q_high);
    }

    #[test]
    fn prop_target_codec_always_skips(
        codec in prop::sample::select(vec!["hevc", "HEVC", "h265", "Hevc"]),
        tier in any_tier(),
        use_gpu in any::<bool>(),
        preserve_hdr in any::<bool>(),
        reduction in any::<bool>(),
        quality in 0u32..52,
        preset in any_preset(),
    ) {
        let intent = QualityIntent {
            tier,
            use_gpu,
            preserve_hdr,
            mode: if reduction { PlanMode::Reduction } else { PlanMode::Quality },
            ..QualityIntent::default()
        };
        let outcome = build_plan(
            &probe(codec, 1920, 1080, 60.0, 1_000_000),
            EncoderChoice::software(),
            quality,
            preset,
            &intent,
            "mp4",
        );
        prop_assert_eq!(outcome.skip_reason(), Some(SkipReason::AlreadyTargetCodec));
    }

    #[test]
    fn prop_growth_past_limit_always_reverts(
        original in 1_000u64..10_000_000_000,
        limit in 0.0f64..=50.0,
        extra in 1.0f64..200.0,
        score in prop::option::of(0.0f64..=1.0),
    ) {
        let intent = QualityIntent {
            max_size_increase_percent: limit,
            ..QualityIntent::default()
        };
        let grown = (original as f64 * (1.0 + (limit + extra) / 100.0)).ceil() as u64;

        let decision = evaluate(
            &probe("h264", 1280, 720, 60.0, original),
            &probe("hevc", 1280, 720, 60.0, grown),
            &intent,
            score,
        ).unwrap();
        prop_assert!(!decision.accepted);
    }
}

#[test]
fn test_neutral_reduction_has_zero_adjustment() {
    assert_eq!(reduction_adjustment(40.0), 0);
}
