// End-to-end runs through the engine: raw probe -> plan -> gate

use ffgate::engine::{
    EncoderFamily, EngineError, GateAnnotation, GateReason, KnownScore, PipelineRun, PlanMode,
    QualityIntent, QualityTier, RunState, SkipReason, SpeedPreset, StaticCapabilities,
};
use std::path::Path;

use crate::common::helpers::*;

fn balanced_reduction_no_gpu() -> QualityIntent {
    QualityIntent {
        tier: QualityTier::Balanced,
        use_gpu: false,
        mode: PlanMode::Reduction,
        target_reduction_percent: 50.0,
        ..QualityIntent::default()
    }
}

// ============================================================================
// Planning
// ============================================================================

#[test]
fn test_1080p_hour_reduction_plan() {
    let raw = raw_probe("h264", 1920, 1080, "3600.000000", "4000000000");
    let mut run = PipelineRun::from_raw(&raw, balanced_reduction_no_gpu()).unwrap();

    let outcome = run.plan(&StaticCapabilities::default(), "mp4").unwrap();
    let plan = outcome.plan().cloned().expect("h264 source is planned");

    let analysis = *run.analysis().expect("reduction mode records bitrate");
    // 4e9 bytes * 8 / 3600 s / 1000
    assert!((analysis.current_bitrate_kbps - 8888.89).abs() < 0.01);
    assert_eq!(analysis.target_bitrate_kbps, 4444.0);
    assert_eq!(analysis.resolution_base, 23);
    assert_eq!(analysis.adjustment, 1);
    assert_eq!(analysis.final_quality_param, 24);

    assert_eq!(plan.quality_param, 24);
    assert_eq!(plan.encoder.family, EncoderFamily::SoftwareX265);
    assert!(plan.encoder.fallbacks.is_empty());
    assert_eq!(plan.speed_preset, SpeedPreset::Medium);
    assert!(plan.two_pass);
    assert!(plan.copy_audio && plan.copy_subtitles);
    assert!(plan.requeue_after_encode);
    assert_eq!(run.state(), RunState::PlanReady);
}

#[test]
fn test_hevc_source_skips_regardless_of_intent() {
    let intents = [
        QualityIntent::default(),
        balanced_reduction_no_gpu(),
        QualityIntent {
            tier: QualityTier::Archive,
            preserve_hdr: false,
            ..QualityIntent::default()
        },
    ];

    for intent in intents {
        let raw = raw_probe("hevc", 3840, 2160, "60", "1000000");
        let mut run = PipelineRun::from_raw(&raw, intent).unwrap();
        let outcome = run
            .plan(
                &StaticCapabilities {
                    nvenc: true,
                    qsv: true,
                },
                "mp4",
            )
            .unwrap();

        assert_eq!(outcome.skip_reason(), Some(SkipReason::AlreadyTargetCodec));
        assert_eq!(run.state(), RunState::Skipped);
        assert!(run.analysis().is_none());
    }
}

#[test]
fn test_gpu_requested_qsv_only() {
    let mut run = PipelineRun::new(hour_of_1080p(), QualityIntent::default()).unwrap();
    let caps = StaticCapabilities {
        nvenc: false,
        qsv: true,
    };

    let plan = run.plan(&caps, "mp4").unwrap().plan().cloned().unwrap();
    assert_eq!(plan.encoder.family, EncoderFamily::QsvHevc);
    assert_eq!(plan.encoder.fallbacks, vec![EncoderFamily::SoftwareX265]);
    // High tier, fixed quality
    assert_eq!(plan.quality_param, 20);
    assert_eq!(plan.speed_preset, SpeedPreset::Slow);
    assert!(!plan.two_pass);
}

#[test]
fn test_hdr_tags_flow_from_raw_probe() {
    let json = r#"{
      "streams": [{
        "codec_type": "video", "codec_name": "vp9", "width": 3840, "height": 2160,
        "color_primaries": "bt2020", "color_transfer": "arib-std-b67", "color_space": "unknown"
      }],
      "format": {"duration": "10.5", "size": "52428800"}
    }"#;
    let raw = ffgate::engine::RawProbe::from_json(json).unwrap();
    let mut run = PipelineRun::from_raw(&raw, QualityIntent::default()).unwrap();

    let plan = run
        .plan(&StaticCapabilities::default(), "mkv")
        .unwrap()
        .plan()
        .cloned()
        .unwrap();
    let hdr = plan.hdr_passthrough.expect("bt2020 primaries are preserved");
    assert_eq!(hdr.primaries, "bt2020");
    assert_eq!(hdr.transfer, "arib-std-b67");
    // "unknown" is treated as missing
    assert_eq!(hdr.space, "bt2020nc");
    assert_eq!(plan.container, "mkv");
}

#[test]
fn test_broken_probe_is_an_error_not_a_skip() {
    let raw = raw_probe("h264", 1920, 1080, "N/A", "1000");
    assert!(matches!(
        PipelineRun::from_raw(&raw, QualityIntent::default()),
        Err(EngineError::InvalidProbe(_))
    ));
}

// ============================================================================
// Gate
// ============================================================================

fn run_to_gate(original: u64) -> PipelineRun {
    let mut run = PipelineRun::new(
        video_probe("mpeg2video", 720, 576, 1800.0, original),
        QualityIntent::default(),
    )
    .unwrap();
    run.plan(&StaticCapabilities::default(), "mp4").unwrap();
    run.begin_encode().unwrap();
    run
}

#[test]
fn test_fifteen_percent_growth_reverts() {
    let mut run = run_to_gate(1_000_000);
    let out = video_probe("hevc", 720, 576, 1800.0, 1_150_000);

    let decision = run.gate(&out, Some(0.99)).unwrap().clone();
    assert!(!decision.accepted);
    assert_eq!(decision.reason, GateReason::SizeRegression);
    assert!((decision.size_delta_percent - 15.0).abs() < 1e-9);
    assert_eq!(run.state(), RunState::Reverted);
}

#[test]
fn test_no_score_is_never_verified() {
    let mut run = run_to_gate(1_000_000);
    let out = video_probe("hevc", 720, 576, 1800.0, 700_000);

    let decision = run.gate(&out, None).unwrap().clone();
    assert!(decision.accepted);
    assert_eq!(decision.annotation, Some(GateAnnotation::QualityUnverified));
    assert!(!decision.is_quality_verified());
}

#[test]
fn test_low_score_reverts_even_when_smaller() {
    let mut run = run_to_gate(1_000_000);
    let out = video_probe("hevc", 720, 576, 1800.0, 400_000);

    let decision = run
        .gate_with(Path::new("in.mpg"), Path::new("out.mp4"), &out, &KnownScore(0.90))
        .unwrap()
        .clone();
    assert!(!decision.accepted);
    assert_eq!(decision.reason, GateReason::QualityRegression);
    assert_eq!(decision.perceptual_score, Some(0.90));
}

#[test]
fn test_good_score_is_verified() {
    let mut run = run_to_gate(1_000_000);
    let out = video_probe("hevc", 720, 576, 1800.0, 400_000);

    let decision = run.gate(&out, Some(0.97)).unwrap().clone();
    assert!(decision.accepted);
    assert!(decision.is_quality_verified());
    assert_eq!(decision.annotation, None);
    assert_eq!(run.state(), RunState::Accepted);
}

#[test]
fn test_runs_are_independent() {
    let a = PipelineRun::new(hour_of_1080p(), QualityIntent::default()).unwrap();
    let b = PipelineRun::new(hour_of_1080p(), QualityIntent::default()).unwrap();
    assert_ne!(a.id, b.id);
}
