// Config and stats persistence on real files

use ffgate::config::Config;
use ffgate::engine::{GateDecision, GateReason, PlanMode, QualityTier};
use ffgate::stats::GateStats;
use std::fs;

#[test]
fn test_config_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.defaults.tier = "archive".to_string();
    config.defaults.use_gpu = false;
    config.defaults.mode = "reduction".to_string();
    config.defaults.target_reduction_percent = 35.0;
    config.defaults.container = "mkv".to_string();
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.defaults.container, "mkv");

    let intent = loaded.intent().unwrap();
    assert_eq!(intent.tier, QualityTier::Archive);
    assert!(!intent.use_gpu);
    assert_eq!(intent.mode, PlanMode::Reduction);
    assert_eq!(intent.target_reduction_percent, 35.0);
}

#[test]
fn test_hand_written_config_with_legacy_mode_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[defaults]
tier = "Balanced"
mode = "fixed"
min_quality_threshold = 0.9
"#,
    )
    .unwrap();

    let intent = Config::load_from(&path).unwrap().intent().unwrap();
    assert_eq!(intent.tier, QualityTier::Balanced);
    assert_eq!(intent.mode, PlanMode::Quality);
    assert_eq!(intent.min_quality_threshold, 0.9);
    assert_eq!(intent.max_size_increase_percent, 10.0);
}

#[test]
fn test_malformed_config_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[defaults\ntier = ").unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("config.toml"));
}

#[test]
fn test_stats_accumulate_across_saves() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.json");

    let accepted = GateDecision {
        accepted: true,
        reason: GateReason::Accepted,
        size_delta_percent: -40.0,
        perceptual_score: Some(0.97),
        annotation: None,
    };

    let mut stats = GateStats::load_from(&path).unwrap();
    stats.record(&accepted, 1_000, 600);
    stats.save_to(&path).unwrap();

    let mut stats = GateStats::load_from(&path).unwrap();
    stats.record(&accepted, 1_000, 500);
    stats.save_to(&path).unwrap();

    let stats = GateStats::load_from(&path).unwrap();
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.unverified, 0);
    assert_eq!(stats.bytes_saved(), 900);
    assert!(stats.last_updated.is_some());
}
