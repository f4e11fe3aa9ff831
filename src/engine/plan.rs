//! Structured encode plans handed to an external executor.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use super::encoder::EncoderChoice;
use super::intent::{PlanMode, QualityIntent};
use super::probe::MediaProbe;
use super::quality::SpeedPreset;

/// Codec every plan encodes to
pub const TARGET_CODEC: &str = "hevc";

pub const DEFAULT_CONTAINER: &str = "mp4";

/// Fallbacks when a stream carries primaries but no transfer/space tags
pub const DEFAULT_HDR_TRANSFER: &str = "smpte2084";
pub const DEFAULT_HDR_SPACE: &str = "bt2020nc";

/// Why a file passes through unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    NoVideoStream,
    AlreadyTargetCodec,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoVideoStream => "no-video-stream",
            Self::AlreadyTargetCodec => "already-target-codec",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color tags copied onto the output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HdrPassthrough {
    pub primaries: String,
    pub transfer: String,
    pub space: String,
}

/// One file's encode work. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodePlan {
    pub encoder: EncoderChoice,
    pub quality_param: u32,
    pub speed_preset: SpeedPreset,
    pub container: String,
    pub copy_audio: bool,
    pub copy_subtitles: bool,
    pub hdr_passthrough: Option<HdrPassthrough>,
    pub two_pass: bool,
    pub requeue_after_encode: bool,
    /// One-line description for job logs
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum PlanOutcome {
    Ready(EncodePlan),
    Skip { reason: SkipReason },
}

impl PlanOutcome {
    pub fn skip(reason: SkipReason) -> Self {
        Self::Skip { reason }
    }

    pub fn plan(&self) -> Option<&EncodePlan> {
        match self {
            Self::Ready(plan) => Some(plan),
            Self::Skip { .. } => None,
        }
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Ready(_) => None,
            Self::Skip { reason } => Some(*reason),
        }
    }
}

pub fn is_target_codec(codec: &str) -> bool {
    codec.eq_ignore_ascii_case(TARGET_CODEC) || codec.eq_ignore_ascii_case("h265")
}

/// Assemble a plan, or skip when there is nothing worth encoding.
///
/// `quality_param` and `speed_preset` come from either the tier table
/// ([`PlanMode::Quality`]) or the bitrate planner ([`PlanMode::Reduction`]);
/// the mode also decides two-pass.
pub fn build_plan(
    probe: &MediaProbe,
    encoder: EncoderChoice,
    quality_param: u32,
    speed_preset: SpeedPreset,
    intent: &QualityIntent,
    container: &str,
) -> PlanOutcome {
    if !probe.has_video {
        debug!("no video stream, passing through");
        return PlanOutcome::skip(SkipReason::NoVideoStream);
    }

    if is_target_codec(&probe.codec) {
        info!(codec = %probe.codec, "file already uses HEVC, skipping");
        return PlanOutcome::skip(SkipReason::AlreadyTargetCodec);
    }

    let hdr_passthrough = if intent.preserve_hdr {
        probe.color_primaries.as_ref().map(|primaries| HdrPassthrough {
            primaries: primaries.clone(),
            transfer: probe
                .color_transfer
                .clone()
                .unwrap_or_else(|| DEFAULT_HDR_TRANSFER.to_string()),
            space: probe
                .color_space
                .clone()
                .unwrap_or_else(|| DEFAULT_HDR_SPACE.to_string()),
        })
    } else {
        None
    };

    if hdr_passthrough.is_some() {
        debug!("preserving HDR metadata");
    }

    let two_pass = intent.mode == PlanMode::Reduction;
    let container = container.trim_start_matches('.');
    let container = if container.is_empty() {
        DEFAULT_CONTAINER
    } else {
        container
    };

    let summary = summarize(&encoder, quality_param, speed_preset, intent, two_pass);
    info!(%summary, "encode plan ready");

    PlanOutcome::Ready(EncodePlan {
        encoder,
        quality_param,
        speed_preset,
        container: container.to_string(),
        copy_audio: true,
        copy_subtitles: true,
        hdr_passthrough,
        two_pass,
        requeue_after_encode: true,
        summary,
    })
}

fn summarize(
    encoder: &EncoderChoice,
    quality_param: u32,
    speed_preset: SpeedPreset,
    intent: &QualityIntent,
    two_pass: bool,
) -> String {
    let base = format!(
        "{} q{} {}",
        encoder.family.ffmpeg_name(),
        quality_param,
        speed_preset
    );
    if two_pass {
        format!(
            "{}, two-pass, targeting {}% smaller",
            base, intent.target_reduction_percent
        )
    } else {
        format!("{}, {} tier", base, intent.tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::encoder::EncoderFamily;

    fn probe(codec: &str) -> MediaProbe {
        MediaProbe {
            has_video: true,
            codec: codec.to_string(),
            width: 1920,
            height: 1080,
            duration_seconds: 120.0,
            file_size_bytes: 500_000_000,
            color_primaries: None,
            color_transfer: None,
            color_space: None,
        }
    }

    fn build(probe: &MediaProbe, intent: &QualityIntent) -> PlanOutcome {
        build_plan(
            probe,
            EncoderChoice::software(),
            20,
            SpeedPreset::Slow,
            intent,
            DEFAULT_CONTAINER,
        )
    }

    #[test]
    fn test_skip_when_already_hevc() {
        let intent = QualityIntent::default();
        assert_eq!(
            build(&probe("hevc"), &intent).skip_reason(),
            Some(SkipReason::AlreadyTargetCodec)
        );
        assert_eq!(
            build(&probe("HEVC"), &intent).skip_reason(),
            Some(SkipReason::AlreadyTargetCodec)
        );
    }

    #[test]
    fn test_skip_without_video() {
        let mut audio_only = probe("h264");
        audio_only.has_video = false;
        assert_eq!(
            build(&audio_only, &QualityIntent::default()).skip_reason(),
            Some(SkipReason::NoVideoStream)
        );
    }

    #[test]
    fn test_plan_always_copies_streams_and_requeues() {
        let outcome = build(&probe("h264"), &QualityIntent::default());
        let plan = outcome.plan().expect("h264 should be planned");

        assert!(plan.copy_audio);
        assert!(plan.copy_subtitles);
        assert!(plan.requeue_after_encode);
        assert!(!plan.two_pass);
        assert_eq!(plan.container, "mp4");
        assert_eq!(plan.encoder.family, EncoderFamily::SoftwareX265);
    }

    #[test]
    fn test_reduction_mode_is_two_pass() {
        let intent = QualityIntent {
            mode: PlanMode::Reduction,
            ..QualityIntent::default()
        };
        let outcome = build(&probe("h264"), &intent);
        let plan = outcome.plan().unwrap();

        assert!(plan.two_pass);
        assert!(plan.summary.contains("two-pass"));
    }

    #[test]
    fn test_hdr_defaults_fill_missing_tags() {
        let mut hdr = probe("h264");
        hdr.color_primaries = Some("bt2020".to_string());

        let outcome = build(&hdr, &QualityIntent::default());
        let passthrough = outcome.plan().unwrap().hdr_passthrough.clone().unwrap();

        assert_eq!(passthrough.primaries, "bt2020");
        assert_eq!(passthrough.transfer, DEFAULT_HDR_TRANSFER);
        assert_eq!(passthrough.space, DEFAULT_HDR_SPACE);
    }

    #[test]
    fn test_hdr_requires_primaries_and_intent() {
        let mut tagged = probe("h264");
        tagged.color_transfer = Some("arib-std-b67".to_string());
        let outcome = build(&tagged, &QualityIntent::default());
        assert_eq!(outcome.plan().unwrap().hdr_passthrough, None);

        tagged.color_primaries = Some("bt2020".to_string());
        let intent = QualityIntent {
            preserve_hdr: false,
            ..QualityIntent::default()
        };
        let outcome = build(&tagged, &intent);
        assert_eq!(outcome.plan().unwrap().hdr_passthrough, None);
    }

    #[test]
    fn test_container_dot_is_stripped() {
        let outcome = build_plan(
            &probe("mpeg2video"),
            EncoderChoice::software(),
            23,
            SpeedPreset::Medium,
            &QualityIntent::default(),
            ".mkv",
        );
        assert_eq!(outcome.plan().unwrap().container, "mkv");
    }
}
