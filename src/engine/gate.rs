//! Post-encode accept/revert gate.
//!
//! A transcoded file is kept only if it did not grow past the allowed size
//! increase and, when a perceptual score is available, the score meets the
//! intent's threshold. Without a score the file is accepted on size alone and
//! the decision says so: it carries [`GateAnnotation::QualityUnverified`] and
//! [`GateDecision::is_quality_verified`] returns false.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use super::error::{EngineError, Result};
use super::intent::QualityIntent;
use super::probe::MediaProbe;

/// A media file as seen by a perceptual scorer
#[derive(Debug, Clone, Copy)]
pub struct MediaHandle<'a> {
    pub path: &'a Path,
    pub probe: &'a MediaProbe,
}

/// Perceptual similarity measurement (SSIM-like, 1.0 = identical).
///
/// Returns `None` when no score can be produced.
pub trait PerceptualScorer {
    fn score(&self, original: MediaHandle<'_>, transcoded: MediaHandle<'_>) -> Option<f64>;
}

/// Scorer for hosts with no measurement wired in
#[derive(Debug, Clone, Copy, Default)]
pub struct Unscored;

impl PerceptualScorer for Unscored {
    fn score(&self, _original: MediaHandle<'_>, _transcoded: MediaHandle<'_>) -> Option<f64> {
        None
    }
}

/// Score supplied up front (e.g. measured by another tool)
#[derive(Debug, Clone, Copy)]
pub struct KnownScore(pub f64);

impl PerceptualScorer for KnownScore {
    fn score(&self, _original: MediaHandle<'_>, _transcoded: MediaHandle<'_>) -> Option<f64> {
        Some(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateReason {
    Accepted,
    SizeRegression,
    QualityRegression,
}

impl GateReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::SizeRegression => "size-regression",
            Self::QualityRegression => "quality-regression",
        }
    }
}

impl fmt::Display for GateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateAnnotation {
    /// Accepted on size alone; no perceptual score was available
    QualityUnverified,
}

impl GateAnnotation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QualityUnverified => "quality-unverified",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    pub accepted: bool,
    pub reason: GateReason,
    pub size_delta_percent: f64,
    pub perceptual_score: Option<f64>,
    pub annotation: Option<GateAnnotation>,
}

impl GateDecision {
    pub fn is_quality_verified(&self) -> bool {
        self.accepted && self.perceptual_score.is_some()
    }
}

/// Percentage size change from original to transcoded; negative means smaller.
pub fn size_delta_percent(original_bytes: u64, transcoded_bytes: u64) -> Result<f64> {
    if original_bytes == 0 {
        return Err(EngineError::InvalidProbe(
            "original file size is zero".to_string(),
        ));
    }
    Ok((transcoded_bytes as f64 - original_bytes as f64) / original_bytes as f64 * 100.0)
}

/// Decide whether to keep a transcoded file.
pub fn evaluate(
    original: &MediaProbe,
    transcoded: &MediaProbe,
    intent: &QualityIntent,
    perceptual_score: Option<f64>,
) -> Result<GateDecision> {
    let delta = size_delta_percent(original.file_size_bytes, transcoded.file_size_bytes)?;
    info!("Size change: {:.2}%", delta);

    if delta > intent.max_size_increase_percent {
        info!(
            "File size increased by {:.2}%, exceeding limit of {}%",
            delta, intent.max_size_increase_percent
        );
        return Ok(reverted(GateReason::SizeRegression, delta, None));
    }

    let score = perceptual_score.and_then(checked_score);
    match score {
        Some(score) if score < intent.min_quality_threshold => {
            info!(
                score,
                threshold = intent.min_quality_threshold,
                "perceptual score below threshold"
            );
            Ok(reverted(GateReason::QualityRegression, delta, Some(score)))
        }
        Some(score) => {
            info!(score, "quality validation passed");
            Ok(GateDecision {
                accepted: true,
                reason: GateReason::Accepted,
                size_delta_percent: delta,
                perceptual_score: Some(score),
                annotation: None,
            })
        }
        None => {
            warn!("no perceptual score available, accepting on size alone (quality unverified)");
            Ok(GateDecision {
                accepted: true,
                reason: GateReason::Accepted,
                size_delta_percent: delta,
                perceptual_score: None,
                annotation: Some(GateAnnotation::QualityUnverified),
            })
        }
    }
}

/// Like [`evaluate`], asking `scorer` only when the size check passes.
pub fn evaluate_with<S: PerceptualScorer + ?Sized>(
    original: MediaHandle<'_>,
    transcoded: MediaHandle<'_>,
    intent: &QualityIntent,
    scorer: &S,
) -> Result<GateDecision> {
    let delta = size_delta_percent(
        original.probe.file_size_bytes,
        transcoded.probe.file_size_bytes,
    )?;
    let score = if delta > intent.max_size_increase_percent {
        None
    } else {
        scorer.score(original, transcoded)
    };
    evaluate(original.probe, transcoded.probe, intent, score)
}

fn reverted(reason: GateReason, delta: f64, score: Option<f64>) -> GateDecision {
    GateDecision {
        accepted: false,
        reason,
        size_delta_percent: delta,
        perceptual_score: score,
        annotation: None,
    }
}

fn checked_score(score: f64) -> Option<f64> {
    if (0.0..=1.0).contains(&score) {
        Some(score)
    } else {
        warn!(score, "perceptual score outside [0, 1], treating as unavailable");
        None
    }
}
