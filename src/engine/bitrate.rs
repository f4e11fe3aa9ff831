//! Bitrate analysis and resolution-aware quality selection for size-reduction plans.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{EngineError, Result};
use super::intent::QualityIntent;
use super::probe::MediaProbe;

/// Bounds for the final quality parameter
pub const MIN_QUALITY_PARAM: u32 = 16;
pub const MAX_QUALITY_PARAM: u32 = 32;

/// Reduction percent at which the quality adjustment is zero
pub const NEUTRAL_REDUCTION_PERCENT: f64 = 40.0;

const UHD_PIXELS: u64 = 3840 * 2160;
const FHD_PIXELS: u64 = 1920 * 1080;
const HD_PIXELS: u64 = 1280 * 720;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BitrateAnalysis {
    pub current_bitrate_kbps: f64,
    /// Informational; the quality parameter is not derived from it
    pub target_bitrate_kbps: f64,
    pub resolution_base: u32,
    pub adjustment: i32,
    pub final_quality_param: u32,
}

/// Base quality parameter for a frame size. Larger frames get a lower (finer) value.
pub fn resolution_base_quality(width: u32, height: u32) -> u32 {
    let pixels = width as u64 * height as u64;
    if pixels >= UHD_PIXELS {
        20
    } else if pixels >= FHD_PIXELS {
        23
    } else if pixels >= HD_PIXELS {
        26
    } else {
        28
    }
}

/// Quality offset for a reduction: `round((fraction - 0.4) * 10)`, half-up.
///
/// Computed in percent space so whole percents land exactly on the half
/// steps (35% is exactly -0.5 and rounds to 0).
pub fn reduction_adjustment(target_reduction_percent: f64) -> i32 {
    round_half_up((target_reduction_percent - NEUTRAL_REDUCTION_PERCENT) / 10.0) as i32
}

/// Compute current/target bitrate and the clamped quality parameter for a
/// size-reduction plan.
///
/// `intent` must already be validated. A zero or negative duration fails
/// with [`EngineError::InvalidProbe`] instead of producing an infinite bitrate.
pub fn plan_bitrate(probe: &MediaProbe, intent: &QualityIntent) -> Result<BitrateAnalysis> {
    if !probe.duration_seconds.is_finite() || probe.duration_seconds <= 0.0 {
        return Err(EngineError::InvalidProbe(format!(
            "cannot derive bitrate from duration {}",
            probe.duration_seconds
        )));
    }

    let current_bitrate_kbps =
        probe.file_size_bytes as f64 * 8.0 / probe.duration_seconds / 1000.0;
    let reduction_fraction = intent.reduction_fraction();
    let target_bitrate_kbps = round_half_up(current_bitrate_kbps * (1.0 - reduction_fraction));

    let resolution_base = resolution_base_quality(probe.width, probe.height);
    let adjustment = reduction_adjustment(intent.target_reduction_percent);
    let final_quality_param = (resolution_base as i64 + adjustment as i64)
        .clamp(MIN_QUALITY_PARAM as i64, MAX_QUALITY_PARAM as i64) as u32;

    info!(
        current_kbps = current_bitrate_kbps.round(),
        target_kbps = target_bitrate_kbps,
        base = resolution_base,
        adjustment,
        quality = final_quality_param,
        "bitrate plan"
    );

    Ok(BitrateAnalysis {
        current_bitrate_kbps,
        target_bitrate_kbps,
        resolution_base,
        adjustment,
        final_quality_param,
    })
}

// Halves round toward +inf, so -0.5 -> 0 and 0.5 -> 1
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}
