//! User quality intent and its boundary validation.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use super::error::{EngineError, Result};
use super::quality::QualityTier;

pub const TARGET_REDUCTION_RANGE: RangeInclusive<f64> = 20.0..=80.0;
pub const MIN_QUALITY_RANGE: RangeInclusive<f64> = 0.8..=1.0;
pub const MAX_SIZE_INCREASE_RANGE: RangeInclusive<f64> = 0.0..=50.0;

/// Which of the two quality policies drives the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanMode {
    /// Tier base quality, single pass
    #[default]
    #[serde(alias = "fixed")]
    Quality,
    /// Resolution-aware quality from the bitrate planner, two pass
    Reduction,
}

impl PlanMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "quality" | "fixed" => Some(Self::Quality),
            "reduction" | "size" => Some(Self::Reduction),
            _ => None,
        }
    }
}

/// Validated quality intent. Construct with [`QualityIntent::new`] or
/// [`QualityIntent::validate`]; the planning stages assume every field is in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIntent {
    pub tier: QualityTier,
    pub use_gpu: bool,
    pub preserve_hdr: bool,
    pub mode: PlanMode,
    pub target_reduction_percent: f64,
    pub min_quality_threshold: f64,
    pub max_size_increase_percent: f64,
}

impl Default for QualityIntent {
    fn default() -> Self {
        Self {
            tier: QualityTier::High,
            use_gpu: true,
            preserve_hdr: true,
            mode: PlanMode::Quality,
            target_reduction_percent: 50.0,
            min_quality_threshold: 0.95,
            max_size_increase_percent: 10.0,
        }
    }
}

impl QualityIntent {
    /// Default intent for a tier
    pub fn new(tier: QualityTier) -> Self {
        Self {
            tier,
            ..Self::default()
        }
    }

    /// Reject percentages and thresholds outside their declared ranges.
    pub fn validate(self) -> Result<Self> {
        check_range(
            "target_reduction_percent",
            self.target_reduction_percent,
            &TARGET_REDUCTION_RANGE,
        )?;
        check_range(
            "min_quality_threshold",
            self.min_quality_threshold,
            &MIN_QUALITY_RANGE,
        )?;
        check_range(
            "max_size_increase_percent",
            self.max_size_increase_percent,
            &MAX_SIZE_INCREASE_RANGE,
        )?;
        Ok(self)
    }

    pub fn reduction_fraction(&self) -> f64 {
        self.target_reduction_percent / 100.0
    }
}

fn check_range(field: &'static str, value: f64, range: &RangeInclusive<f64>) -> Result<()> {
    // NaN fails `contains`
    if range.contains(&value) {
        Ok(())
    } else {
        Err(EngineError::intent(
            field,
            format!(
                "must be within {}..={}, got {}",
                range.start(),
                range.end(),
                value
            ),
        ))
    }
}
