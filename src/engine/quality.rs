//! Quality tiers and the static tier -> (base quality, speed preset) table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named quality intent. Ordered from most archival to most compact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Archive,
    #[default]
    High,
    Balanced,
    Efficient,
}

impl QualityTier {
    pub const ALL: [QualityTier; 4] = [
        QualityTier::Archive,
        QualityTier::High,
        QualityTier::Balanced,
        QualityTier::Efficient,
    ];

    /// Map a configuration string onto a tier. Unknown names fall back to `High`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "archive" => Self::Archive,
            "high" => Self::High,
            "balanced" => Self::Balanced,
            "efficient" => Self::Efficient,
            other => {
                tracing::warn!(tier = other, "unknown quality tier, using 'high'");
                Self::default()
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::High => "high",
            Self::Balanced => "balanced",
            Self::Efficient => "efficient",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// x265-style speed presets (QSV accepts the same names)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedPreset {
    Fast,
    Medium,
    Slow,
    VerySlow,
}

impl SpeedPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Medium => "medium",
            Self::Slow => "slow",
            Self::VerySlow => "veryslow",
        }
    }
}

impl fmt::Display for SpeedPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityTierParams {
    /// CRF-equivalent; lower is higher quality
    pub base_quality: u32,
    pub speed_preset: SpeedPreset,
}

const TIER_TABLE: [(QualityTier, QualityTierParams); 4] = [
    (
        QualityTier::Archive,
        QualityTierParams {
            base_quality: 18,
            speed_preset: SpeedPreset::VerySlow,
        },
    ),
    (
        QualityTier::High,
        QualityTierParams {
            base_quality: 20,
            speed_preset: SpeedPreset::Slow,
        },
    ),
    (
        QualityTier::Balanced,
        QualityTierParams {
            base_quality: 23,
            speed_preset: SpeedPreset::Medium,
        },
    ),
    (
        QualityTier::Efficient,
        QualityTierParams {
            base_quality: 26,
            speed_preset: SpeedPreset::Fast,
        },
    ),
];

/// Speed preset used by size-reduction plans regardless of tier
pub const REDUCTION_SPEED_PRESET: SpeedPreset = SpeedPreset::Medium;

/// Look up the base quality and speed preset for a tier.
pub fn resolve(tier: QualityTier) -> QualityTierParams {
    TIER_TABLE
        .iter()
        .find(|(t, _)| *t == tier)
        .map(|(_, params)| *params)
        .unwrap_or(TIER_TABLE[1].1)
}
