// Gate statistics tracking and persistence

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::GateDecision;

/// Lifetime tallies of gate verdicts. Reporting only.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GateStats {
    /// Transcodes kept
    pub accepted: u64,

    /// Transcodes discarded in favor of the original
    pub reverted: u64,

    /// Accepted without a perceptual score
    #[serde(default)]
    pub unverified: u64,

    /// Total bytes of all gated originals
    pub original_bytes: u64,

    /// Total bytes of whichever file was kept for each gate
    pub kept_bytes: u64,

    /// Last updated timestamp (RFC 3339)
    pub last_updated: Option<String>,
}

impl GateStats {
    /// Get the path to the stats file (next to the config file)
    pub fn stats_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "macos") {
            dirs::home_dir()
                .context("Could not determine home directory")?
                .join(".config")
                .join("ffgate")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("ffgate")
        };

        Ok(config_dir.join("stats.json"))
    }

    /// Load stats from disk, or return default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::stats_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(GateStats::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read stats file: {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse stats file: {}", path.display()))
    }

    /// Save stats to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::stats_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize stats")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write stats file: {}", path.display()))?;

        Ok(())
    }

    /// Count one gate verdict
    pub fn record(&mut self, decision: &GateDecision, original_bytes: u64, transcoded_bytes: u64) {
        if decision.accepted {
            self.accepted += 1;
            if !decision.is_quality_verified() {
                self.unverified += 1;
            }
            self.kept_bytes += transcoded_bytes;
        } else {
            self.reverted += 1;
            self.kept_bytes += original_bytes;
        }
        self.original_bytes += original_bytes;
        self.last_updated = Some(chrono::Utc::now().to_rfc3339());
    }

    pub fn total_gated(&self) -> u64 {
        self.accepted + self.reverted
    }

    /// Bytes saved across all gates; negative if kept files grew
    pub fn bytes_saved(&self) -> i64 {
        self.original_bytes as i64 - self.kept_bytes as i64
    }

    pub fn percent_saved(&self) -> f64 {
        if self.original_bytes == 0 {
            0.0
        } else {
            self.bytes_saved() as f64 / self.original_bytes as f64 * 100.0
        }
    }

    /// Format space saved
    pub fn format_space_saved(&self) -> String {
        let saved = self.bytes_saved();
        if saved >= 0 {
            format!(
                "{} saved ({})",
                format_bytes(saved as u64),
                format_percent(self.percent_saved())
            )
        } else {
            format!("{} larger", format_bytes(saved.unsigned_abs()))
        }
    }
}

/// Format bytes as human-readable size
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

pub fn format_percent(percent: f64) -> String {
    format!("{:.1}%", percent)
}
