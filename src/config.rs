// Global configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::engine::error::Result as EngineResult;
use crate::engine::plan::DEFAULT_CONTAINER;
use crate::engine::{EngineError, PlanMode, QualityIntent, QualityTier};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Intent inputs, in the loose shape plugin-style settings arrive in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Quality tier name; unknown names fall back to "high"
    #[serde(default = "default_tier")]
    pub tier: String,

    /// Allow hardware encoders (NVENC, Quick Sync)
    #[serde(default = "default_true_config")]
    pub use_gpu: bool,

    /// Carry HDR color tags onto the output
    #[serde(default = "default_true_config")]
    pub preserve_hdr: bool,

    /// "quality" (tier quality, single pass) or "reduction" (bitrate target, two pass)
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Size reduction goal in percent (20-80)
    #[serde(default = "default_target_reduction_percent")]
    pub target_reduction_percent: f64,

    /// Minimum perceptual score the gate accepts (0.8-1.0)
    #[serde(default = "default_min_quality_threshold")]
    pub min_quality_threshold: f64,

    /// Largest size growth the gate tolerates in percent (0-50)
    #[serde(default = "default_max_size_increase_percent")]
    pub max_size_increase_percent: f64,

    /// Output container extension
    #[serde(default = "default_container")]
    pub container: String,
}

fn default_tier() -> String {
    QualityTier::default().as_str().to_string()
}

fn default_true_config() -> bool {
    true
}

fn default_mode() -> String {
    "quality".to_string()
}

fn default_target_reduction_percent() -> f64 {
    50.0
}

fn default_min_quality_threshold() -> f64 {
    0.95
}

fn default_max_size_increase_percent() -> f64 {
    10.0
}

fn default_container() -> String {
    DEFAULT_CONTAINER.to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            tier: default_tier(),
            use_gpu: true,
            preserve_hdr: true,
            mode: default_mode(),
            target_reduction_percent: default_target_reduction_percent(),
            min_quality_threshold: default_min_quality_threshold(),
            max_size_increase_percent: default_max_size_increase_percent(),
            container: default_container(),
        }
    }
}

impl DefaultsConfig {
    /// Unvalidated intent from these settings; see [`Config::intent`].
    pub fn raw_intent(&self) -> EngineResult<QualityIntent> {
        let mode = PlanMode::from_name(&self.mode).ok_or_else(|| {
            EngineError::intent(
                "mode",
                format!("expected 'quality' or 'reduction', got '{}'", self.mode),
            )
        })?;

        Ok(QualityIntent {
            tier: QualityTier::from_name(&self.tier),
            use_gpu: self.use_gpu,
            preserve_hdr: self.preserve_hdr,
            mode,
            target_reduction_percent: self.target_reduction_percent,
            min_quality_threshold: self.min_quality_threshold,
            max_size_increase_percent: self.max_size_increase_percent,
        })
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
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

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from disk, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();

            // A read-only config dir still gets built-in defaults
            if let Err(e) = config.save() {
                warn!(
                    "Could not create default config file: {:#}. Using built-in defaults; run 'ffgate init-config' to create one.",
                    e
                );
            }

            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Check if config file exists
    pub fn exists() -> bool {
        Self::config_path().map(|p| p.exists()).unwrap_or(false)
    }

    /// Create a default config file if it doesn't exist
    pub fn ensure_default() -> Result<()> {
        if !Self::exists() {
            Config::default().save()?;
        }
        Ok(())
    }

    /// Validated intent from the `[defaults]` section
    pub fn intent(&self) -> EngineResult<QualityIntent> {
        self.defaults.raw_intent()?.validate()
    }
}
