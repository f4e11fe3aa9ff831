use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::engine::{PlanMode, QualityIntent, QualityTier};
use crate::host::hardware::HwMode;

#[derive(Parser)]
#[command(name = "ffgate")]
#[command(
    about = "Content-adaptive HEVC transcode planner with a revert-on-regression quality gate",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub overrides: IntentOverrides,

    /// Debug logging (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe a file and print its encode plan (or why it is skipped)
    Plan {
        /// Path to the video file
        file: PathBuf,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Plan every video under a directory and show the ffmpeg commands
    DryRun {
        /// Directory to scan (defaults to current directory)
        directory: Option<PathBuf>,
    },

    /// Decide whether to keep a transcoded file or revert to the original
    Gate {
        /// The untouched source file
        original: PathBuf,

        /// The executor's output
        transcoded: PathBuf,

        /// Perceptual similarity score in [0,1], if one was measured
        #[arg(long)]
        score: Option<f64>,
    },

    /// Report NVENC / Quick Sync detection and the resulting encoder chain
    CheckHw {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show lifetime gate statistics
    Stats,

    /// Show config status and location, or create default config if missing
    InitConfig,
}

/// Per-invocation overrides of the `[defaults]` config section
#[derive(Args, Debug, Default, Clone)]
pub struct IntentOverrides {
    /// Quality tier (archive, high, balanced, efficient)
    #[arg(long, global = true)]
    pub tier: Option<String>,

    /// Allow hardware encoders
    #[arg(long, global = true, conflicts_with = "no_gpu")]
    pub gpu: bool,

    /// Software x265 only
    #[arg(long, global = true, conflicts_with = "gpu")]
    pub no_gpu: bool,

    /// Planning policy (quality, reduction)
    #[arg(long, global = true, value_parser = parse_mode)]
    pub mode: Option<PlanMode>,

    /// Target size reduction in percent (20-80), reduction mode only
    #[arg(long, global = true, value_name = "PERCENT")]
    pub reduction: Option<f64>,

    /// Minimum acceptable perceptual score (0.8-1.0)
    #[arg(long, global = true, value_name = "SCORE")]
    pub min_quality: Option<f64>,

    /// Largest tolerated size growth in percent (0-50)
    #[arg(long, global = true, value_name = "PERCENT")]
    pub max_size_increase: Option<f64>,

    /// Output container extension
    #[arg(long, global = true)]
    pub container: Option<String>,

    /// Capability source for encoder selection
    #[arg(long, global = true, value_enum, default_value_t = HwMode::Auto)]
    pub hw: HwMode,
}

impl IntentOverrides {
    /// Layer these flags over an intent built from config. Not validated.
    pub fn apply(&self, mut intent: QualityIntent) -> QualityIntent {
        if let Some(tier) = &self.tier {
            intent.tier = QualityTier::from_name(tier);
        }
        if self.gpu {
            intent.use_gpu = true;
        }
        if self.no_gpu {
            intent.use_gpu = false;
        }
        if let Some(mode) = self.mode {
            intent.mode = mode;
        }
        if let Some(reduction) = self.reduction {
            intent.target_reduction_percent = reduction;
        }
        if let Some(min_quality) = self.min_quality {
            intent.min_quality_threshold = min_quality;
        }
        if let Some(max_increase) = self.max_size_increase {
            intent.max_size_increase_percent = max_increase;
        }
        intent
    }
}

fn parse_mode(s: &str) -> Result<PlanMode, String> {
    PlanMode::from_name(s).ok_or_else(|| format!("unknown mode '{}' (quality, reduction)", s))
}

pub fn parse() -> Cli {
    Cli::parse()
}
