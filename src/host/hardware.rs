//! Host hardware encoding detection (NVIDIA NVENC, Intel Quick Sync)
//!
//! Every probe here fails soft: a missing tool, a non-zero exit or an unreadable
//! device directory all read as "not available".

use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;
use tracing::debug;

use crate::engine::{EncoderFamily, HostCapabilities, StaticCapabilities};

/// Cache for the output of `ffmpeg -encoders`.
static FFMPEG_ENCODERS_OUTPUT_CACHE: OnceLock<String> = OnceLock::new();

static NVENC_CACHE: OnceLock<bool> = OnceLock::new();
static QSV_CACHE: OnceLock<bool> = OnceLock::new();

fn ffmpeg_encoders_output() -> &'static str {
    FFMPEG_ENCODERS_OUTPUT_CACHE.get_or_init(|| {
        match Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .output()
        {
            Ok(o) => String::from_utf8_lossy(&o.stdout).to_string(),
            Err(e) => {
                debug!("ffmpeg -encoders failed: {}", e);
                String::new()
            }
        }
    })
}

/// Check if this ffmpeg build lists an encoder
pub fn ffmpeg_has_encoder(name: &str) -> bool {
    ffmpeg_encoders_output()
        .split_whitespace()
        .any(|word| word == name)
}

/// Detect NVIDIA GPU using nvidia-smi
pub fn detect_nvidia_gpu() -> Option<String> {
    let output = match Command::new("nvidia-smi")
        .args(["--query-gpu=name", "--format=csv,noheader"])
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            debug!("nvidia-smi not runnable: {}", e);
            return None;
        }
    };

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let name = stdout.lines().next()?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// First DRM render node (`/dev/dri/renderD128` on most systems)
pub fn detect_render_device() -> Option<String> {
    detect_render_device_in(Path::new("/dev/dri"))
}

fn detect_render_device_in(dri_path: &Path) -> Option<String> {
    let mut devices: Vec<_> = std::fs::read_dir(dri_path)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|n| n.starts_with("renderD"))
                .unwrap_or(false)
        })
        .map(|e| e.path())
        .collect();

    // renderD128 before renderD129
    devices.sort();

    devices.first().map(|p| p.to_string_lossy().to_string())
}

/// Capability answers from the running host, each probed once per process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCapabilities;

impl HostCapabilities for SystemCapabilities {
    fn nvenc_available(&self) -> bool {
        *NVENC_CACHE.get_or_init(|| {
            let available = ffmpeg_has_encoder("hevc_nvenc") && detect_nvidia_gpu().is_some();
            debug!(available, "NVENC probe");
            available
        })
    }

    fn qsv_device_present(&self) -> bool {
        *QSV_CACHE.get_or_init(|| {
            let available = detect_render_device().is_some() && ffmpeg_has_encoder("hevc_qsv");
            debug!(available, "QSV probe");
            available
        })
    }
}

/// How the CLI answers capability questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum HwMode {
    /// Probe the host
    #[default]
    Auto,
    /// Pretend no hardware encoder exists
    None,
    /// Pretend only NVENC exists
    Nvenc,
    /// Pretend only Quick Sync exists
    Qsv,
}

pub fn capabilities_for(mode: HwMode) -> Box<dyn HostCapabilities> {
    match mode {
        HwMode::Auto => Box::new(SystemCapabilities),
        HwMode::None => Box::new(StaticCapabilities::default()),
        HwMode::Nvenc => Box::new(StaticCapabilities {
            nvenc: true,
            qsv: false,
        }),
        HwMode::Qsv => Box::new(StaticCapabilities {
            nvenc: false,
            qsv: true,
        }),
    }
}

/// Snapshot of what the host offers, for `ffgate check-hw`
#[derive(Debug, Clone, serde::Serialize)]
pub struct HwReport {
    pub nvidia_gpu: Option<String>,
    pub render_device: Option<String>,
    pub hevc_nvenc_encoder: bool,
    pub hevc_qsv_encoder: bool,
    pub libx265_encoder: bool,
}

impl HwReport {
    /// Families this host can run, in selection order
    pub fn available_encoders(&self) -> Vec<EncoderFamily> {
        EncoderFamily::PRIORITY
            .into_iter()
            .filter(|family| match family {
                EncoderFamily::NvencHevc => self.hevc_nvenc_encoder && self.nvidia_gpu.is_some(),
                EncoderFamily::QsvHevc => self.hevc_qsv_encoder && self.render_device.is_some(),
                EncoderFamily::SoftwareX265 => self.libx265_encoder,
            })
            .collect()
    }
}

pub fn hw_report() -> HwReport {
    HwReport {
        nvidia_gpu: detect_nvidia_gpu(),
        render_device: detect_render_device(),
        hevc_nvenc_encoder: ffmpeg_has_encoder("hevc_nvenc"),
        hevc_qsv_encoder: ffmpeg_has_encoder("hevc_qsv"),
        libx265_encoder: ffmpeg_has_encoder("libx265"),
    }
}
