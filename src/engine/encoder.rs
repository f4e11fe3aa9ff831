//! HEVC encoder family selection with hardware fallback ordering.
//!
//! The selector never touches the host itself. Capability answers come from a
//! [`HostCapabilities`] implementation, so every fallback branch can be exercised
//! without real hardware (see `crate::host::hardware` for the system probe).

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use super::intent::QualityIntent;

/// Supported HEVC encoder families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncoderFamily {
    NvencHevc,    // NVIDIA NVENC
    QsvHevc,      // Intel Quick Sync
    SoftwareX265, // libx265
}

impl EncoderFamily {
    /// Hardware-first preference order
    pub const PRIORITY: [EncoderFamily; 3] = [
        EncoderFamily::NvencHevc,
        EncoderFamily::QsvHevc,
        EncoderFamily::SoftwareX265,
    ];

    /// Get the FFmpeg encoder name
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            Self::NvencHevc => "hevc_nvenc",
            Self::QsvHevc => "hevc_qsv",
            Self::SoftwareX265 => "libx265",
        }
    }

    pub fn is_hardware(&self) -> bool {
        !matches!(self, Self::SoftwareX265)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::NvencHevc => "HEVC NVENC (NVIDIA)",
            Self::QsvHevc => "HEVC Quick Sync (Intel)",
            Self::SoftwareX265 => "x265 (Software)",
        }
    }
}

impl fmt::Display for EncoderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Host capability answers the selector depends on.
///
/// Implementations must map any probing failure to `false`.
pub trait HostCapabilities {
    fn nvenc_available(&self) -> bool;
    fn qsv_device_present(&self) -> bool;
}

/// Fixed capability answers, for tests and the CLI `--hw` override
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticCapabilities {
    pub nvenc: bool,
    pub qsv: bool,
}

impl HostCapabilities for StaticCapabilities {
    fn nvenc_available(&self) -> bool {
        self.nvenc
    }

    fn qsv_device_present(&self) -> bool {
        self.qsv
    }
}

/// Selected encoder family plus the families an orchestrator may retry with,
/// in order. A hardware choice falls back to software; software has no fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderChoice {
    pub family: EncoderFamily,
    pub fallbacks: Vec<EncoderFamily>,
}

impl EncoderChoice {
    pub fn software() -> Self {
        Self {
            family: EncoderFamily::SoftwareX265,
            fallbacks: Vec::new(),
        }
    }

    /// Chosen family followed by the fallbacks
    pub fn chain(&self) -> impl Iterator<Item = EncoderFamily> + '_ {
        std::iter::once(self.family).chain(self.fallbacks.iter().copied())
    }
}

/// Pick an encoder family for the intent.
///
/// Without `use_gpu` this is always software and the host is never asked.
/// Otherwise NVENC is checked first and QSV only when NVENC is missing, each
/// at most once. Hardware choices fall back to software.
pub fn select_encoder<C: HostCapabilities + ?Sized>(
    intent: &QualityIntent,
    caps: &C,
) -> EncoderChoice {
    if !intent.use_gpu {
        debug!("GPU not requested, using software x265");
        return EncoderChoice::software();
    }

    let family = if caps.nvenc_available() {
        EncoderFamily::NvencHevc
    } else if caps.qsv_device_present() {
        EncoderFamily::QsvHevc
    } else {
        info!("no GPU acceleration available, using software x265");
        return EncoderChoice::software();
    };

    info!(encoder = family.ffmpeg_name(), "using hardware encoder");
    EncoderChoice {
        family,
        fallbacks: vec![EncoderFamily::SoftwareX265],
    }
}
