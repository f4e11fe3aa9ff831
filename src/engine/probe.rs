// Probe analysis: raw ffprobe-shaped data -> normalized MediaProbe

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{EngineError, Result};

/// Raw probe output in the shape `ffprobe -print_format json -show_format -show_streams` emits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProbe {
    #[serde(default)]
    pub streams: Vec<RawStream>,

    #[serde(default)]
    pub format: RawFormat,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStream {
    #[serde(default)]
    pub codec_type: Option<String>,
    #[serde(default)]
    pub codec_name: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub color_primaries: Option<String>,
    #[serde(default)]
    pub color_transfer: Option<String>,
    #[serde(default)]
    pub color_space: Option<String>,
}

/// Container-level fields. ffprobe reports both as decimal strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFormat {
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

impl RawProbe {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// First stream whose `codec_type` is `video`
    pub fn video_stream(&self) -> Option<&RawStream> {
        self.streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
    }
}

/// Normalized facts about one media file. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaProbe {
    pub has_video: bool,
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub duration_seconds: f64,
    pub file_size_bytes: u64,
    pub color_primaries: Option<String>,
    pub color_transfer: Option<String>,
    pub color_space: Option<String>,
}

impl MediaProbe {
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Check the facts every plan depends on. A probe without video has
    /// nothing to check; it plans to a skip.
    pub fn validate(&self) -> Result<()> {
        if !self.has_video {
            return Ok(());
        }
        if self.width == 0 || self.height == 0 {
            return Err(EngineError::InvalidProbe(format!(
                "frame size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.duration_seconds.is_finite() || self.duration_seconds <= 0.0 {
            return Err(EngineError::InvalidProbe(format!(
                "duration must be positive, got {}",
                self.duration_seconds
            )));
        }
        Ok(())
    }
}

/// Extract the decision-relevant facts from a raw probe.
///
/// Fails with [`EngineError::NoVideoStream`] when there is no video stream,
/// which callers turn into a pass-through skip. Missing dimensions, a
/// missing size, or a non-positive duration fail with
/// [`EngineError::InvalidProbe`].
pub fn analyze(raw: &RawProbe) -> Result<MediaProbe> {
    let video = raw.video_stream().ok_or(EngineError::NoVideoStream)?;

    let codec = video
        .codec_name
        .clone()
        .ok_or_else(|| EngineError::InvalidProbe("video stream has no codec name".into()))?;

    let width = positive_dimension(video.width, "width")?;
    let height = positive_dimension(video.height, "height")?;

    let duration_seconds = parse_number::<f64>(raw.format.duration.as_deref(), "duration")?;
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return Err(EngineError::InvalidProbe(format!(
            "duration must be positive, got {}",
            duration_seconds
        )));
    }

    let file_size_bytes = parse_number::<u64>(raw.format.size.as_deref(), "size")?;

    let probe = MediaProbe {
        has_video: true,
        codec,
        width,
        height,
        duration_seconds,
        file_size_bytes,
        color_primaries: color_tag(&video.color_primaries),
        color_transfer: color_tag(&video.color_transfer),
        color_space: color_tag(&video.color_space),
    };
    probe.validate()?;

    debug!(
        codec = %probe.codec,
        width = probe.width,
        height = probe.height,
        duration_s = probe.duration_seconds,
        size = probe.file_size_bytes,
        "analyzed probe"
    );

    Ok(probe)
}

fn positive_dimension(value: Option<u32>, field: &str) -> Result<u32> {
    match value {
        Some(v) if v > 0 => Ok(v),
        _ => Err(EngineError::InvalidProbe(format!(
            "video stream has no {}",
            field
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(value: Option<&str>, field: &str) -> Result<T> {
    let raw = value.ok_or_else(|| EngineError::InvalidProbe(format!("missing {}", field)))?;
    raw.trim()
        .parse::<T>()
        .map_err(|_| EngineError::InvalidProbe(format!("unparseable {}: {:?}", field, raw)))
}

// ffprobe writes "unknown" for untagged streams
fn color_tag(tag: &Option<String>) -> Option<String> {
    tag.as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != "unknown")
        .map(str::to_string)
}
