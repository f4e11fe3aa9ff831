#![allow(dead_code)] // Each test binary uses a different subset

use ffgate::engine::{MediaProbe, RawProbe};
use std::process::Command;

/// Convert a Command to a string for assertions
pub fn cmd_to_string(cmd: &Command) -> String {
    let program = cmd.get_program().to_string_lossy();
    let args: Vec<String> = cmd
        .get_args()
        .map(|arg| arg.to_string_lossy().to_string())
        .collect();

    format!("{} {}", program, args.join(" "))
}

/// Analyzed probe for a video file with no color tags
pub fn video_probe(codec: &str, width: u32, height: u32, duration: f64, size: u64) -> MediaProbe {
    MediaProbe {
        has_video: true,
        codec: codec.to_string(),
        width,
        height,
        duration_seconds: duration,
        file_size_bytes: size,
        color_primaries: None,
        color_transfer: None,
        color_space: None,
    }
}

/// The canonical one-hour 1080p H.264 source, 4 GB
pub fn hour_of_1080p() -> MediaProbe {
    video_probe("h264", 1920, 1080, 3600.0, 4_000_000_000)
}

/// ffprobe-style JSON with one video stream and one audio stream
pub fn ffprobe_json(codec: &str, width: u32, height: u32, duration: &str, size: &str) -> String {
    format!(
        r#"{{
  "streams": [
    {{
      "index": 0,
      "codec_name": "{codec}",
      "codec_type": "video",
      "width": {width},
      "height": {height},
      "pix_fmt": "yuv420p"
    }},
    {{
      "index": 1,
      "codec_name": "aac",
      "codec_type": "audio",
      "channels": 2
    }}
  ],
  "format": {{
    "filename": "input.mkv",
    "duration": "{duration}",
    "size": "{size}",
    "bit_rate": "8888888"
  }}
}}"#
    )
}

pub fn raw_probe(codec: &str, width: u32, height: u32, duration: &str, size: &str) -> RawProbe {
    RawProbe::from_json(&ffprobe_json(codec, width, height, duration, size))
        .expect("fixture JSON parses")
}
