// Input probing using ffprobe

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

use crate::engine::RawProbe;

/// Run ffprobe on a file and return its stream/format data.
///
/// When ffprobe omits the container size, it is filled in from the filesystem.
pub fn probe_file(input_path: &Path) -> Result<RawProbe> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(input_path)
        .output()
        .context("Failed to run ffprobe. Is ffprobe installed and in PATH?")?;

    if !output.status.success() {
        anyhow::bail!(
            "ffprobe failed on {}: {}",
            input_path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    let mut raw = RawProbe::from_json(&json_str)
        .with_context(|| format!("Failed to parse ffprobe JSON for {}", input_path.display()))?;

    if raw.format.size.is_none() {
        let len = std::fs::metadata(input_path)
            .with_context(|| format!("Failed to stat {}", input_path.display()))?
            .len();
        raw.format.size = Some(len.to_string());
    }

    Ok(raw)
}

/// First line of `ffprobe -version`
pub fn ffprobe_version() -> Result<String> {
    let output = Command::new("ffprobe")
        .arg("-version")
        .output()
        .context("Failed to execute ffprobe. Is ffprobe installed and in PATH?")?;

    if !output.status.success() {
        anyhow::bail!("ffprobe command failed with status: {}", output.status);
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    Ok(version_output
        .lines()
        .next()
        .unwrap_or("Unknown version")
        .to_string())
}
