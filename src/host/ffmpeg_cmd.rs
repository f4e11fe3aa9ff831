// FFmpeg invocations for an encode plan (printed by dry-run and `plan`)

use std::path::{Path, PathBuf};
use std::process::Command;
use uuid::Uuid;

use crate::engine::{EncodePlan, EncoderFamily, HdrPassthrough};

/// NVENC preset used for every HEVC NVENC plan (p1 fastest .. p7 slowest)
const NVENC_PRESET: &str = "p6";

/// Build the FFmpeg command(s) that execute `plan`.
///
/// Returns one command, or two for a software two-pass plan (analysis pass
/// first). `stats_prefix` is where x265 keeps its first-pass statistics.
pub fn build_ffmpeg_cmds(
    plan: &EncodePlan,
    input: &Path,
    output: &Path,
    stats_prefix: &Path,
) -> Vec<Command> {
    let family = plan.encoder.family;

    if plan.two_pass && family == EncoderFamily::SoftwareX265 {
        let stats = format!("{}.log", stats_prefix.display());

        let mut first = base_cmd(family, input);
        apply_video_args(&mut first, plan);
        first
            .arg("-x265-params")
            .arg(format!("pass=1:stats={}", stats))
            .args(["-an", "-sn", "-f", "null"])
            .arg(null_output_target());

        let mut second = base_cmd(family, input);
        apply_video_args(&mut second, plan);
        second
            .arg("-x265-params")
            .arg(format!("pass=2:stats={}", stats));
        apply_output_args(&mut second, plan, output);

        return vec![first, second];
    }

    let mut cmd = base_cmd(family, input);
    apply_video_args(&mut cmd, plan);
    if plan.two_pass && family == EncoderFamily::NvencHevc {
        // NVENC runs both passes inside one invocation
        cmd.args(["-multipass", "fullres"]);
    }
    apply_output_args(&mut cmd, plan, output);
    vec![cmd]
}

fn base_cmd(family: EncoderFamily, input: &Path) -> Command {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-hide_banner", "-y"]);
    match family {
        EncoderFamily::NvencHevc => {
            cmd.args(["-hwaccel", "cuda", "-hwaccel_output_format", "cuda"]);
        }
        EncoderFamily::QsvHevc => {
            cmd.args(["-hwaccel", "qsv"]);
        }
        EncoderFamily::SoftwareX265 => {}
    }
    cmd.arg("-i").arg(input);
    cmd
}

fn apply_video_args(cmd: &mut Command, plan: &EncodePlan) {
    let family = plan.encoder.family;
    let quality = plan.quality_param.to_string();

    cmd.arg("-c:v").arg(family.ffmpeg_name());
    match family {
        EncoderFamily::NvencHevc => {
            cmd.args(["-preset", NVENC_PRESET])
                .arg("-cq")
                .arg(&quality)
                .args(["-profile:v", "main10"]);
        }
        EncoderFamily::QsvHevc => {
            cmd.arg("-preset")
                .arg(plan.speed_preset.as_str())
                .arg("-global_quality")
                .arg(&quality);
        }
        EncoderFamily::SoftwareX265 => {
            cmd.arg("-preset")
                .arg(plan.speed_preset.as_str())
                .arg("-crf")
                .arg(&quality)
                .args(["-profile:v", "main10"]);
        }
    }

    if let Some(hdr) = &plan.hdr_passthrough {
        apply_color_metadata(cmd, hdr);
    }
}

fn apply_color_metadata(cmd: &mut Command, hdr: &HdrPassthrough) {
    cmd.arg("-color_primaries")
        .arg(&hdr.primaries)
        .arg("-color_trc")
        .arg(&hdr.transfer)
        .arg("-colorspace")
        .arg(&hdr.space);
}

fn apply_output_args(cmd: &mut Command, plan: &EncodePlan, output: &Path) {
    cmd.args(["-map", "0"]);
    if plan.copy_audio {
        cmd.args(["-c:a", "copy"]);
    }
    if plan.copy_subtitles {
        cmd.args(["-c:s", "copy"]);
    }
    if supports_faststart(&plan.container) {
        cmd.args(["-movflags", "+faststart"]);
    }
    cmd.args(["-avoid_negative_ts", "make_zero"]);
    cmd.arg(output);
}

fn supports_faststart(container: &str) -> bool {
    matches!(
        container.to_ascii_lowercase().as_str(),
        "mp4" | "mov" | "m4v"
    )
}

fn null_output_target() -> &'static str {
    if cfg!(windows) { "NUL" } else { "/dev/null" }
}

/// Per-run location for x265 first-pass statistics
pub fn two_pass_log_prefix(run_id: Uuid) -> PathBuf {
    std::env::temp_dir()
        .join("ffgate_2pass")
        .join(run_id.to_string())
        .join("x265")
}

/// `<dir>/<stem>.hevc.<container>` next to the input
pub fn derive_output_path(input: &Path, container: &str) -> PathBuf {
    let dir = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let container = container.trim_start_matches('.');
    dir.join(format!("{}.hevc.{}", stem, container))
}

/// Render commands as a shell snippet, one command per line
pub fn format_ffmpeg_cmds(cmds: &[Command]) -> String {
    cmds.iter()
        .map(|cmd| {
            std::iter::once(cmd.get_program())
                .chain(cmd.get_args())
                .map(|arg| {
                    let s = arg.to_string_lossy();
                    // Only fails on NUL bytes, which ffmpeg can't take anyway
                    shlex::try_quote(&s)
                        .map(|quoted| quoted.into_owned())
                        .unwrap_or_else(|_| s.to_string())
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join(" \\\n&& ")
}
