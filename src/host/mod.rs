// Host-side collaborators: ffprobe, hardware detection, ffmpeg command lines

pub mod ffmpeg_cmd;
pub mod ffprobe;
pub mod hardware;
pub mod scan;

pub use ffmpeg_cmd::{
    build_ffmpeg_cmds, derive_output_path, format_ffmpeg_cmds, two_pass_log_prefix,
};
pub use ffprobe::probe_file;
pub use hardware::{HwMode, SystemCapabilities, capabilities_for};
