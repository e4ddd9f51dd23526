//! Advisory `ffmpeg` invocation over the written PPM frame sequence.
//! Non-zero exit or spawn failure is a warning, never a run failure; frame
//! files are retained regardless.

use std::path::Path;
use std::process::Command;

pub fn encode(ffmpeg_path: &str, frame_glob_pattern: &str, fps: u32, output: &Path) {
    let status = Command::new(ffmpeg_path)
        .args([
            "-y",
            "-framerate",
            &fps.to_string(),
            "-pattern_type",
            "glob",
            "-i",
            frame_glob_pattern,
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
        ])
        .arg(output)
        .status();

    match status {
        Ok(s) if s.success() => {
            tracing::info!(path = %output.display(), fps, "video encoded");
        }
        Ok(s) => {
            tracing::warn!(code = ?s.code(), "ffmpeg exited non-zero; PPM frames retained");
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to spawn ffmpeg; PPM frames retained");
        }
    }
}
