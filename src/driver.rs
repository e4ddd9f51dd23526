//! Ties log parsing, gzip/plain input, the core pipeline, PPM output, and
//! the advisory video encode step together — the surrounding plumbing that
//! `heatmap-core` itself stays free of.

use anyhow::{Context, Result};
use heatmap_core::{compositor, hilbert, CidrMap, CoreConfig, Pipeline, TimeBin};
use std::path::{Path, PathBuf};

use crate::config::RunConfig;
use crate::{input, log_parser, ppm, signals, video};

/// Fallback FPS floor used when neither auto-scale nor the frame count /
/// `target_video_duration` ratio yields anything usable (e.g. zero frames
/// written) and a video encode was still requested.
const FALLBACK_FPS: u32 = 30;

pub fn run(cfg: &RunConfig, inputs_override: &[PathBuf], output_dir_override: Option<&Path>) -> Result<()> {
    let inputs: Vec<PathBuf> = if inputs_override.is_empty() {
        cfg.inputs.clone()
    } else {
        inputs_override.to_vec()
    };
    if inputs.is_empty() {
        anyhow::bail!("no input files given (pass them on the command line or set `inputs` in the config)");
    }

    let output_dir = output_dir_override.map(Path::to_path_buf).unwrap_or_else(|| cfg.output_dir.clone());
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating output dir {}", output_dir.display()))?;

    let bin_seconds = cfg.bin_seconds_value()?;
    let k = cfg.hilbert_order;

    let (cidr_map, cidr_warnings) = load_cidr_map(cfg, k);

    let core_cfg = CoreConfig {
        hilbert_order: k,
        bin_seconds,
        decay_seconds: cfg.decay_seconds,
        auto_scale: cfg.auto_scale,
    };
    let mut pipeline = Pipeline::new_with_warnings(core_cfg, cidr_map, cidr_warnings)
        .map_err(|e| anyhow::anyhow!("failed to initialize pipeline: {e}"))?;

    signals::install();

    let mut seq = 0u32;
    let mut parse_failures = 0u64;
    let mut events_processed = 0u64;
    let mut quit_requested = false;

    'inputs: for input_path in &inputs {
        let reader = match input::open_lines(input_path) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, path = %input_path.display(), "cannot open input, skipping file");
                continue;
            }
        };

        use std::io::BufRead;
        for line in reader.lines() {
            if !signals::should_continue() {
                tracing::info!("quit requested, discarding in-progress bin");
                quit_requested = true;
                break 'inputs;
            }
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    tracing::warn!(error = %e, "error reading line, skipping");
                    continue;
                }
            };

            match log_parser::parse_line(&line) {
                Some(event) => {
                    events_processed += 1;
                    match pipeline.process_event(&event) {
                        Ok(Some(retired)) => emit_frame(cfg, &pipeline, &retired, &output_dir, &mut seq)?,
                        Ok(None) => {}
                        Err(e) => return Err(anyhow::anyhow!("fatal pipeline error: {e}")),
                    }
                }
                None => parse_failures += 1,
            }
        }
    }

    if !quit_requested {
        if let Some(last) = pipeline.finalize() {
            emit_frame(cfg, &pipeline, &last, &output_dir, &mut seq)?;
        }
    }

    tracing::info!(
        events_processed,
        parse_failures,
        cidr_parse_warnings = pipeline.parse_warnings,
        ordering_warnings = pipeline.ordering_warnings,
        frames_written = seq,
        "render complete"
    );

    if let Some(video_path) = &cfg.video_path {
        let fps = pipeline
            .governor_result()
            .map(|g| g.fps)
            .unwrap_or_else(|| fps_for_target_duration(seq, cfg.target_video_duration));
        let glob = output_dir.join(format!("{}_*.ppm", cfg.output_prefix));
        video::encode(&cfg.ffmpeg_path, &glob.to_string_lossy(), fps, video_path);
    }

    Ok(())
}

fn load_cidr_map(cfg: &RunConfig, k: u8) -> (Option<CidrMap>, u64) {
    let Some(path) = cfg.cidr_map_path.as_ref() else {
        return (None, 0);
    };
    match CidrMap::load(path, hilbert::dimension(k)) {
        Ok((map, warnings)) => {
            if warnings > 0 {
                tracing::warn!(warnings, path = %path.display(), "CIDR map had unparseable lines");
            }
            (Some(map), warnings)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "failed to load CIDR map, falling back to lossless Hilbert scaling"
            );
            (None, 0)
        }
    }
}

fn emit_frame(cfg: &RunConfig, pipeline: &Pipeline, bin: &TimeBin, output_dir: &Path, seq: &mut u32) -> Result<()> {
    let label = cfg.show_timestamp.then(|| format_timestamp(bin.bin_start));
    let frame = compositor::compose(
        bin,
        pipeline.residue(),
        pipeline.mask(),
        cfg.viz_width,
        cfg.viz_height,
        label.as_deref(),
    );
    let path = ppm::frame_filename(output_dir, &cfg.output_prefix, bin.bin_start, *seq);
    ppm::write_ppm(&frame, &path)?;
    *seq += 1;
    Ok(())
}

/// When auto-scale is off (or never had a span to work from), fit the
/// written frame sequence into `target_video_duration` seconds instead of
/// falling straight back to a fixed FPS — the configured target duration
/// should still shape playback speed even without auto-scale.
fn fps_for_target_duration(frames_written: u32, target_video_duration: u32) -> u32 {
    if frames_written == 0 || target_video_duration == 0 {
        return FALLBACK_FPS;
    }
    ((frames_written as f64 / target_video_duration as f64).round() as u32).clamp(1, 120)
}

fn format_timestamp(epoch: i64) -> String {
    use chrono::{Local, TimeZone};
    Local
        .timestamp_opt(epoch, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_frame_count_to_target_duration() {
        assert_eq!(fps_for_target_duration(300, 300), 1);
        assert_eq!(fps_for_target_duration(3_000, 300), 10);
    }

    #[test]
    fn falls_back_on_degenerate_input() {
        assert_eq!(fps_for_target_duration(0, 300), FALLBACK_FPS);
        assert_eq!(fps_for_target_duration(100, 0), FALLBACK_FPS);
    }

    #[test]
    fn clamps_to_valid_fps_range() {
        assert_eq!(fps_for_target_duration(10_000, 10), 120);
        assert_eq!(fps_for_target_duration(1, 10_000), 1);
    }
}
