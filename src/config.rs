//! `threatplot.toml` run configuration.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level run configuration. CLI flags (handled by the caller) take
/// precedence over values loaded here; these are the floor.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// Bin width. Accepts `<n>[s|m|h]` (case-insensitive suffix) or a bare
    /// integer, which is interpreted as seconds.
    #[serde(default = "RunConfig::default_bin_seconds")]
    pub bin_seconds: String,

    #[serde(default = "RunConfig::default_hilbert_order")]
    pub hilbert_order: u8,

    #[serde(default = "RunConfig::default_decay_seconds")]
    pub decay_seconds: u32,

    #[serde(default = "RunConfig::default_viz_width")]
    pub viz_width: u32,

    #[serde(default = "RunConfig::default_viz_height")]
    pub viz_height: u32,

    #[serde(default = "RunConfig::default_target_video_duration")]
    pub target_video_duration: u32,

    #[serde(default = "RunConfig::default_auto_scale")]
    pub auto_scale: bool,

    #[serde(default)]
    pub show_timestamp: bool,

    /// Optional CIDR map file. If absent or unreadable, the mapper falls
    /// back to lossless Hilbert scaling with a warning, never a fatal error.
    #[serde(default)]
    pub cidr_map_path: Option<PathBuf>,

    /// Input log files, plain or gzip-compressed. Driver-only, not part of
    /// the core's enumerated options.
    #[serde(default)]
    pub inputs: Vec<PathBuf>,

    #[serde(default = "RunConfig::default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "RunConfig::default_output_prefix")]
    pub output_prefix: String,

    /// When set, `ffmpeg` is invoked against the written frame sequence
    /// after the run finishes. Its failure is a warning, never a run failure.
    #[serde(default)]
    pub video_path: Option<PathBuf>,

    #[serde(default = "RunConfig::default_ffmpeg_path")]
    pub ffmpeg_path: String,
}

impl RunConfig {
    fn default_bin_seconds() -> String { "60".into() }
    fn default_hilbert_order() -> u8 { 12 }
    fn default_decay_seconds() -> u32 { 10_800 }
    fn default_viz_width() -> u32 { 3_440 }
    fn default_viz_height() -> u32 { 1_440 }
    fn default_target_video_duration() -> u32 { 300 }
    fn default_auto_scale() -> bool { true }
    fn default_output_dir() -> PathBuf { PathBuf::from("./frames") }
    fn default_output_prefix() -> String { "frame".into() }
    fn default_ffmpeg_path() -> String { "ffmpeg".into() }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let cfg: Self = toml::from_str(&text)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let _ = self.bin_seconds_value()?;
        if !(4..=16).contains(&self.hilbert_order) {
            bail!("hilbert_order must be in [4, 16], got {}", self.hilbert_order);
        }
        if self.decay_seconds == 0 {
            bail!("decay_seconds must be positive");
        }
        if self.viz_width == 0 || self.viz_height == 0 {
            bail!("viz_width/viz_height must be positive");
        }
        if !(10..=3_600).contains(&self.target_video_duration) {
            bail!("target_video_duration must be in [10, 3600], got {}", self.target_video_duration);
        }
        Ok(())
    }

    pub fn bin_seconds_value(&self) -> Result<u32> {
        parse_duration_secs(&self.bin_seconds)
    }

    pub fn default_example() -> Self {
        Self {
            bin_seconds: Self::default_bin_seconds(),
            hilbert_order: Self::default_hilbert_order(),
            decay_seconds: Self::default_decay_seconds(),
            viz_width: Self::default_viz_width(),
            viz_height: Self::default_viz_height(),
            target_video_duration: Self::default_target_video_duration(),
            auto_scale: Self::default_auto_scale(),
            show_timestamp: false,
            cidr_map_path: Some(PathBuf::from("cidr_map.txt")),
            inputs: vec![PathBuf::from("honeypot.log.gz")],
            output_dir: Self::default_output_dir(),
            output_prefix: Self::default_output_prefix(),
            video_path: Some(PathBuf::from("attack_heatmap.mp4")),
            ffmpeg_path: Self::default_ffmpeg_path(),
        }
    }
}

/// Parse `<n>[s|m|h]` (bare integer = seconds) into a second count.
pub fn parse_duration_secs(s: &str) -> Result<u32> {
    let s = s.trim();
    if s.is_empty() {
        bail!("empty duration string");
    }
    if let Ok(n) = s.parse::<u32>() {
        return Ok(n);
    }
    let (num_part, suffix) = s.split_at(s.len() - 1);
    let mult: u32 = match suffix.to_ascii_lowercase().as_str() {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        other => bail!("invalid duration suffix '{other}' in '{s}': expected s, m, or h"),
    };
    let n: u32 = num_part
        .parse()
        .with_context(|| format!("invalid duration '{s}'"))?;
    Ok(n * mult)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_integer_as_seconds() {
        assert_eq!(parse_duration_secs("60").unwrap(), 60);
    }

    #[test]
    fn parses_suffixed_durations() {
        assert_eq!(parse_duration_secs("90s").unwrap(), 90);
        assert_eq!(parse_duration_secs("5m").unwrap(), 300);
        assert_eq!(parse_duration_secs("2H").unwrap(), 7_200);
    }

    #[test]
    fn rejects_bad_suffix() {
        assert!(parse_duration_secs("5x").is_err());
    }

    #[test]
    fn default_example_validates() {
        RunConfig::default_example().validate().unwrap();
    }
}
