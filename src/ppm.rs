//! PPM (P6) frame writer and the `<dir>/<prefix>_<YYYYMMDD_HHMMSS>_<NNNN>.ppm`
//! filename convention.

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use heatmap_core::Frame;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn write_ppm(frame: &Frame, path: &Path) -> Result<()> {
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write!(f, "P6\n{} {}\n255\n", frame.width, frame.height)?;
    f.write_all(&frame.pixels)?;
    Ok(())
}

/// `bin_start` is the Unix epoch seconds of the bin this frame renders;
/// the filename records it in local time.
pub fn frame_filename(dir: &Path, prefix: &str, bin_start: i64, seq: u32) -> PathBuf {
    let dt = Local
        .timestamp_opt(bin_start, 0)
        .single()
        .unwrap_or_else(|| Local.timestamp_opt(0, 0).single().expect("epoch 0 is always valid"));
    dir.join(format!("{prefix}_{}_{seq:04}.ppm", dt.format("%Y%m%d_%H%M%S")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ppm_header_is_well_formed_p6() {
        let frame = Frame { width: 2, height: 1, pixels: vec![255, 0, 0, 0, 255, 0] };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ppm");
        write_ppm(&frame, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"P6\n2 1\n255\n"));
        assert_eq!(bytes.len(), "P6\n2 1\n255\n".len() + 6);
    }

    #[test]
    fn filename_has_zero_padded_sequence() {
        let dir = PathBuf::from("/tmp/frames");
        let name = frame_filename(&dir, "frame", 1_700_000_040, 7);
        assert!(name.to_string_lossy().ends_with("_0007.ppm"));
    }
}
