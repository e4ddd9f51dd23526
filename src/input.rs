//! Transparent gzip/plain input detection by magic bytes.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Open `path` for line-oriented reading, transparently decompressing it if
/// it starts with the gzip magic bytes. One unreadable file is an error the
/// caller should log and skip, continuing on to the next input.
pub fn open_lines(path: &Path) -> Result<Box<dyn BufRead>> {
    let mut probe = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut magic = [0u8; 2];
    let read = probe.read(&mut magic).unwrap_or(0);

    let file = File::open(path).with_context(|| format!("reopening {}", path.display()))?;
    if read == 2 && magic == GZIP_MAGIC {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn detects_plain_text() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "1700000059 10.0.0.1:1 -> 10.0.0.2:2 TCP").unwrap();
        let mut lines = open_lines(f.path()).unwrap();
        let mut buf = String::new();
        lines.read_line(&mut buf).unwrap();
        assert!(buf.starts_with("1700000059"));
    }

    #[test]
    fn detects_gzip() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut f = tempfile::NamedTempFile::new().unwrap();
        let mut enc = GzEncoder::new(&mut f, Compression::default());
        enc.write_all(b"1700000059 10.0.0.1:1 -> 10.0.0.2:2 TCP\n").unwrap();
        enc.finish().unwrap();

        let mut lines = open_lines(f.path()).unwrap();
        let mut buf = String::new();
        lines.read_line(&mut buf).unwrap();
        assert!(buf.starts_with("1700000059"));
    }
}
