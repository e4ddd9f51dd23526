//! CIDR-to-timezone-band map: longest-prefix lookup with a direct-mapped
//! negative-caching front end.
//!
//! Load is two-phase (count valid lines, allocate once, fill, sort once) per
//! the design notes — no repeated `Vec` growth while scanning the file.

use std::cell::RefCell;
use std::path::Path;

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy)]
pub struct CidrEntry {
    pub network: u32,
    pub prefix_len: u8,
    pub mask: u32,
    pub tz_offset: i8,
    pub x_start: u32,
    pub x_end: u32,
}

fn mask_for(prefix_len: u8) -> u32 {
    if prefix_len == 0 {
        0
    } else {
        !((1u32 << (32 - prefix_len as u32)) - 1)
    }
}

/// One slot of the 256-entry direct-mapped cache, keyed on `ip & 0xFF`.
/// `result` of `None` is a cached negative match, distinct from the slot
/// simply never having been populated (`populated == false`).
#[derive(Debug, Clone, Copy, Default)]
struct CacheSlot {
    populated: bool,
    ip: u32,
    result: Option<usize>,
}

pub struct CidrMap {
    entries: Vec<CidrEntry>,
    cache: RefCell<[CacheSlot; 256]>,
}

impl CidrMap {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            cache: RefCell::new([CacheSlot::default(); 256]),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CidrEntry] {
        &self.entries
    }

    /// Parse a CIDR map file. Unparseable lines are counted as warnings and
    /// skipped, never fatal. `dimension` bounds `x_end` for the configured
    /// Hilbert order; lines with `x_end > dimension` are treated the same
    /// as any other malformed line.
    pub fn load(path: &Path, dimension: u32) -> Result<(Self, u64)> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::InvalidConfig(format!("cannot read {}: {e}", path.display())))?;

        let mut warnings = 0u64;
        let mut parsed = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(line, dimension) {
                Some(entry) => parsed.push(entry),
                None => {
                    warnings += 1;
                    tracing::warn!(line, "skipping unparseable CIDR map line");
                }
            }
        }

        parsed.sort_by(|a, b| b.prefix_len.cmp(&a.prefix_len).then(a.network.cmp(&b.network)));

        Ok((
            Self {
                entries: parsed,
                cache: RefCell::new([CacheSlot::default(); 256]),
            },
            warnings,
        ))
    }

    /// Longest-prefix match with direct-mapped negative caching.
    pub fn find(&self, ip: u32) -> Option<&CidrEntry> {
        let slot_idx = (ip & 0xFF) as usize;
        {
            let cache = self.cache.borrow();
            let slot = cache[slot_idx];
            if slot.populated && slot.ip == ip {
                return slot.result.map(|i| &self.entries[i]);
            }
        }
        let found = self.entries.iter().position(|e| (ip & e.mask) == e.network);
        self.cache.borrow_mut()[slot_idx] = CacheSlot { populated: true, ip, result: found };
        found.map(|i| &self.entries[i])
    }
}

fn parse_line(line: &str, dimension: u32) -> Option<CidrEntry> {
    let mut fields = line.split_whitespace();
    let net_pfx = fields.next()?;
    let tz: i32 = fields.next()?.parse().ok()?;
    let x_start: u32 = fields.next()?.parse().ok()?;
    let x_end: u32 = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }

    let (net_str, pfx_str) = net_pfx.split_once('/')?;
    let prefix_len: u8 = pfx_str.parse().ok()?;
    if prefix_len > 32 {
        return None;
    }
    let network = parse_dotted_quad(net_str)?;
    if !(-12..=14).contains(&tz) {
        return None;
    }
    if !(x_start < x_end && x_end <= dimension) {
        return None;
    }

    let mask = mask_for(prefix_len);
    let canonical = network & mask;
    if canonical != network {
        return None;
    }

    Some(CidrEntry {
        network,
        prefix_len,
        mask,
        tz_offset: tz as i8,
        x_start,
        x_end,
    })
}

fn parse_dotted_quad(s: &str) -> Option<u32> {
    let mut octets = [0u32; 4];
    let mut parts = s.split('.');
    for octet in octets.iter_mut() {
        let part: u32 = parts.next()?.parse().ok()?;
        if part > 255 {
            return None;
        }
        *octet = part;
    }
    if parts.next().is_some() {
        return None;
    }
    Some((octets[0] << 24) | (octets[1] << 16) | (octets[2] << 8) | octets[3])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_map(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn longest_prefix_wins() {
        let f = write_map(
            "# header\n10.0.0.0/8 -5 0 100\n10.1.0.0/16 1 100 200\n",
        );
        let (map, warnings) = CidrMap::load(f.path(), 4096).unwrap();
        assert_eq!(warnings, 0);

        let ip = parse_dotted_quad("10.1.2.3").unwrap();
        let e = map.find(ip).unwrap();
        assert_eq!(e.prefix_len, 16);

        let ip2 = parse_dotted_quad("10.2.0.0").unwrap();
        let e2 = map.find(ip2).unwrap();
        assert_eq!(e2.prefix_len, 8);
    }

    #[test]
    fn negative_cache_persists() {
        let f = write_map("10.0.0.0/8 -5 0 100\n");
        let (map, _) = CidrMap::load(f.path(), 4096).unwrap();
        let ip = parse_dotted_quad("8.8.8.8").unwrap();
        assert!(map.find(ip).is_none());
        assert!(map.find(ip).is_none());
    }

    #[test]
    fn skips_malformed_lines() {
        let f = write_map("garbage line\n10.0.0.0/8 -5 0 100\nnotanip/8 0 0 1\n");
        let (map, warnings) = CidrMap::load(f.path(), 4096).unwrap();
        assert_eq!(warnings, 2);
        assert_eq!(map.entries().len(), 1);
    }
}
