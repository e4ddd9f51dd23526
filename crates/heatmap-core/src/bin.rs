//! Wall-clock-aligned time bins and the state machine that rotates them.

use crate::decay::{DecayCache, DEFAULT_COMPACT_EVERY_BINS};

/// Epoch-aligned floor: `bin_start(t) = (t / bin_seconds) * bin_seconds`.
pub fn bin_start(t: i64, bin_seconds: u32) -> i64 {
    let bs = bin_seconds as i64;
    (t.div_euclid(bs)) * bs
}

pub struct TimeBin {
    pub bin_start: i64,
    pub bin_end: i64,
    pub dimension: u32,
    pub heatmap: Vec<u32>,
    pub event_count: u64,
    pub unique_cells: u32,
    pub max_intensity: u32,
}

impl TimeBin {
    pub fn new(bin_start_t: i64, bin_seconds: u32, dimension: u32) -> Self {
        Self {
            bin_start: bin_start_t,
            bin_end: bin_start_t + bin_seconds as i64,
            dimension,
            heatmap: vec![0; (dimension as usize) * (dimension as usize)],
            event_count: 0,
            unique_cells: 0,
            max_intensity: 0,
        }
    }

    fn record(&mut self, x: u32, y: u32) {
        let idx = (y * self.dimension + x) as usize;
        self.heatmap[idx] += 1;
        self.event_count += 1;
        self.max_intensity = self.max_intensity.max(self.heatmap[idx]);
    }

    fn finalize(&mut self) {
        self.unique_cells = self.heatmap.iter().filter(|&&v| v > 0).count() as u32;
    }
}

/// Owns the at-most-one live bin plus the decay cache it overlays onto
/// retiring bins. `residue_map` lives alongside in [`crate::pipeline::Pipeline`]
/// because it is a cross-cutting cache shared with the compositor, not
/// something the bin lifecycle itself needs to see.
pub struct TimeBinManager {
    bin_seconds: u32,
    decay_seconds: u32,
    dimension: u32,
    compact_every_bins: u32,
    current_bin: Option<TimeBin>,
    pub decay_cache: DecayCache,
    pub total_bins: u64,
    pub bins_written: u64,
}

impl TimeBinManager {
    pub fn new(bin_seconds: u32, decay_seconds: u32, dimension: u32) -> Self {
        Self {
            bin_seconds,
            decay_seconds,
            dimension,
            compact_every_bins: DEFAULT_COMPACT_EVERY_BINS,
            current_bin: None,
            decay_cache: DecayCache::new(),
            total_bins: 0,
            bins_written: 0,
        }
    }

    /// Route one event to the correct bin, rotating the current bin (with
    /// decay overlay applied) if its alignment window has passed. Returns
    /// the just-retired, fully finalized bin when a rotation happens.
    pub fn process(&mut self, t: i64, x: u32, y: u32) -> Option<TimeBin> {
        let target_start = bin_start(t, self.bin_seconds);

        let retired = if self.current_bin.as_ref().map(|b| b.bin_start) != Some(target_start) {
            let retired = self.rotate(target_start);
            self.total_bins += 1;
            retired
        } else {
            None
        };

        self.decay_cache.update(x, y, t, 1);

        let bin = self.current_bin.as_mut().expect("just allocated");
        bin.record(x, y);

        retired
    }

    fn rotate(&mut self, new_start: i64) -> Option<TimeBin> {
        let retired = self.current_bin.take().map(|mut bin| {
            self.decay_cache.overlay(&mut bin, self.decay_seconds);
            bin.finalize();
            self.bins_written += 1;
            if self.bins_written % self.compact_every_bins as u64 == 0 {
                self.decay_cache.compact(bin.bin_start, self.decay_seconds as i64);
            }
            bin
        });
        self.current_bin = Some(TimeBin::new(new_start, self.bin_seconds, self.dimension));
        retired
    }

    /// End-of-stream: finalize and return the last live bin, if any.
    pub fn finalize_at_end(&mut self) -> Option<TimeBin> {
        self.current_bin.take().map(|mut bin| {
            self.decay_cache.overlay(&mut bin, self.decay_seconds);
            bin.finalize();
            self.bins_written += 1;
            bin
        })
    }
}

/// Transport protocol of an ingested event. `u8` discriminants match the
/// IANA-assigned protocol numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Icmp = 1,
    Tcp = 6,
    Udp = 17,
}

/// One parsed log record, as handed to the pipeline by an external parser.
/// `timestamp_micros` and the port/protocol fields are informational — bin
/// assignment only consults `timestamp_seconds` and `src_ip`.
#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub timestamp_seconds: i64,
    pub timestamp_micros: u32,
    pub src_ip: u32,
    pub dst_ip: u32,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: Protocol,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_just_past_boundary_rotates_bin() {
        assert_eq!(bin_start(1_700_000_059, 60), 1_700_000_040);
        assert_eq!(bin_start(1_700_000_060, 60), 1_700_000_060);
    }

    #[test]
    fn bin_alignment_invariant() {
        for t in [0i64, 1, 59, 60, 61, 1_700_000_059, 1_700_000_060] {
            let bs = bin_start(t, 60);
            assert_eq!(bs % 60, 0);
            assert!(t - bs >= 0 && t - bs < 60);
        }
    }

    #[test]
    fn rotation_emits_two_bins() {
        let mut mgr = TimeBinManager::new(60, 3_600, 16);
        let r1 = mgr.process(1_700_000_059, 0, 0);
        assert!(r1.is_none());
        let r2 = mgr.process(1_700_000_060, 0, 0);
        let retired = r2.expect("rotation should retire the first bin");
        assert_eq!(retired.bin_start, 1_700_000_040);
        assert_eq!(retired.event_count, 1);
        assert_eq!(mgr.total_bins, 2);
    }

    #[test]
    fn event_conservation_before_decay() {
        let mut mgr = TimeBinManager::new(60, 3_600, 16);
        mgr.process(0, 1, 1);
        mgr.process(0, 1, 1);
        mgr.process(0, 2, 2);
        let retired = mgr.process(60, 0, 0).unwrap();
        assert_eq!(retired.event_count, 3);
        assert_eq!(retired.unique_cells, 2);
    }
}
