//! `Pipeline` is the single value a driver constructs and owns for the
//! lifetime of a run — no singletons, no process-wide statics. It holds the
//! immutable `CoreConfig`, the read-only `CidrMap`/`NonRoutableMask`, and the
//! mutable bin/decay/residue state.

use crate::bin::{Event, TimeBin, TimeBinManager};
use crate::cidr::CidrMap;
use crate::coord::to_coord;
use crate::decay::ResidueMap;
use crate::error::Result;
use crate::governor::{autoscale, GovernorResult};
use crate::hilbert::{dimension, validate_order};
use crate::mask::NonRoutableMask;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub hilbert_order: u8,
    pub bin_seconds: u32,
    pub decay_seconds: u32,
    pub auto_scale: bool,
}

impl CoreConfig {
    pub fn validate(&self) -> Result<()> {
        validate_order(self.hilbert_order)?;
        if self.bin_seconds == 0 {
            return Err(crate::error::CoreError::InvalidConfig("bin_seconds must be positive".into()));
        }
        if self.decay_seconds == 0 {
            return Err(crate::error::CoreError::InvalidConfig("decay_seconds must be positive".into()));
        }
        Ok(())
    }
}

pub struct Pipeline {
    config: CoreConfig,
    cidr_map: Option<CidrMap>,
    mask: NonRoutableMask,
    mgr: TimeBinManager,
    residue: ResidueMap,
    pub parse_warnings: u64,
    pub ordering_warnings: u64,
    first_seen: Option<i64>,
    last_seen: Option<i64>,
}

impl Pipeline {
    pub fn new(config: CoreConfig, cidr_map: Option<CidrMap>) -> Result<Self> {
        Self::new_with_warnings(config, cidr_map, 0)
    }

    /// Same as [`Self::new`], but seeds `parse_warnings` with a count the
    /// driver already accumulated loading the CIDR map — unparseable CIDR
    /// lines are counted rather than fatal.
    pub fn new_with_warnings(config: CoreConfig, cidr_map: Option<CidrMap>, cidr_parse_warnings: u64) -> Result<Self> {
        config.validate()?;
        let n = dimension(config.hilbert_order);
        let mask = NonRoutableMask::build(config.hilbert_order, cidr_map.as_ref())?;
        let mgr = TimeBinManager::new(config.bin_seconds, config.decay_seconds, n);
        let residue = ResidueMap::new(n);
        Ok(Self {
            config,
            cidr_map,
            mask,
            mgr,
            residue,
            parse_warnings: cidr_parse_warnings,
            ordering_warnings: 0,
            first_seen: None,
            last_seen: None,
        })
    }

    pub fn mask(&self) -> &NonRoutableMask {
        &self.mask
    }

    pub fn residue(&self) -> &ResidueMap {
        &self.residue
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn total_bins(&self) -> u64 {
        self.mgr.total_bins
    }

    pub fn bins_written(&self) -> u64 {
        self.mgr.bins_written
    }

    /// Process one event. Returns the bin retired by this event's arrival,
    /// if the bin window rotated. Out-of-range mapped coordinates (a
    /// programming error elsewhere, never expected in practice) silently
    /// drop the event.
    pub fn process_event(&mut self, event: &Event) -> Result<Option<TimeBin>> {
        let t = event.timestamp_seconds;

        if let Some(last) = self.last_seen {
            if t < last {
                self.ordering_warnings += 1;
            }
        }
        self.first_seen = Some(self.first_seen.map_or(t, |f| f.min(t)));
        self.last_seen = Some(self.last_seen.map_or(t, |l| l.max(t)));

        let (x, y) = to_coord(event.src_ip, self.config.hilbert_order, self.cidr_map.as_ref())?;
        let n = dimension(self.config.hilbert_order);
        if x >= n || y >= n {
            return Ok(None);
        }

        self.residue.mark(x, y);
        Ok(self.mgr.process(t, x, y))
    }

    /// End-of-stream: finalize and return the last live bin, if any.
    pub fn finalize(&mut self) -> Option<TimeBin> {
        self.mgr.finalize_at_end()
    }

    pub fn governor_result(&self) -> Option<GovernorResult> {
        let (first, last) = (self.first_seen?, self.last_seen?);
        autoscale(first, last, self.config.auto_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bin::Protocol;

    fn event(t: i64, ip: u32) -> Event {
        Event {
            timestamp_seconds: t,
            timestamp_micros: 0,
            src_ip: ip,
            dst_ip: 0,
            src_port: 0,
            dst_port: 0,
            protocol: Protocol::Tcp,
        }
    }

    fn config() -> CoreConfig {
        CoreConfig { hilbert_order: 6, bin_seconds: 60, decay_seconds: 3_600, auto_scale: true }
    }

    #[test]
    fn tracks_ordering_warnings() {
        let mut p = Pipeline::new(config(), None).unwrap();
        p.process_event(&event(100, 0x0101_0101)).unwrap();
        p.process_event(&event(50, 0x0101_0101)).unwrap();
        assert_eq!(p.ordering_warnings, 1);
    }

    #[test]
    fn residue_monotonic_across_bins() {
        let mut p = Pipeline::new(config(), None).unwrap();
        p.process_event(&event(0, 0x0101_0101)).unwrap();
        let before = p.residue().residue_count;
        p.process_event(&event(120, 0x0101_0101)).unwrap();
        assert!(p.residue().residue_count >= before);
    }

    #[test]
    fn governor_none_until_span_observed() {
        let mut p = Pipeline::new(config(), None).unwrap();
        assert!(p.governor_result().is_none());
        p.process_event(&event(0, 1)).unwrap();
        p.process_event(&event(86_400, 2)).unwrap();
        let gov = p.governor_result().unwrap();
        assert_eq!(gov.fps, 3);
    }

    #[test]
    fn finalize_emits_last_bin() {
        let mut p = Pipeline::new(config(), None).unwrap();
        p.process_event(&event(0, 1)).unwrap();
        assert!(p.finalize().is_some());
        assert!(p.finalize().is_none());
    }
}
