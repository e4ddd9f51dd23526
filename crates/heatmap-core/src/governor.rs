//! Auto-scale governor: derives playback FPS and the decay window from the
//! observed time span of a run. Baseline is "1 day -> 3 FPS, 3h decay".

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernorResult {
    pub fps: u32,
    pub decay_seconds: u32,
}

pub fn autoscale(first_seen: i64, last_seen: i64, enabled: bool) -> Option<GovernorResult> {
    if !enabled {
        return None;
    }
    let span_secs = last_seen - first_seen;
    if span_secs <= 0 {
        return None;
    }
    let span_days = span_secs as f64 / 86_400.0;

    let fps = (3.0 * span_days).round().clamp(1.0, 120.0) as u32;
    let decay_seconds = (3.0 * span_days * 3_600.0).floor().max(3_600.0) as u32;

    Some(GovernorResult { fps, decay_seconds })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_day_baseline() {
        let r = autoscale(0, 86_400, true).unwrap();
        assert_eq!(r.fps, 3);
        assert_eq!(r.decay_seconds, 10_800);
    }

    #[test]
    fn disabled_or_zero_span_yields_none() {
        assert!(autoscale(0, 86_400, false).is_none());
        assert!(autoscale(100, 100, true).is_none());
    }

    #[test]
    fn fps_is_clamped() {
        let r = autoscale(0, 86_400 * 1000, true).unwrap();
        assert_eq!(r.fps, 120);
    }
}
