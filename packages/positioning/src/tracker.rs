//! tracker.rs — per-anchor RSSI filter and liveness
//!
//! Each anchor is INACTIVE or ACTIVE.
//!
//! - Accepted reading while inactive or still warming up (`packet_count` below
//!   the warm-up count): the filtered value is overwritten with the raw
//!   reading, so the sentinel never drags the estimate.
//! - Accepted reading once warmed up: `filtered = α·raw + (1-α)·filtered`.
//! - Periodic sweep: an active anchor silent for the staleness threshold goes
//!   inactive. Filter history and packet count survive the timeout unless
//!   `reset_on_timeout` is set.

use anchor_types::AnchorReading;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::FilterConfig;

/// Every Nth accepted packet of an anchor is logged.
const DEBUG_EVERY_PACKETS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnchorState {
    /// Smoothed RSSI in dBm
    pub filtered_rssi: f64,
    pub active: bool,
    pub last_update_ms: u64,
    pub last_sequence: u32,
    /// Accepted packets since startup (or since the last reset)
    pub packet_count: u32,
}

impl AnchorState {
    fn new(initial_rssi: f64) -> Self {
        Self {
            filtered_rssi: initial_rssi,
            active: false,
            last_update_ms: 0,
            last_sequence: 0,
            packet_count: 0,
        }
    }

    pub fn silent_for_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_update_ms)
    }
}

/// Emitted by the sweep for every ACTIVE → INACTIVE transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnchorTimeout {
    pub anchor_id: u8,
    pub silent_ms: u64,
}

#[derive(Debug, Clone)]
pub struct AnchorTracker {
    anchors: Vec<AnchorState>,
    alpha: f64,
    warmup_packets: u32,
    initial_rssi: f64,
    reset_on_timeout: bool,
    staleness_ms: u64,
}

impl AnchorTracker {
    pub fn new(anchor_count: usize, cfg: &FilterConfig, staleness_ms: u64) -> Self {
        Self {
            anchors: vec![AnchorState::new(cfg.initial_rssi_dbm); anchor_count],
            alpha: cfg.alpha,
            warmup_packets: cfg.warmup_packets,
            initial_rssi: cfg.initial_rssi_dbm,
            reset_on_timeout: cfg.reset_on_timeout,
            staleness_ms,
        }
    }

    pub fn get(&self, anchor_id: u8) -> Option<&AnchorState> {
        self.anchors.get((anchor_id as usize).checked_sub(1)?)
    }

    pub fn states(&self) -> &[AnchorState] {
        &self.anchors
    }

    pub fn active_count(&self) -> usize {
        self.anchors.iter().filter(|a| a.active).count()
    }

    /// Fold an accepted reading into its anchor. `None` for an id outside
    /// `1..=N`, in which case nothing is touched.
    pub fn record(&mut self, reading: &AnchorReading, rssi: i32, now_ms: u64) -> Option<&AnchorState> {
        let idx = (reading.anchor_id as usize).checked_sub(1)?;
        let (alpha, warmup) = (self.alpha, self.warmup_packets);
        let anchor = self.anchors.get_mut(idx)?;
        let raw = rssi as f64;

        if !anchor.active || anchor.packet_count < warmup {
            anchor.filtered_rssi = raw;
        } else {
            anchor.filtered_rssi = alpha * raw + (1.0 - alpha) * anchor.filtered_rssi;
        }

        anchor.active = true;
        anchor.last_update_ms = now_ms;
        anchor.last_sequence = reading.sequence;
        anchor.packet_count = anchor.packet_count.saturating_add(1);

        if anchor.packet_count % DEBUG_EVERY_PACKETS == 0 {
            debug!(
                "Anchor {}: RSSI={rssi} dBm, filtered={:.1} dBm, packets={}",
                reading.anchor_id, anchor.filtered_rssi, anchor.packet_count
            );
        }

        Some(anchor)
    }

    /// Staleness sweep, run once per poll tick.
    pub fn sweep(&mut self, now_ms: u64) -> Vec<AnchorTimeout> {
        let mut timed_out = Vec::new();

        for (idx, anchor) in self.anchors.iter_mut().enumerate() {
            if !anchor.active {
                continue;
            }
            let silent_ms = anchor.silent_for_ms(now_ms);
            if silent_ms < self.staleness_ms {
                continue;
            }

            anchor.active = false;
            if self.reset_on_timeout {
                anchor.filtered_rssi = self.initial_rssi;
                anchor.packet_count = 0;
            }

            let anchor_id = idx as u8 + 1;
            warn!("Anchor {anchor_id} timed out ({silent_ms} ms without packets)");
            timed_out.push(AnchorTimeout { anchor_id, silent_ms });
        }

        timed_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(anchor_id: u8, sequence: u32) -> AnchorReading {
        AnchorReading { anchor_id, sequence, signal_byte: -1 }
    }

    fn tracker() -> AnchorTracker {
        AnchorTracker::new(3, &FilterConfig::default(), 5000)
    }

    #[test]
    fn test_initial_state() {
        let t = tracker();
        for s in t.states() {
            assert!(!s.active);
            assert_eq!(s.filtered_rssi, -100.0);
            assert_eq!(s.packet_count, 0);
        }
        assert!(t.get(0).is_none());
        assert!(t.get(4).is_none());
    }

    #[test]
    fn test_out_of_range_id_touches_nothing() {
        let mut t = tracker();
        let before = t.states().to_vec();
        assert!(t.record(&reading(0, 1), -60, 10).is_none());
        assert!(t.record(&reading(4, 1), -60, 10).is_none());
        assert!(t.record(&reading(255, 1), -60, 10).is_none());
        assert_eq!(t.states(), &before[..]);
    }

    #[test]
    fn test_warmup_overwrites() {
        let mut t = tracker();
        let raws = [-60, -70, -55, -80, -62, -66, -59, -71, -64, -68];
        for (i, &raw) in raws.iter().enumerate() {
            let s = t.record(&reading(2, i as u32), raw, i as u64 * 100).unwrap();
            assert_eq!(s.filtered_rssi, raw as f64);
            assert_eq!(s.packet_count, i as u32 + 1);
            assert!(s.active);
        }
        assert_eq!(t.get(2).unwrap().last_sequence, 9);
        assert_eq!(t.get(2).unwrap().last_update_ms, 900);
    }

    #[test]
    fn test_steady_state_ema() {
        let mut t = tracker();
        for i in 0..10 {
            t.record(&reading(1, i), -60, i as u64);
        }
        let mut expected = -60.0;
        for (i, raw) in [-70, -50, -65, -65, -90].into_iter().enumerate() {
            expected = 0.3 * raw as f64 + 0.7 * expected;
            let s = t.record(&reading(1, 10 + i as u32), raw, 100).unwrap();
            assert!((s.filtered_rssi - expected).abs() < 1e-9, "{} vs {expected}", s.filtered_rssi);
        }
        assert_eq!(t.get(1).unwrap().packet_count, 15);
    }

    #[test]
    fn test_staleness_threshold_edge() {
        let mut t = tracker();
        t.record(&reading(3, 1), -60, 1000);

        assert!(t.sweep(1000 + 4999).is_empty());
        assert!(t.get(3).unwrap().active);

        let timed_out = t.sweep(1000 + 5000);
        assert_eq!(timed_out, vec![AnchorTimeout { anchor_id: 3, silent_ms: 5000 }]);
        assert!(!t.get(3).unwrap().active);

        // Already inactive: no second event
        assert!(t.sweep(20_000).is_empty());
    }

    #[test]
    fn test_timeout_keeps_history_by_default() {
        let mut t = tracker();
        for i in 0..12 {
            t.record(&reading(1, i), -60, 0);
        }
        t.sweep(6000);
        let s = *t.get(1).unwrap();
        assert!(!s.active);
        assert_eq!(s.packet_count, 12);
        assert_eq!(s.filtered_rssi, -60.0);

        // Reactivation: first reading overwrites (inactive), then EMA resumes
        t.record(&reading(1, 100), -80, 7000);
        assert_eq!(t.get(1).unwrap().filtered_rssi, -80.0);
        let s = t.record(&reading(1, 101), -70, 7100).unwrap();
        assert!((s.filtered_rssi - (0.3 * -70.0 + 0.7 * -80.0)).abs() < 1e-9);
    }

    #[test]
    fn test_reset_on_timeout_reenters_warmup() {
        let cfg = FilterConfig { reset_on_timeout: true, ..Default::default() };
        let mut t = AnchorTracker::new(3, &cfg, 5000);
        for i in 0..12 {
            t.record(&reading(1, i), -60, 0);
        }
        t.sweep(5000);
        let s = *t.get(1).unwrap();
        assert_eq!(s.packet_count, 0);
        assert_eq!(s.filtered_rssi, -100.0);

        t.record(&reading(1, 100), -80, 6000);
        let s = t.record(&reading(1, 101), -70, 6100).unwrap();
        assert_eq!(s.filtered_rssi, -70.0);
    }

    #[test]
    fn test_active_count() {
        let mut t = tracker();
        t.record(&reading(1, 0), -60, 0);
        t.record(&reading(3, 0), -60, 3000);
        assert_eq!(t.active_count(), 2);
        t.sweep(5000);
        assert_eq!(t.active_count(), 1);
    }
}
