//! beacon.rs — per-anchor transmit state
//!
//! One beacon per simulated anchor: a free-running sequence counter starting
//! at 0 and the send statistics printed every 100 frames.

use anchor_types::WireFrame;
use tracing::info;

const REPORT_EVERY_FRAMES: u64 = 100;

#[derive(Debug, Clone)]
pub struct AnchorBeacon {
    pub anchor_id: u8,
    signal_byte: i8,
    next_sequence: u32,
    sent: u64,
    failed: u64,
    skipped: u64,
}

impl AnchorBeacon {
    pub fn new(anchor_id: u8, signal_byte: i8) -> Self {
        Self { anchor_id, signal_byte, next_sequence: 0, sent: 0, failed: 0, skipped: 0 }
    }

    /// Frame for this tick; the sequence advances whether or not it is sent.
    pub fn next_frame(&mut self) -> WireFrame {
        let frame = WireFrame::new(self.anchor_id, self.next_sequence, self.signal_byte);
        self.next_sequence = self.next_sequence.wrapping_add(1);
        frame
    }

    pub fn record_sent(&mut self) {
        self.sent += 1;
        if self.sent % REPORT_EVERY_FRAMES == 0 {
            info!("Anchor {} frames sent: {}", self.anchor_id, self.sent);
        }
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    /// Frame deliberately not sent (simulated link loss)
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn sent(&self) -> u64 { self.sent }
    pub fn failed(&self) -> u64 { self.failed }
    pub fn skipped(&self) -> u64 { self.skipped }
}
