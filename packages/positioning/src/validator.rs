//! validator.rs — frame gate in front of the tracker
//!
//! `frames_received` counts arrivals, not accepted readings: it goes up before
//! any check, so malformed and foreign frames are still visible in the status
//! report.

use anchor_types::{AnchorReading, FrameError, WireFrame};
use thiserror::Error;
use tracing::debug;

/// Every Nth arrival is logged with its length.
const DEBUG_EVERY_FRAMES: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameRejected {
    #[error(transparent)]
    Malformed(#[from] FrameError),
    #[error("anchor id {anchor_id} outside 1..={anchor_count}")]
    UnknownAnchor { anchor_id: u8, anchor_count: usize },
}

#[derive(Debug, Clone)]
pub struct PacketValidator {
    anchor_count: usize,
    frames_received: u64,
}

impl PacketValidator {
    pub fn new(anchor_count: usize) -> Self {
        Self { anchor_count, frames_received: 0 }
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    pub fn validate(&mut self, bytes: &[u8]) -> Result<AnchorReading, FrameRejected> {
        self.frames_received += 1;
        if self.frames_received % DEBUG_EVERY_FRAMES == 0 {
            debug!("Frame #{}, len {}", self.frames_received, bytes.len());
        }

        let reading = AnchorReading::from(WireFrame::decode(bytes)?);
        if reading.anchor_id == 0 || reading.anchor_id as usize > self.anchor_count {
            return Err(FrameRejected::UnknownAnchor {
                anchor_id: reading.anchor_id,
                anchor_count: self.anchor_count,
            });
        }
        Ok(reading)
    }
}
