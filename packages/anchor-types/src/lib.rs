//! # anchor-types
//!
//! Shared anchor frame structures for the RSSI trilateration system.
//!
//! These types are used by:
//! - `trilat-receiver` / `positioning`: decoding frames that arrive from anchors
//! - `anchor-sim`: producing frames on the transmitter side
//!
//! ## Wire layout
//!
//! One frame is exactly [`FRAME_LEN`] bytes. Every field is byte-sized, so the
//! layout has no implicit alignment padding and is identical on every target:
//!
//! | offset | field        | type                 |
//! |--------|--------------|----------------------|
//! | 0      | anchor_id    | u8                   |
//! | 1..5   | sequence     | u32, little-endian   |
//! | 5      | signal_byte  | i8                   |
//! | 6..12  | padding      | zero                 |
//!
//! Both ends encode/decode through [`WireFrame`]; neither side declares its
//! own struct.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Exact size of one anchor frame on the wire.
pub const FRAME_LEN: usize = 12;

/// Number of anchors in a deployment. Ids run `1..=MAX_ANCHORS`.
pub const MAX_ANCHORS: usize = 3;

/// Period between two frames from the same anchor.
pub const BROADCAST_INTERVAL_MS: u64 = 100;

/// Signal byte sent by anchors without battery monitoring.
pub const SIGNAL_UNAVAILABLE: i8 = -1;

// ── Wire frame ────────────────────────────────────────────────────────────────

/// Raw anchor frame, byte-for-byte as it travels over the link.
///
/// All fields are `u8`/`i8` arrays so `#[repr(C)]` gives alignment 1 and no
/// padding; the multi-byte sequence number is stored little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct WireFrame {
    pub anchor_id: u8,
    sequence_le: [u8; 4],
    pub signal_byte: i8,
    padding: [u8; 6],
}

const _: () = assert!(std::mem::size_of::<WireFrame>() == FRAME_LEN);
const _: () = assert!(std::mem::align_of::<WireFrame>() == 1);

impl WireFrame {
    pub fn new(anchor_id: u8, sequence: u32, signal_byte: i8) -> Self {
        Self {
            anchor_id,
            sequence_le: sequence.to_le_bytes(),
            signal_byte,
            padding: [0; 6],
        }
    }

    /// Sequence number (arrival-order hint only, never gap-checked)
    pub fn sequence(&self) -> u32 {
        u32::from_le_bytes(self.sequence_le)
    }

    /// Frame bytes ready for transmission
    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        bytemuck::cast(*self)
    }

    /// Decode a received buffer. Only the exact frame length is accepted.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        bytemuck::try_pod_read_unaligned(bytes).map_err(|_| FrameError::WrongLength {
            expected: FRAME_LEN,
            actual: bytes.len(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame is {actual} bytes, expected {expected}")]
    WrongLength { expected: usize, actual: usize },
}

// ── Decoded reading ───────────────────────────────────────────────────────────

/// Typed view of one valid frame, consumed immediately by the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorReading {
    /// Anchor identifier, `1..=MAX_ANCHORS` once validated
    pub anchor_id: u8,
    /// Transmitter-side counter, wraps silently
    pub sequence: u32,
    /// Battery level as sent by the anchor (-1 = not monitored).
    /// Receivers that expect a transmit power read the same byte.
    pub signal_byte: i8,
}

impl From<WireFrame> for AnchorReading {
    fn from(frame: WireFrame) -> Self {
        Self {
            anchor_id: frame.anchor_id,
            sequence: frame.sequence(),
            signal_byte: frame.signal_byte,
        }
    }
}

impl From<AnchorReading> for WireFrame {
    fn from(reading: AnchorReading) -> Self {
        WireFrame::new(reading.anchor_id, reading.sequence, reading.signal_byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_offsets() {
        let frame = WireFrame::new(2, 0x0403_0201, -7);
        let bytes = frame.to_bytes();
        assert_eq!(bytes.len(), FRAME_LEN);
        assert_eq!(bytes[0], 2);
        assert_eq!(&bytes[1..5], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(bytes[5] as i8, -7);
        assert_eq!(&bytes[6..], &[0u8; 6]);
    }

    #[test]
    fn test_decode_hand_built_frame() {
        let mut data = Vec::new();
        data.push(3u8); // Anchor ID
        data.extend_from_slice(&456u32.to_le_bytes()); // Sequence
        data.push((-1i8) as u8); // Signal byte
        data.extend_from_slice(&[0u8; 6]); // Padding

        let reading = AnchorReading::from(WireFrame::decode(&data).unwrap());
        assert_eq!(reading.anchor_id, 3);
        assert_eq!(reading.sequence, 456);
        assert_eq!(reading.signal_byte, SIGNAL_UNAVAILABLE);
    }

    #[test]
    fn test_decode_rejects_other_lengths() {
        // Unpacked sender struct without trailing padding
        let short = [1u8; 9];
        assert_eq!(
            WireFrame::decode(&short),
            Err(FrameError::WrongLength { expected: FRAME_LEN, actual: 9 })
        );
        assert!(WireFrame::decode(&[0u8; 13]).is_err());
        assert!(WireFrame::decode(&[]).is_err());
    }

    #[test]
    fn test_padding_is_ignored_on_decode() {
        let mut bytes = WireFrame::new(1, 9, 0).to_bytes();
        bytes[11] = 0xAA;
        let frame = WireFrame::decode(&bytes).unwrap();
        assert_eq!(frame.anchor_id, 1);
        assert_eq!(frame.sequence(), 9);
    }
}
