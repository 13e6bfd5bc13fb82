//! Bus opcodes and frame encoders
//!
//! Every frame type this node exchanges is addressed at a fixed offset from
//! the node's base identifier. Classification is total: identifiers outside
//! the table belong to other nodes on the shared bus and decode to `None`.
//!
//! # Frame layouts
//!
//! | Offset | Direction | Payload |
//! |--------|-----------|---------|
//! | 0 Announcement | out | `[channel count, 0x55 x4, major, minor, patch]` |
//! | 1 ResetDevice | in | none |
//! | 2 Stats | out | `[major, minor, patch]` |
//! | 3 SetConfigGroup1 | in | `[sample_rate_hz]` |
//! | 20 BroadcastSensors | out | four 16-bit LE scaled samples |

use crate::config::{bus, version};
use crate::protocol::frame::{CanFrame, IdKind};

/// Frame types, identified by numeric offset from the node base id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Node presence plus firmware version, broadcast until provisioned (0)
    Announcement,
    /// Immediate hardware reset request (1)
    ResetDevice,
    /// Lightweight health beacon (2)
    Stats,
    /// Configuration update; first acceptance provisions the node (3)
    SetConfigGroup1,
    /// Scaled analog telemetry (20)
    BroadcastSensors,
}

impl Opcode {
    /// Numeric offset from the node base identifier
    pub const fn offset(self) -> u32 {
        match self {
            Opcode::Announcement => 0,
            Opcode::ResetDevice => 1,
            Opcode::Stats => 2,
            Opcode::SetConfigGroup1 => 3,
            Opcode::BroadcastSensors => 20,
        }
    }

    /// Minimum payload bytes an inbound frame of this type must carry
    pub const fn required_len(self) -> usize {
        match self {
            Opcode::Announcement => 8,
            Opcode::ResetDevice => 0,
            Opcode::Stats => 3,
            Opcode::SetConfigGroup1 => 1,
            Opcode::BroadcastSensors => 8,
        }
    }

    /// Classify a frame identifier relative to a node base address.
    ///
    /// Returns `None` for any identifier outside the opcode table; the bus
    /// is shared, so unknown traffic is expected and not an error.
    pub fn classify(id: u32, base_id: u32) -> Option<Self> {
        match id.checked_sub(base_id)? {
            0 => Some(Opcode::Announcement),
            1 => Some(Opcode::ResetDevice),
            2 => Some(Opcode::Stats),
            3 => Some(Opcode::SetConfigGroup1),
            20 => Some(Opcode::BroadcastSensors),
            _ => None,
        }
    }
}

/// Announcement frame: channel count, four filler bytes, firmware version
pub fn announcement_frame(base_id: u32) -> CanFrame {
    let mut frame = CanFrame::new_tx(IdKind::Extended, base_id + Opcode::Announcement.offset());
    frame.data[0] = bus::CHANNEL_COUNT;
    // data[1..5] keep the filler sentinel
    frame.data[5] = version::MAJOR;
    frame.data[6] = version::MINOR;
    frame.data[7] = version::PATCH;
    frame
}

/// Stats frame: firmware version only
pub fn stats_frame(base_id: u32) -> CanFrame {
    let mut frame = CanFrame::new_tx(IdKind::Extended, base_id + Opcode::Stats.offset());
    frame.data[0] = version::MAJOR;
    frame.data[1] = version::MINOR;
    frame.data[2] = version::PATCH;
    frame.dlc = 3;
    frame
}

/// Telemetry frame: four scaled samples, little-endian 16-bit each
pub fn broadcast_sensors_frame(base_id: u32, samples: &[u16; 4]) -> CanFrame {
    let mut frame = CanFrame::new_tx(IdKind::Extended, base_id + Opcode::BroadcastSensors.offset());
    for (i, sample) in samples.iter().enumerate() {
        let bytes = sample.to_le_bytes();
        frame.data[i * 2] = bytes[0];
        frame.data[i * 2 + 1] = bytes[1];
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::bus::{API_RANGE, CAN_BASE_ID};

    #[test]
    fn test_classify_known_opcodes() {
        let base = CAN_BASE_ID;
        assert_eq!(Opcode::classify(base, base), Some(Opcode::Announcement));
        assert_eq!(Opcode::classify(base + 1, base), Some(Opcode::ResetDevice));
        assert_eq!(Opcode::classify(base + 2, base), Some(Opcode::Stats));
        assert_eq!(Opcode::classify(base + 3, base), Some(Opcode::SetConfigGroup1));
        assert_eq!(Opcode::classify(base + 20, base), Some(Opcode::BroadcastSensors));
    }

    #[test]
    fn test_classify_unknown_for_all_offsets() {
        // For every jumper offset, anything outside the table is None
        for jumper in 0..4u32 {
            let base = CAN_BASE_ID + API_RANGE * jumper;
            for delta in [4u32, 5, 19, 21, 100, 255] {
                assert_eq!(Opcode::classify(base + delta, base), None);
            }
            // Traffic below the base address (other nodes, lower offsets)
            assert_eq!(Opcode::classify(base.wrapping_sub(1), base), None);
            assert_eq!(Opcode::classify(0, base), None);
        }
    }

    #[test]
    fn test_announcement_layout() {
        let frame = announcement_frame(CAN_BASE_ID);
        assert_eq!(frame.id, CAN_BASE_ID);
        assert_eq!(frame.dlc, 8);
        assert_eq!(frame.data[0], bus::CHANNEL_COUNT);
        assert_eq!(&frame.data[1..5], &[0x55, 0x55, 0x55, 0x55]);
        assert_eq!(
            &frame.data[5..8],
            &[version::MAJOR, version::MINOR, version::PATCH]
        );
    }

    #[test]
    fn test_stats_layout() {
        let frame = stats_frame(CAN_BASE_ID + API_RANGE);
        assert_eq!(frame.id, CAN_BASE_ID + API_RANGE + 2);
        assert_eq!(frame.dlc, 3);
        assert_eq!(
            frame.payload(),
            &[version::MAJOR, version::MINOR, version::PATCH]
        );
    }

    #[test]
    fn test_broadcast_sensors_layout() {
        let samples = [0x0102u16, 0x0304, 0x0506, 0x1388];
        let frame = broadcast_sensors_frame(CAN_BASE_ID, &samples);
        assert_eq!(frame.id, CAN_BASE_ID + 20);
        assert_eq!(frame.dlc, 8);
        assert_eq!(
            frame.payload(),
            &[0x02, 0x01, 0x04, 0x03, 0x06, 0x05, 0x88, 0x13]
        );
    }
}
