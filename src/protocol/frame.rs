//! CAN frame value type
//!
//! One frame per bus transaction: a numeric identifier, a data length code
//! and up to eight payload bytes. Frames do not outlive the receive or
//! transmit cycle that produced them.

/// Maximum payload size of a single bus frame
pub const MAX_PAYLOAD: usize = 8;

/// Sentinel value for reserved/unused payload bytes in outbound frames
pub const FILLER: u8 = 0x55;

/// Identifier addressing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// 11-bit identifier
    Standard,
    /// 29-bit identifier
    Extended,
}

/// One discrete bus message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    /// Addressing mode of `id`
    pub kind: IdKind,
    /// Frame identifier
    pub id: u32,
    /// Data length code, never above [`MAX_PAYLOAD`]
    pub dlc: u8,
    /// Payload bytes; only the first `dlc` are meaningful
    pub data: [u8; MAX_PAYLOAD],
}

impl CanFrame {
    /// Prepare an outbound frame with every payload byte set to the filler
    /// sentinel and a full data length code. Callers overwrite the bytes
    /// they use and shrink `dlc` as needed.
    pub fn new_tx(kind: IdKind, id: u32) -> Self {
        Self {
            kind,
            id,
            dlc: MAX_PAYLOAD as u8,
            data: [FILLER; MAX_PAYLOAD],
        }
    }

    /// Build an inbound frame from received payload bytes.
    ///
    /// Payloads longer than eight bytes are truncated; the peripheral
    /// cannot deliver them, so this only matters for test construction.
    pub fn new_rx(kind: IdKind, id: u32, payload: &[u8]) -> Self {
        let len = core::cmp::min(payload.len(), MAX_PAYLOAD);
        let mut data = [0u8; MAX_PAYLOAD];
        data[..len].copy_from_slice(&payload[..len]);
        Self {
            kind,
            id,
            dlc: len as u8,
            data,
        }
    }

    /// The meaningful payload bytes
    pub fn payload(&self) -> &[u8] {
        let len = core::cmp::min(self.dlc as usize, MAX_PAYLOAD);
        &self.data[..len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tx_filler() {
        let frame = CanFrame::new_tx(IdKind::Extended, 0xE5000);
        assert_eq!(frame.id, 0xE5000);
        assert_eq!(frame.dlc, 8);
        assert_eq!(frame.data, [FILLER; 8]);
    }

    #[test]
    fn test_new_rx_payload() {
        let frame = CanFrame::new_rx(IdKind::Extended, 0xE5003, &[20]);
        assert_eq!(frame.dlc, 1);
        assert_eq!(frame.payload(), &[20]);
    }

    #[test]
    fn test_new_rx_empty() {
        let frame = CanFrame::new_rx(IdKind::Extended, 0xE5001, &[]);
        assert_eq!(frame.dlc, 0);
        assert!(frame.payload().is_empty());
    }

    #[test]
    fn test_new_rx_truncates_oversized() {
        let bytes = [0xAA; 12];
        let frame = CanFrame::new_rx(IdKind::Standard, 0x100, &bytes);
        assert_eq!(frame.dlc, 8);
        assert_eq!(frame.payload(), &bytes[..8]);
    }
}
