//! Jumper-based address and speed resolution
//!
//! Two address jumpers select which 256-id block of the shared bus this
//! node answers on; a third jumper selects the bus bit rate. All three are
//! pull-up biased discrete inputs, so a missing jumper reads high and
//! resolution always succeeds. Runs exactly once at boot; the results are
//! immutable afterwards.

use crate::config::bus;

/// Spin iterations for jumper inputs to settle after pull-up enable
pub const SETTLE_SPIN_COUNT: u32 = 100_000;

/// Busy-wait for the jumper inputs to settle.
///
/// This runs before the scheduler's timing services are safe to use, so it
/// is a deterministic spin count rather than a sleep.
pub fn settle_inputs() {
    for _ in 0..SETTLE_SPIN_COUNT {
        core::hint::spin_loop();
    }
}

/// Jumper inputs, already configured as pull-up and settled
pub trait JumperPins {
    /// Address offset bit 0
    fn address_bit0(&self) -> bool;
    /// Address offset bit 1
    fn address_bit1(&self) -> bool;
    /// Bus speed select; high selects 1 Mbit
    fn speed_select(&self) -> bool;
}

/// This node's resolved bus base address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeAddress {
    base_id: u32,
}

impl NodeAddress {
    /// Base address for a given two-bit jumper offset
    pub const fn from_offset(offset: u32) -> Self {
        Self {
            base_id: bus::CAN_BASE_ID + bus::API_RANGE * offset,
        }
    }

    /// The identifier all of this node's frame types are offset from
    pub fn base_id(&self) -> u32 {
        self.base_id
    }
}

/// One of the two fixed bus timing configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedProfile {
    Baud500k,
    Baud1M,
}

/// Bit timing preset for the bus peripheral.
///
/// Register-style encodings (value = n - 1) for a 36 MHz peripheral clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitTiming {
    pub prescaler: u16,
    pub seg1: u8,
    pub seg2: u8,
    pub sjw: u8,
}

impl SpeedProfile {
    pub const fn bit_timing(self) -> BitTiming {
        match self {
            SpeedProfile::Baud500k => BitTiming {
                prescaler: 5,
                seg1: 11,
                seg2: 2,
                sjw: 1,
            },
            SpeedProfile::Baud1M => BitTiming {
                prescaler: 2,
                seg1: 11,
                seg2: 2,
                sjw: 1,
            },
        }
    }

    /// Human-readable rate for boot logging
    pub const fn label(self) -> &'static str {
        match self {
            SpeedProfile::Baud500k => "500K",
            SpeedProfile::Baud1M => "1M",
        }
    }
}

/// Read the two address jumpers and compute this node's base address
pub fn resolve_address<P: JumperPins>(pins: &P) -> NodeAddress {
    let mut offset = 0;
    if pins.address_bit0() {
        offset |= 0x01;
    }
    if pins.address_bit1() {
        offset |= 0x02;
    }
    NodeAddress::from_offset(offset)
}

/// Read the speed jumper and select the bus timing profile
pub fn resolve_speed_profile<P: JumperPins>(pins: &P) -> SpeedProfile {
    if pins.speed_select() {
        SpeedProfile::Baud1M
    } else {
        SpeedProfile::Baud500k
    }
}
