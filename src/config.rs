//! Compile-time configuration for the CAN analog sensor node

/// Firmware version, broadcast in announcement and stats frames and stored
/// with the persisted configuration record.
pub mod version {
    pub const MAJOR: u8 = 1;
    pub const MINOR: u8 = 0;
    pub const PATCH: u8 = 0;
}

/// CAN bus addressing and timing
pub mod bus {
    /// Base identifier all of this device family's frames are offset from.
    /// Extended (29-bit) addressing.
    pub const CAN_BASE_ID: u32 = 0xE5000;

    /// Identifier range reserved per node; the address jumpers select a
    /// multiple of this range.
    pub const API_RANGE: u32 = 256;

    /// Channel count advertised in the announcement frame
    pub const CHANNEL_COUNT: u8 = 9;

    /// Timeout while waiting for an available transmit slot
    pub const TRANSMIT_TIMEOUT_MS: u64 = 100;

    /// Timed wait on bus activity; on expiry an unprovisioned node
    /// re-announces itself
    pub const RX_WAIT_TIMEOUT_MS: u64 = 1000;

    /// Delay before the receive worker starts servicing the bus
    pub const STARTUP_DELAY_MS: u64 = 500;
}

/// Persisted configuration layout
pub mod flash_layout {
    /// Byte offset of the configuration record region within flash.
    /// Must be aligned to the storage page size; the last 4K sector of a
    /// 4MB part is reserved for it.
    pub const CONFIG_REGION_OFFSET: u32 = 0x3F_F000;
}

/// Sampling defaults
pub mod sampling {
    /// Sample rate used at first boot and after a version migration
    pub const DEFAULT_SAMPLE_RATE_HZ: u8 = 50;

    /// Number of analog inputs sampled per telemetry frame
    pub const CHANNELS: usize = 4;
}

/// Supervisory timing
pub mod system {
    /// How long to let in-flight bus/log activity settle before a
    /// requested reset
    pub const RESET_DELAY_MS: u64 = 10;

    /// Interval between stats broadcasts
    pub const STATS_INTERVAL_MS: u64 = 10_000;

    /// Main supervisory loop tick (watchdog feed granularity)
    pub const CHECK_INTERVAL_MS: u64 = 100;

    /// Hardware watchdog timeout; must exceed the stats interval
    pub const WATCHDOG_TIMEOUT_MS: u64 = 11_000;
}

/// Pin assignments for the ESP32-S3 carrier board
pub mod pins {
    /// Address jumper, bit 0 (pull-up, jumper shorts to ground)
    pub const ADDR_BIT0: u8 = 4;
    /// Address jumper, bit 1
    pub const ADDR_BIT1: u8 = 5;
    /// Bus speed select jumper (open = 1M, closed = 500K)
    pub const SPEED_SELECT: u8 = 6;

    /// TWAI transceiver pins
    pub const CAN_TX: u8 = 9;
    pub const CAN_RX: u8 = 10;

    /// Analog inputs, in channel order
    pub const ANALOG: [u8; 4] = [1, 2, 3, 7];
}
