//! Persisted configuration record
//!
//! The record is written to flash as a fixed byte image with explicit
//! offsets, so the persisted layout stays portable across builds:
//!
//! ```text
//! [0] version major
//! [1] version minor
//! [2] version patch
//! [3] sample_rate_hz
//! ```

use crate::config::{sampling, version};

/// Size of the serialized record image in bytes
pub const RECORD_SIZE: usize = 4;

/// Three-part firmware version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl FirmwareVersion {
    /// The compiled-in version of this build
    pub const CURRENT: Self = Self {
        major: version::MAJOR,
        minor: version::MINOR,
        patch: version::PATCH,
    };

    /// Whether a persisted record written under `self` is usable by a build
    /// at `other`. Major and minor gate compatibility; patch differences
    /// are accepted silently.
    pub fn compatible_with(&self, other: &Self) -> bool {
        self.major == other.major && self.minor == other.minor
    }
}

/// The configuration record held in RAM and shadowed in flash.
///
/// `sample_rate_hz` is always in 1..=255; zero is meaningless and is never
/// committed (the store rejects it on write and sanitizes it on load).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigRecord {
    pub version: FirmwareVersion,
    pub sample_rate_hz: u8,
}

impl ConfigRecord {
    /// Compiled-in defaults, used at first boot and after a migration
    pub const fn defaults() -> Self {
        Self {
            version: FirmwareVersion::CURRENT,
            sample_rate_hz: sampling::DEFAULT_SAMPLE_RATE_HZ,
        }
    }

    /// Serialize to the fixed byte layout
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        [
            self.version.major,
            self.version.minor,
            self.version.patch,
            self.sample_rate_hz,
        ]
    }

    /// Deserialize from the fixed byte layout
    pub fn from_bytes(bytes: &[u8; RECORD_SIZE]) -> Self {
        Self {
            version: FirmwareVersion {
                major: bytes[0],
                minor: bytes[1],
                patch: bytes[2],
            },
            sample_rate_hz: bytes[3],
        }
    }
}
