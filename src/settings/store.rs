//! Configuration store
//!
//! Owns the in-memory configuration record, loads and migrates it at boot,
//! and decides when to persist it. The persisted image is only rewritten
//! when it differs from the RAM record, so repeated configuration frames
//! carrying the same value do not wear the storage medium.

use core::sync::atomic::{AtomicU8, Ordering};

use log::{info, warn};

use crate::config::sampling;
use crate::settings::record::{ConfigRecord, FirmwareVersion, RECORD_SIZE};
use crate::storage::flash::{flash_region, FlashError, FlashOps};

/// Lock-free live view of the sample rate.
///
/// The record itself is written only by the dispatch thread, but the
/// sampler thread reads the rate concurrently; routing that read through an
/// atomic avoids any tearing question across targets.
pub struct SampleRateCell(AtomicU8);

impl SampleRateCell {
    pub const fn new(initial: u8) -> Self {
        Self(AtomicU8::new(initial))
    }

    /// Current sample rate in Hz
    pub fn read(&self) -> u8 {
        self.0.load(Ordering::Relaxed)
    }

    fn publish(&self, rate: u8) {
        self.0.store(rate, Ordering::Relaxed);
    }
}

/// The configuration manager.
///
/// Exclusive owner of the flash controller; nothing else touches the
/// persisted region while a commit is in flight.
pub struct ConfigStore<'a, F: FlashOps> {
    flash: F,
    region: u32,
    record: ConfigRecord,
    initialized: bool,
    live_rate: &'a SampleRateCell,
}

impl<'a, F: FlashOps> ConfigStore<'a, F> {
    /// Create a store over `flash` with the record region at byte offset
    /// `region`. The record starts at compiled defaults until [`load`] runs.
    ///
    /// [`load`]: ConfigStore::load
    pub fn new(flash: F, region: u32, live_rate: &'a SampleRateCell) -> Self {
        Self {
            flash,
            region,
            record: ConfigRecord::defaults(),
            initialized: false,
            live_rate,
        }
    }

    fn persisted_image(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0u8; RECORD_SIZE];
        self.flash.read(self.region, &mut bytes);
        bytes
    }

    fn persist(&mut self) -> Result<(), FlashError> {
        let bytes = self.record.to_bytes();
        flash_region(&mut self.flash, self.region, &bytes)
    }

    /// Load the persisted record into RAM. Idempotent; later calls are
    /// no-ops once initialized.
    ///
    /// A persisted record from an incompatible major/minor version is
    /// discarded: the compiled defaults replace it and are persisted
    /// immediately. A persisted zero sample rate is sanitized to the
    /// default; it must never reach the sampler.
    pub fn load(&mut self) -> &ConfigRecord {
        if self.initialized {
            return &self.record;
        }

        let persisted = ConfigRecord::from_bytes(&self.persisted_image());
        if persisted.version.compatible_with(&FirmwareVersion::CURRENT) {
            self.record = persisted;
            if self.record.sample_rate_hz == 0 {
                warn!("config: persisted sample rate 0, using default");
                self.record.sample_rate_hz = sampling::DEFAULT_SAMPLE_RATE_HZ;
            }
        } else {
            info!(
                "config: version changed {}.{} -> {}.{}, writing defaults",
                persisted.version.major,
                persisted.version.minor,
                FirmwareVersion::CURRENT.major,
                FirmwareVersion::CURRENT.minor
            );
            self.record = ConfigRecord::defaults();
            if let Err(e) = self.persist() {
                warn!("config: flashing defaults failed: {:?}", e);
            }
        }

        self.live_rate.publish(self.record.sample_rate_hz);
        self.initialized = true;
        &self.record
    }

    /// Persist the RAM record if and only if it differs byte-for-byte from
    /// the flash image. Returns whether a write happened.
    ///
    /// A failed write is not retried here; the RAM record stays
    /// authoritative and the next call re-attempts naturally.
    pub fn commit_if_changed(&mut self) -> Result<bool, FlashError> {
        if !self.initialized {
            self.load();
        }

        if self.persisted_image() == self.record.to_bytes() {
            info!("config: not changed, not flashing");
            return Ok(false);
        }

        self.persist()?;
        Ok(true)
    }

    /// Update the RAM record's sample rate and publish it to the live cell.
    /// Does not persist; callers follow with [`commit_if_changed`].
    ///
    /// Zero is rejected: it is meaningless and must never be committed.
    ///
    /// [`commit_if_changed`]: ConfigStore::commit_if_changed
    pub fn set_sample_rate(&mut self, rate: u8) -> bool {
        if rate == 0 {
            warn!("config: rejecting sample rate 0");
            return false;
        }
        self.record.sample_rate_hz = rate;
        self.live_rate.publish(rate);
        true
    }

    /// Current sample rate in Hz
    pub fn sample_rate(&self) -> u8 {
        self.record.sample_rate_hz
    }

    /// The RAM record
    pub fn record(&self) -> &ConfigRecord {
        &self.record
    }

    /// The underlying flash controller
    pub fn flash(&self) -> &F {
        &self.flash
    }
}
