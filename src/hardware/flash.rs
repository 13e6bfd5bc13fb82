//! Flash controller backed by esp-storage
//!
//! The ROM routines handle controller unlock internally, so `unlock` and
//! `lock` are no-ops here; the trait keeps them for controllers that need
//! them (and for the mock's bookkeeping).

use embedded_storage::nor_flash::{NorFlash, ReadNorFlash};
use esp_storage::FlashStorage;
use log::warn;

use crate::storage::flash::{FlashError, FlashOps};

/// The node's flash controller
pub struct ConfigFlash {
    inner: FlashStorage,
}

impl ConfigFlash {
    pub fn new() -> Self {
        Self {
            inner: FlashStorage::new(),
        }
    }
}

impl Default for ConfigFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl FlashOps for ConfigFlash {
    const PAGE_SIZE: u32 = FlashStorage::SECTOR_SIZE;

    fn unlock(&mut self) {}

    fn lock(&mut self) {}

    fn erase_page(&mut self, address: u32) -> Result<(), FlashError> {
        self.inner
            .erase(address, address + Self::PAGE_SIZE)
            .map_err(|_| FlashError::WriteError)
    }

    fn program_word(&mut self, address: u32, word: u32) -> Result<(), FlashError> {
        self.inner
            .write(address, &word.to_le_bytes())
            .map_err(|_| FlashError::WriteError)
    }

    fn read(&self, address: u32, buffer: &mut [u8]) {
        // ReadNorFlash::read needs &mut; esp-storage reads are stateless so
        // a scoped copy keeps the trait's shared-read signature
        let mut storage = FlashStorage::new();
        if storage.read(address, buffer).is_err() {
            warn!("flash: read at {:#x} failed", address);
            buffer.fill(0xFF);
        }
    }
}
