//! Raw flash region programming
//!
//! Erase granularity is coarser than write granularity, so any change to
//! the persisted region is a full rewrite: erase every touched page,
//! program word by word, then verify by read-back. There is no in-place
//! update and no retry; the single caller (the configuration store) owns
//! the region for the duration of a call.

use log::{info, warn};

/// Program word size in bytes; lengths round up to this
pub const WORD_SIZE: usize = 4;

/// Errors from flash region programming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashError {
    /// Target address not aligned to the page size; hardware untouched
    InvalidParameter,
    /// A word-program operation failed; the region is left partially written
    WriteError,
    /// Post-write read-back did not match the source data
    VerifyError,
}

/// Flash controller interface for testability
///
/// This trait allows the region-programming algorithm and the configuration
/// store to run against either the real storage controller or an in-memory
/// mock. Addresses are byte offsets within flash.
pub trait FlashOps {
    /// Minimum erase granularity in bytes
    const PAGE_SIZE: u32;

    /// Unlock the storage controller for erase/program
    fn unlock(&mut self);

    /// Re-lock the storage controller
    fn lock(&mut self);

    /// Erase one page starting at `address` (page aligned)
    fn erase_page(&mut self, address: u32) -> Result<(), FlashError>;

    /// Program one word at `address` (word aligned, page already erased)
    fn program_word(&mut self, address: u32, word: u32) -> Result<(), FlashError>;

    /// Read bytes starting at `address` into `buffer`
    fn read(&self, address: u32, buffer: &mut [u8]);
}

/// Erase, program and verify `data` at `target`.
///
/// Fails with [`FlashError::InvalidParameter`] before touching hardware if
/// `target` is not page aligned. The final word pads with `0xFF` (erased
/// state) when `data` is not a whole number of words. An erase step that
/// reports failure is logged but not fatal by itself: a page that truly
/// failed to erase is caught by the verify compare.
pub fn flash_region<F: FlashOps>(flash: &mut F, target: u32, data: &[u8]) -> Result<(), FlashError> {
    if target % F::PAGE_SIZE != 0 {
        return Err(FlashError::InvalidParameter);
    }

    // adjust length to the word boundary
    let length = data.len().div_ceil(WORD_SIZE) * WORD_SIZE;

    flash.unlock();

    let mut page = target;
    while page < target + length as u32 {
        if let Err(e) = flash.erase_page(page) {
            warn!("flash: erase of page {:#x} failed: {:?}", page, e);
        }
        page += F::PAGE_SIZE;
    }

    let mut result = Ok(());
    for offset in (0..length).step_by(WORD_SIZE) {
        let mut word = [0xFFu8; WORD_SIZE];
        for (i, byte) in word.iter_mut().enumerate() {
            if let Some(&value) = data.get(offset + i) {
                *byte = value;
            }
        }
        if flash
            .program_word(target + offset as u32, u32::from_le_bytes(word))
            .is_err()
        {
            warn!("flash: program at {:#x} failed", target + offset as u32);
            result = Err(FlashError::WriteError);
            break;
        }
    }

    flash.lock();

    if result.is_ok() {
        let mut chunk = [0u8; 16];
        let mut offset = 0;
        while offset < data.len() {
            let n = core::cmp::min(chunk.len(), data.len() - offset);
            flash.read(target + offset as u32, &mut chunk[..n]);
            if chunk[..n] != data[offset..offset + n] {
                result = Err(FlashError::VerifyError);
                break;
            }
            offset += n;
        }
    }

    match result {
        Ok(()) => info!("flash: region {:#x} written, {} bytes", target, data.len()),
        Err(e) => warn!("flash: region {:#x} failed: {:?}", target, e),
    }
    result
}


#[cfg(test)]
mod tests {
    use super::mock::{MockFlash, MOCK_PAGE_SIZE};
    use super::*;

    #[test]
    fn test_misaligned_target_touches_nothing() {
        let mut flash = MockFlash::new();
        let result = flash_region(&mut flash, MOCK_PAGE_SIZE + 1, &[0x01, 0x02]);

        assert_eq!(result, Err(FlashError::InvalidParameter));
        assert_eq!(flash.erase_calls(), 0);
        assert_eq!(flash.program_calls(), 0);
    }

    #[test]
    fn test_write_and_verify() {
        let mut flash = MockFlash::new();
        let data = [0xDE, 0xAD, 0xBE, 0xEF, 0x01];

        flash_region(&mut flash, 0, &data).unwrap();

        // One page erased, two words programmed (5 bytes rounds up to 8)
        assert_eq!(flash.erase_calls(), 1);
        assert_eq!(flash.program_calls(), 2);
        assert_eq!(flash.contents(0, 5), data.to_vec());
        // Pad bytes program as erased
        assert_eq!(flash.contents(5, 3), vec![0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_rewrite_over_old_data() {
        let mut flash = MockFlash::new();
        flash_region(&mut flash, 0, &[0x11, 0x22, 0x33, 0x44]).unwrap();
        flash_region(&mut flash, 0, &[0x55, 0x66, 0x77, 0x88]).unwrap();

        assert_eq!(flash.contents(0, 4), vec![0x55, 0x66, 0x77, 0x88]);
    }

    #[test]
    fn test_multi_page_region_erases_every_page() {
        let mut flash = MockFlash::new();
        let data = vec![0xA5; MOCK_PAGE_SIZE as usize + 4];

        flash_region(&mut flash, 0, &data).unwrap();
        assert_eq!(flash.erase_calls(), 2);
    }

    #[test]
    fn test_program_failure_stops_immediately() {
        let mut flash = MockFlash::new();
        flash.set_fail_program_at(1);

        let data = [0x01; 12]; // three words
        let result = flash_region(&mut flash, 0, &data);

        assert_eq!(result, Err(FlashError::WriteError));
        // Stopped at the failing word; the third was never attempted
        assert_eq!(flash.program_calls(), 2);
    }

    #[test]
    fn test_verify_failure_detected() {
        let mut flash = MockFlash::new();
        flash.set_corrupt_next_program();

        let result = flash_region(&mut flash, 0, &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(result, Err(FlashError::VerifyError));
    }
}
