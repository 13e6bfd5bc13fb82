//! Software reset hook

use embassy_time::{Duration, Timer};
use log::info;

use crate::bus::traits::ResetControl;
use crate::config::system::RESET_DELAY_MS;

/// Processor reset via the chip's software reset
pub struct SoftwareReset;

impl ResetControl for SoftwareReset {
    async fn reset_system(&mut self) {
        info!("sys: resetting system");
        // Let in-flight log and bus activity settle
        Timer::after(Duration::from_millis(RESET_DELAY_MS)).await;
        esp_hal::system::software_reset()
    }
}
