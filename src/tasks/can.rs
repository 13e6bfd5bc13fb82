//! Bus dispatch task

use core::sync::atomic::Ordering;

use embassy_time::{Duration, Timer};
use log::info;

use crate::bus::{Dispatcher, SpeedProfile};
use crate::config::bus::STARTUP_DELAY_MS;
use crate::hardware::{ConfigFlash, SoftwareReset, TwaiBus};
use crate::tasks::STATS_DUE;

#[embassy_executor::task]
pub async fn can_task(
    mut dispatcher: Dispatcher<'static, TwaiBus<'static>, SoftwareReset, ConfigFlash>,
    profile: SpeedProfile,
) {
    // let the bus settle before the first announcement
    Timer::after(Duration::from_millis(STARTUP_DELAY_MS)).await;

    info!(
        "CAN node up, base id {:#x}, bus speed {}",
        dispatcher.base_id(),
        profile.label()
    );

    dispatcher.send_announcement().await;

    loop {
        dispatcher.service().await;

        if STATS_DUE.swap(false, Ordering::Relaxed) {
            dispatcher.send_stats().await;
        }
    }
}
