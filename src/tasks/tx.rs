//! Transmit pump
//!
//! Single owner of the TWAI transmitter. Frames that cannot go out within
//! the transmit timeout are dropped so a stalled bus never wedges producers.

use embassy_time::{with_timeout, Duration};
use esp_hal::twai::TwaiTx;
use esp_hal::Async;
use log::warn;

use crate::config::bus::TRANSMIT_TIMEOUT_MS;
use crate::hardware::to_esp_frame;
use crate::tasks::TX_CHANNEL;

#[embassy_executor::task]
pub async fn tx_task(mut tx: TwaiTx<'static, Async>) {
    loop {
        let frame = TX_CHANNEL.receive().await;

        let Some(esp_frame) = to_esp_frame(&frame) else {
            warn!("dropping frame with out-of-range id {:#x}", frame.id);
            continue;
        };

        match with_timeout(
            Duration::from_millis(TRANSMIT_TIMEOUT_MS),
            tx.transmit_async(&esp_frame),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("TWAI transmit failed: {e:?}"),
            Err(_) => warn!("TWAI transmit timed out, frame dropped"),
        }
    }
}
