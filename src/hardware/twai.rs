//! TWAI peripheral glue
//!
//! The receive side is owned by the dispatcher through [`TwaiBus`]; the
//! transmit side is owned by the TX pump task, and every producer (the
//! dispatcher and the sampler) sends through the shared frame channel.

use embassy_futures::poll_once;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::{Duration, Timer};
use embedded_can::{ExtendedId, Frame as _, Id, StandardId};
use esp_hal::twai::{BaudRate, EspTwaiFrame, TwaiRx};
use esp_hal::Async;
use log::warn;

use crate::bus::resolver::SpeedProfile;
use crate::bus::traits::{BusError, CanBus, WaitOutcome};
use crate::config::bus::RX_WAIT_TIMEOUT_MS;
use crate::protocol::frame::{CanFrame, IdKind};

/// Peripheral baud preset for a resolved speed profile
pub fn baud_rate(profile: SpeedProfile) -> BaudRate {
    match profile {
        SpeedProfile::Baud500k => BaudRate::B500K,
        SpeedProfile::Baud1M => BaudRate::B1000K,
    }
}

/// Convert an outbound frame to the peripheral representation.
///
/// Returns `None` if the identifier does not fit its addressing mode.
pub fn to_esp_frame(frame: &CanFrame) -> Option<EspTwaiFrame> {
    let id: Id = match frame.kind {
        IdKind::Standard => StandardId::new(frame.id as u16)?.into(),
        IdKind::Extended => ExtendedId::new(frame.id)?.into(),
    };
    EspTwaiFrame::new(id, frame.payload())
}

fn from_esp_frame(frame: &EspTwaiFrame) -> CanFrame {
    match frame.id() {
        Id::Standard(id) => CanFrame::new_rx(IdKind::Standard, id.as_raw() as u32, frame.data()),
        Id::Extended(id) => CanFrame::new_rx(IdKind::Extended, id.as_raw(), frame.data()),
    }
}

/// Dispatcher-facing bus built from the TWAI receiver and the TX channel
pub struct TwaiBus<'d> {
    rx: TwaiRx<'d, Async>,
    tx: Sender<'static, CriticalSectionRawMutex, CanFrame, 8>,
    pending: Option<CanFrame>,
}

impl<'d> TwaiBus<'d> {
    pub fn new(
        rx: TwaiRx<'d, Async>,
        tx: Sender<'static, CriticalSectionRawMutex, CanFrame, 8>,
    ) -> Self {
        Self {
            rx,
            tx,
            pending: None,
        }
    }
}

impl CanBus for TwaiBus<'_> {
    async fn transmit(&mut self, frame: &CanFrame) -> Result<(), BusError> {
        // The TX pump applies the transmit timeout; queueing cannot fail
        self.tx.send(*frame).await;
        Ok(())
    }

    fn try_receive(&mut self) -> Option<CanFrame> {
        if let Some(frame) = self.pending.take() {
            return Some(frame);
        }
        match poll_once(self.rx.receive_async()) {
            core::task::Poll::Ready(Ok(frame)) => Some(from_esp_frame(&frame)),
            core::task::Poll::Ready(Err(e)) => {
                warn!("can: receive error: {:?}", e);
                None
            }
            core::task::Poll::Pending => None,
        }
    }

    async fn wait_activity(&mut self) -> WaitOutcome {
        let timeout = Timer::after(Duration::from_millis(RX_WAIT_TIMEOUT_MS));
        match embassy_futures::select::select(self.rx.receive_async(), timeout).await {
            embassy_futures::select::Either::First(Ok(frame)) => {
                self.pending = Some(from_esp_frame(&frame));
                WaitOutcome::Activity
            }
            embassy_futures::select::Either::First(Err(e)) => {
                // Activity that produced no usable frame; nothing to drain
                warn!("can: receive error: {:?}", e);
                WaitOutcome::Activity
            }
            embassy_futures::select::Either::Second(()) => WaitOutcome::TimedOut,
        }
    }
}
