//! Bus protocol dispatcher
//!
//! Owns the provisioning state and the receive loop. The node starts
//! unprovisioned and announces itself on every receive timeout; the first
//! accepted configuration frame provisions it for the rest of the process
//! lifetime (only a power cycle clears the flag). Inbound frames are
//! classified by offset from the node's base address and dispatched in
//! arrival order; anything outside the opcode table is other nodes'
//! traffic and is dropped silently.

use log::{info, warn};

use crate::bus::resolver::NodeAddress;
use crate::bus::traits::{CanBus, ResetControl, WaitOutcome};
use crate::protocol::frame::CanFrame;
use crate::protocol::opcode::{announcement_frame, stats_frame, Opcode};
use crate::settings::store::ConfigStore;
use crate::storage::flash::FlashOps;

/// The bus protocol dispatcher.
///
/// Exclusive owner of the bus receive side, the reset hook and the
/// configuration store.
pub struct Dispatcher<'a, B: CanBus, R: ResetControl, F: FlashOps> {
    bus: B,
    reset: R,
    store: ConfigStore<'a, F>,
    address: NodeAddress,
    provisioned: bool,
}

impl<'a, B: CanBus, R: ResetControl, F: FlashOps> Dispatcher<'a, B, R, F> {
    /// Create a dispatcher in the unprovisioned state.
    ///
    /// The store should already be loaded; the address comes from the boot
    /// resolver and never changes.
    pub fn new(bus: B, reset: R, store: ConfigStore<'a, F>, address: NodeAddress) -> Self {
        Self {
            bus,
            reset,
            store,
            address,
            provisioned: false,
        }
    }

    /// Whether a configuration frame has been accepted since power-up
    pub fn is_provisioned(&self) -> bool {
        self.provisioned
    }

    /// The node's resolved base identifier
    pub fn base_id(&self) -> u32 {
        self.address.base_id()
    }

    /// The configuration store
    pub fn config(&self) -> &ConfigStore<'a, F> {
        &self.store
    }

    /// The bus interface
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// The reset hook
    pub fn reset_control(&self) -> &R {
        &self.reset
    }

    /// Broadcast the presence announcement
    pub async fn send_announcement(&mut self) {
        let frame = announcement_frame(self.address.base_id());
        match self.bus.transmit(&frame).await {
            Ok(()) => info!("bus: broadcast announcement"),
            Err(e) => warn!("bus: announcement transmit failed: {:?}", e),
        }
    }

    /// Broadcast the stats beacon
    pub async fn send_stats(&mut self) {
        let frame = stats_frame(self.address.base_id());
        match self.bus.transmit(&frame).await {
            Ok(()) => info!("bus: broadcast stats"),
            Err(e) => warn!("bus: stats transmit failed: {:?}", e),
        }
    }

    /// Classify and handle one inbound frame
    pub async fn dispatch(&mut self, frame: &CanFrame) {
        let Some(opcode) = Opcode::classify(frame.id, self.address.base_id()) else {
            // other nodes' traffic on the shared bus
            return;
        };

        match opcode {
            Opcode::ResetDevice => {
                info!("bus: reset requested");
                self.reset.reset_system().await;
            }
            Opcode::SetConfigGroup1 => self.handle_set_config_group_1(frame),
            // Our own outbound-only opcodes arriving inbound: bus echo or
            // another node at a colliding offset, benign either way
            Opcode::Announcement | Opcode::Stats | Opcode::BroadcastSensors => {}
        }
    }

    fn handle_set_config_group_1(&mut self, frame: &CanFrame) {
        if frame.payload().len() < Opcode::SetConfigGroup1.required_len() {
            warn!("bus: invalid params for set config group 1");
            return;
        }

        let sample_rate = frame.payload()[0];
        if !self.store.set_sample_rate(sample_rate) {
            return;
        }
        if let Err(e) = self.store.commit_if_changed() {
            warn!("config: persist failed: {:?}", e);
        }

        // Any accepted configuration frame provisions the node, persisted
        // or not; the announcement retry loop stops here.
        self.provisioned = true;
        info!("bus: provisioned, sample rate {} Hz", sample_rate);
    }

    /// One cycle of the receive loop: a timed wait, then either a
    /// re-announcement (still unprovisioned) or a full drain of the
    /// pending inbound frames in arrival order.
    pub async fn service(&mut self) {
        match self.bus.wait_activity().await {
            WaitOutcome::TimedOut => {
                if !self.provisioned {
                    self.send_announcement().await;
                }
            }
            WaitOutcome::Activity => {
                while let Some(frame) = self.bus.try_receive() {
                    self.dispatch(&frame).await;
                }
            }
        }
    }

    /// The receive loop: initial announcement, then service cycles forever
    pub async fn run(&mut self) {
        self.send_announcement().await;
        loop {
            self.service().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::resolver::NodeAddress;
    use crate::bus::traits::mock::{MockCanBus, MockReset};
    use crate::bus::traits::BusError;
    use crate::config::sampling::DEFAULT_SAMPLE_RATE_HZ;
    use crate::protocol::frame::IdKind;
    use crate::settings::record::ConfigRecord;
    use crate::settings::store::SampleRateCell;
    use crate::storage::flash::mock::MockFlash;

    const REGION: u32 = 0;

    fn dispatcher<'a>(
        bus: MockCanBus,
        cell: &'a SampleRateCell,
        offset: u32,
    ) -> Dispatcher<'a, MockCanBus, MockReset, MockFlash> {
        let flash = MockFlash::new();
        // Persist current defaults so load performs no migration write
        flash.preload(REGION, &ConfigRecord::defaults().to_bytes());
        let mut store = ConfigStore::new(flash, REGION, cell);
        store.load();
        Dispatcher::new(bus, MockReset::new(), store, NodeAddress::from_offset(offset))
    }

    fn set_config_frame(base_id: u32, payload: &[u8]) -> CanFrame {
        CanFrame::new_rx(IdKind::Extended, base_id + 3, payload)
    }

    #[test]
    fn test_set_config_provisions_and_persists() {
        let cell = SampleRateCell::new(0);
        let mut d = dispatcher(MockCanBus::new(), &cell, 0);

        futures::executor::block_on(async {
            let frame = set_config_frame(d.base_id(), &[20]);
            d.dispatch(&frame).await;
        });

        assert!(d.is_provisioned());
        assert_eq!(d.config().sample_rate(), 20);
        assert_eq!(cell.read(), 20);
        // Exactly one flash write (one record word)
        assert_eq!(d.config().flash().program_calls(), 1);
    }

    #[test]
    fn test_undersized_config_frame_dropped() {
        let cell = SampleRateCell::new(0);
        let mut d = dispatcher(MockCanBus::new(), &cell, 0);

        futures::executor::block_on(async {
            let frame = set_config_frame(d.base_id(), &[]);
            d.dispatch(&frame).await;
        });

        assert!(!d.is_provisioned());
        assert_eq!(d.config().sample_rate(), DEFAULT_SAMPLE_RATE_HZ);
        assert_eq!(d.config().flash().program_calls(), 0);
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        let cell = SampleRateCell::new(0);
        let mut d = dispatcher(MockCanBus::new(), &cell, 0);

        futures::executor::block_on(async {
            let frame = set_config_frame(d.base_id(), &[0]);
            d.dispatch(&frame).await;
        });

        assert!(!d.is_provisioned());
        assert_eq!(d.config().sample_rate(), DEFAULT_SAMPLE_RATE_HZ);
        assert_eq!(d.config().flash().program_calls(), 0);
    }

    #[test]
    fn test_repeated_config_frames_write_flash_once() {
        let cell = SampleRateCell::new(0);
        let mut d = dispatcher(MockCanBus::new(), &cell, 0);

        futures::executor::block_on(async {
            let frame = set_config_frame(d.base_id(), &[20]);
            d.dispatch(&frame).await;
            d.dispatch(&frame).await;
            d.dispatch(&frame).await;
        });

        assert_eq!(d.config().sample_rate(), 20);
        assert_eq!(d.config().flash().program_calls(), 1);
    }

    #[test]
    fn test_reset_frame_triggers_reset() {
        let cell = SampleRateCell::new(0);
        let mut d = dispatcher(MockCanBus::new(), &cell, 0);

        futures::executor::block_on(async {
            let frame = CanFrame::new_rx(IdKind::Extended, d.base_id() + 1, &[]);
            d.dispatch(&frame).await;
        });

        assert_eq!(d.reset_control().reset_count(), 1);
    }

    #[test]
    fn test_unknown_and_outbound_opcodes_ignored() {
        let cell = SampleRateCell::new(0);
        // Use a non-zero jumper offset to cover classification against a
        // shifted base
        let mut d = dispatcher(MockCanBus::new(), &cell, 2);
        let base = d.base_id();

        futures::executor::block_on(async {
            for id in [base + 7, base + 21, base - 1, 0x100] {
                d.dispatch(&CanFrame::new_rx(IdKind::Extended, id, &[1, 2, 3])).await;
            }
            // Our own outbound opcodes arriving inbound are benign
            for offset in [0u32, 2, 20] {
                d.dispatch(&CanFrame::new_rx(IdKind::Extended, base + offset, &[0; 8]))
                    .await;
            }
        });

        assert!(!d.is_provisioned());
        assert_eq!(d.reset_control().reset_count(), 0);
        assert_eq!(d.config().flash().program_calls(), 0);
        assert!(d.bus().tx_history().is_empty());
    }

    #[test]
    fn test_announcement_and_stats_frames() {
        let cell = SampleRateCell::new(0);
        let mut d = dispatcher(MockCanBus::new(), &cell, 1);
        let base = d.base_id();

        futures::executor::block_on(async {
            d.send_announcement().await;
            d.send_stats().await;
        });

        let history = d.bus().tx_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, base);
        assert_eq!(history[0].dlc, 8);
        assert_eq!(history[1].id, base + 2);
        assert_eq!(history[1].dlc, 3);
    }

    #[test]
    fn test_transmit_failure_is_not_fatal() {
        let cell = SampleRateCell::new(0);
        let bus = MockCanBus::new();
        bus.set_next_tx_error(BusError::Timeout);
        let mut d = dispatcher(bus, &cell, 0);

        futures::executor::block_on(async {
            d.send_announcement().await;
            // Dropped, next send goes through
            d.send_announcement().await;
        });

        assert_eq!(d.bus().tx_history().len(), 1);
    }

    #[test]
    fn test_service_reannounces_until_provisioned() {
        // End-to-end provisioning scenario: announcements on every timeout
        // until a config frame arrives, then silence and one flash write.
        let cell = SampleRateCell::new(0);
        let bus = MockCanBus::new();
        bus.script_wait(WaitOutcome::TimedOut);
        bus.script_wait(WaitOutcome::TimedOut);
        bus.script_wait(WaitOutcome::Activity);

        let mut d = dispatcher(bus, &cell, 0);
        d.bus()
            .queue_rx_frame(set_config_frame(d.base_id(), &[20]));

        futures::executor::block_on(async {
            // Two timeouts: two announcements
            d.service().await;
            d.service().await;
            assert_eq!(d.bus().tx_history().len(), 2);

            // Activity: the config frame provisions the node
            d.service().await;
            assert!(d.is_provisioned());
            assert_eq!(d.config().sample_rate(), 20);
            assert_eq!(cell.read(), 20);

            // Further timeouts no longer announce
            d.service().await;
            d.service().await;
        });

        assert_eq!(d.bus().tx_history().len(), 2);
        assert_eq!(d.config().flash().program_calls(), 1);
    }

    #[test]
    fn test_service_drains_frames_in_order() {
        let cell = SampleRateCell::new(0);
        let bus = MockCanBus::new();
        bus.script_wait(WaitOutcome::Activity);

        let mut d = dispatcher(bus, &cell, 0);
        let base = d.base_id();
        // Two config frames pending; the later one must win
        d.bus().queue_rx_frame(set_config_frame(base, &[10]));
        d.bus().queue_rx_frame(set_config_frame(base, &[30]));

        futures::executor::block_on(async {
            d.service().await;
        });

        assert_eq!(d.config().sample_rate(), 30);
    }
}
