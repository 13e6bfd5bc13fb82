//! Embassy tasks wiring the protocol core to the hardware

pub mod can;
pub mod sampler;
pub mod tx;

use core::sync::atomic::AtomicBool;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::config::sampling::DEFAULT_SAMPLE_RATE_HZ;
use crate::protocol::CanFrame;
use crate::settings::SampleRateCell;

/// Outbound frames from every producer, drained by the transmit pump.
pub static TX_CHANNEL: Channel<CriticalSectionRawMutex, CanFrame, 8> = Channel::new();

/// Set by the supervisor when a stats frame is due.
pub static STATS_DUE: AtomicBool = AtomicBool::new(false);

/// Live sample rate, published by the config store and read by the sampler.
pub static SAMPLE_RATE: SampleRateCell = SampleRateCell::new(DEFAULT_SAMPLE_RATE_HZ);
