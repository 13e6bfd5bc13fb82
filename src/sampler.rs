//! Periodic sampler support
//!
//! The sampler thread reads all four analog inputs, broadcasts a telemetry
//! frame and sleeps out the remainder of the sample period. The raw
//! conversion hardware sits behind [`AnalogSource`]; the timing and
//! scaling arithmetic lives here where it can be tested.

use core::future::Future;

use crate::config::sampling::CHANNELS;

/// Scale factor from raw 12-bit readings to the 0-5 V telemetry range
const ADC_SCALING: f32 = 1.0 / 0.80688;

/// Scale one raw 12-bit sample to the broadcast representation
pub fn scale_sample(raw: u16) -> u16 {
    (raw as f32 * ADC_SCALING) as u16
}

/// Sample period in milliseconds for a given rate.
///
/// The configuration store guarantees the rate is never zero; the max
/// guard here only keeps the division total.
pub fn sample_period_ms(rate_hz: u8) -> u64 {
    1000 / rate_hz.max(1) as u64
}

/// Remaining sleep after `elapsed_ms` of sampling and transmission work.
///
/// Drift-compensated: the next period starts `period_ms` after the last
/// one did. When the work overran the period the result clamps to zero
/// instead of wrapping to a huge delay.
pub fn next_delay_ms(period_ms: u64, elapsed_ms: u64) -> u64 {
    period_ms.saturating_sub(elapsed_ms)
}

/// Abstract analog acquisition interface for testability
pub trait AnalogSource {
    /// Read all channels once, in channel order, raw 12-bit values
    fn sample(&mut self) -> impl Future<Output = [u16; CHANNELS]>;
}

#[cfg(test)]
pub mod mock {
    //! Mock analog source for testing

    use super::*;
    use core::cell::RefCell;

    /// Mock source returning a fixed reading and counting conversions
    pub struct MockAnalogSource {
        reading: [u16; CHANNELS],
        sample_count: RefCell<u32>,
    }

    impl MockAnalogSource {
        pub fn new(reading: [u16; CHANNELS]) -> Self {
            Self {
                reading,
                sample_count: RefCell::new(0),
            }
        }

        /// Number of sample calls so far
        pub fn sample_count(&self) -> u32 {
            *self.sample_count.borrow()
        }
    }

    impl AnalogSource for MockAnalogSource {
        async fn sample(&mut self) -> [u16; CHANNELS] {
            *self.sample_count.borrow_mut() += 1;
            self.reading
        }
    }
}
