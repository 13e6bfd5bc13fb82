//! Periodic sensor broadcast task

use embassy_time::{Duration, Instant, Timer};

use crate::hardware::AnalogInputs;
use crate::protocol::broadcast_sensors_frame;
use crate::sampler::{next_delay_ms, sample_period_ms, scale_sample, AnalogSource};
use crate::tasks::{SAMPLE_RATE, TX_CHANNEL};

#[embassy_executor::task]
pub async fn sampler_task(mut inputs: AnalogInputs<'static>, base_id: u32) {
    loop {
        let period = sample_period_ms(SAMPLE_RATE.read());
        let started = Instant::now();

        let raw = inputs.sample().await;
        let scaled = raw.map(scale_sample);

        TX_CHANNEL
            .send(broadcast_sensors_frame(base_id, &scaled))
            .await;

        let elapsed = started.elapsed().as_millis();
        Timer::after(Duration::from_millis(next_delay_ms(period, elapsed))).await;
    }
}
