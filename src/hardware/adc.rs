//! Analog input acquisition
//!
//! Four single-ended channels on ADC1; the burst read returns them in the
//! board's channel order, which is the reverse of conversion order.

use esp_hal::analog::adc::{Adc, AdcPin};
use esp_hal::peripherals::{ADC1, GPIO1, GPIO2, GPIO3, GPIO7};
use esp_hal::Blocking;

use crate::config::sampling::CHANNELS;
use crate::sampler::AnalogSource;

/// The node's analog inputs
pub struct AnalogInputs<'d> {
    adc: Adc<'d, ADC1<'d>, Blocking>,
    ch0: AdcPin<GPIO1<'d>, ADC1<'d>>,
    ch1: AdcPin<GPIO2<'d>, ADC1<'d>>,
    ch2: AdcPin<GPIO3<'d>, ADC1<'d>>,
    ch3: AdcPin<GPIO7<'d>, ADC1<'d>>,
}

impl<'d> AnalogInputs<'d> {
    pub fn new(
        adc: Adc<'d, ADC1<'d>, Blocking>,
        ch0: AdcPin<GPIO1<'d>, ADC1<'d>>,
        ch1: AdcPin<GPIO2<'d>, ADC1<'d>>,
        ch2: AdcPin<GPIO3<'d>, ADC1<'d>>,
        ch3: AdcPin<GPIO7<'d>, ADC1<'d>>,
    ) -> Self {
        Self {
            adc,
            ch0,
            ch1,
            ch2,
            ch3,
        }
    }
}

impl AnalogSource for AnalogInputs<'_> {
    async fn sample(&mut self) -> [u16; CHANNELS] {
        let raw = [
            self.adc.read_blocking(&mut self.ch0),
            self.adc.read_blocking(&mut self.ch1),
            self.adc.read_blocking(&mut self.ch2),
            self.adc.read_blocking(&mut self.ch3),
        ];
        // remap conversion order to channel order
        [raw[3], raw[2], raw[1], raw[0]]
    }
}
