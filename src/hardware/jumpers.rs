//! Boot jumper inputs
//!
//! The three jumpers are read once at boot, before the scheduler starts.
//! The inputs must be constructed with pull-up bias; the constructor runs
//! the spin-wait settle delay so the levels are stable by the first read.

use esp_hal::gpio::Input;

use crate::bus::resolver::{self, JumperPins};

/// The address and speed jumper block
pub struct BootJumpers<'d> {
    addr0: Input<'d>,
    addr1: Input<'d>,
    speed: Input<'d>,
}

impl<'d> BootJumpers<'d> {
    /// Take ownership of the three pull-up inputs and let them settle
    pub fn new(addr0: Input<'d>, addr1: Input<'d>, speed: Input<'d>) -> Self {
        resolver::settle_inputs();
        Self { addr0, addr1, speed }
    }
}

impl JumperPins for BootJumpers<'_> {
    fn address_bit0(&self) -> bool {
        self.addr0.is_high()
    }

    fn address_bit1(&self) -> bool {
        self.addr1.is_high()
    }

    fn speed_select(&self) -> bool {
        self.speed.is_high()
    }
}
