//! Hardware implementations of the core's boundary traits
//!
//! Everything in here talks to esp-hal peripherals and is only compiled
//! for embedded builds.

pub mod adc;
pub mod flash;
pub mod jumpers;
pub mod reset;
pub mod twai;

pub use adc::AnalogInputs;
pub use flash::ConfigFlash;
pub use jumpers::BootJumpers;
pub use reset::SoftwareReset;
pub use twai::{baud_rate, to_esp_frame, TwaiBus};
