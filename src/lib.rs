#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod config;
pub mod protocol;
pub mod sampler;
pub mod settings;
pub mod storage;

// These modules depend on esp-hal/embassy and are only available with the
// embedded feature
#[cfg(feature = "embedded")]
pub mod hardware;
#[cfg(feature = "embedded")]
pub mod tasks;
