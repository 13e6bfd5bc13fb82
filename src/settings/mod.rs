pub mod record;
pub mod store;

pub use record::{ConfigRecord, FirmwareVersion, RECORD_SIZE};
pub use store::{ConfigStore, SampleRateCell};
