pub mod flash;

pub use flash::{flash_region, FlashError, FlashOps};
