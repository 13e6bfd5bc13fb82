pub mod dispatcher;
pub mod resolver;
pub mod traits;

pub use dispatcher::Dispatcher;
pub use resolver::{resolve_address, resolve_speed_profile, JumperPins, NodeAddress, SpeedProfile};
pub use traits::{BusError, CanBus, ResetControl, WaitOutcome};
