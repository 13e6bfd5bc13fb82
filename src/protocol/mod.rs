pub mod frame;
pub mod opcode;

pub use frame::{CanFrame, IdKind};
pub use opcode::{announcement_frame, broadcast_sensors_frame, stats_frame, Opcode};
