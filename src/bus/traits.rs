//! Bus and reset traits for abstraction and testability
//!
//! These traits define the hardware boundary of the dispatcher, allowing
//! the real TWAI peripheral and reset controller to be swapped with mocks
//! for testing.

use core::future::Future;

use crate::protocol::frame::CanFrame;

/// Errors that can occur while transmitting on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// No transmit slot became available within the transmit timeout
    Timeout,
    /// The peripheral reported a transmit failure
    TransmitFailed,
}

/// Outcome of the dispatcher's timed wait for bus activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Inbound frames are pending
    Activity,
    /// The announcement timeout elapsed with no activity
    TimedOut,
}

/// Abstract bus interface for the dispatcher
pub trait CanBus {
    /// Transmit one frame, waiting up to the transmit timeout for a slot
    fn transmit(&mut self, frame: &CanFrame) -> impl Future<Output = Result<(), BusError>>;

    /// Drain the next pending inbound frame without blocking
    fn try_receive(&mut self) -> Option<CanFrame>;

    /// Block until inbound activity or the announcement timeout elapses
    fn wait_activity(&mut self) -> impl Future<Output = WaitOutcome>;
}

/// Hardware reset hook.
///
/// The real implementation lets in-flight log and bus activity settle for a
/// short fixed delay, then resets the processor and never returns. Mocks
/// return so tests can observe the call.
pub trait ResetControl {
    fn reset_system(&mut self) -> impl Future<Output = ()>;
}
