//! Minimal abstraction for a non-blocking CAN bus. Allows the library to plug
//! into various implementations (embedded HAL, desktop driver, test double).
use crate::protocol::transport::can_frame::CanFrame;

/// Contract to send and poll CAN frames without ever blocking the caller.
pub trait CanBus {
    type Error: core::fmt::Debug;
    /// Queue a frame for transmission. Must return immediately; a full
    /// transmit mailbox is reported as an error, not waited on.
    fn try_send(&mut self, frame: &CanFrame) -> Result<(), Self::Error>;
    /// Pop the next received frame, or `Ok(None)` when nothing is pending.
    fn try_recv(&mut self) -> Result<Option<CanFrame>, Self::Error>;
}
