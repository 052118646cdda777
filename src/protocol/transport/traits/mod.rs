//! Abstraction traits used by the transport layer (CAN bus, serial link,
//! monotonic clock, and loop timer).
pub mod can_bus;
pub mod clock;
pub mod loop_timer;
pub mod serial_port;
