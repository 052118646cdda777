//! Explicit field-by-field codec for the serial link records.
pub mod bytes;
pub mod traits;
