//! Non-blocking serial transport used by the telemetry link. Reads are polled
//! and writes are only attempted when the transport reports enough room.

/// Receive half of a serial link.
pub trait SerialRead {
    type Error: core::fmt::Debug;
    /// Pop the next received byte, or `Ok(None)` when the RX buffer is empty.
    fn try_read_byte(&mut self) -> Result<Option<u8>, Self::Error>;
}

/// Transmit half of a serial link.
pub trait SerialWrite {
    type Error: core::fmt::Debug;
    /// Bytes the transport can accept right now without blocking.
    fn write_capacity(&self) -> usize;
    /// Write `bytes` in one go. Callers check [`SerialWrite::write_capacity`]
    /// first, so implementations may assume the data fits.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}
