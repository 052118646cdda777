//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (frame construction,
//! configuration, record serialization/deserialization, etc.).
//!
//! None of these surface from the polling or link ticks: those paths absorb
//! every fault locally and only report counters.
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors that can occur while building an 11-bit CAN frame.
pub enum FrameBuildError {
    /// Identifier does not fit in the 11-bit standard range.
    #[error("Invalid standard identifier: {raw:#X}")]
    InvalidIdentifier { raw: u16 },
    /// Classic CAN frames carry at most eight payload bytes.
    #[error("Payload too long: {len} bytes (max 8)")]
    PayloadTooLong { len: usize },
    /// A single-frame request must carry between one and seven bytes.
    #[error("Invalid single-frame request length: {len}")]
    InvalidRequestLength { len: usize },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Rejected poll or link configuration.
pub enum ConfigError {
    /// The poll schedule holds no sensor.
    #[error("Poll schedule is empty")]
    EmptySchedule,
    /// More sensors than the schedule can hold.
    #[error("Poll schedule is full (capacity {capacity})")]
    ScheduleFull { capacity: usize },
    /// A zero reply timeout would skip every sensor.
    #[error("Reply timeout must be greater than zero")]
    ZeroReplyTimeout,
    /// Deadlines are compared as signed offsets, so they must stay within
    /// `i32::MAX` ms of the tick that set them.
    #[error("Reply timeout too long: {timeout_ms} ms (max {max_ms})")]
    ReplyTimeoutTooLong { timeout_ms: u32, max_ms: u32 },
    /// Requests and replies must travel on distinct identifiers.
    #[error("Request and response identifiers must differ")]
    IdenticalChannels,
    /// The link must transmit at a non-zero interval.
    #[error("Transmit interval must be greater than zero")]
    ZeroTransmitInterval,
    /// A zero staleness threshold would never report fresh data.
    #[error("Staleness threshold must be greater than zero")]
    ZeroStaleness,
}

//================================================================================CODEC_ERROR

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Issues encountered while serializing a telemetry record into a buffer.
pub enum SerializationError {
    /// Provided buffer is too small for the encoded record or frame.
    #[error("Buffer too small: needed {needed}, available {available}")]
    BufferTooSmall { needed: usize, available: usize },
    /// Failed while writing bytes into the output buffer.
    #[error("ByteWriter error: {err}")]
    ByteWriterError { err: ByteWriterError },
}

impl From<ByteWriterError> for SerializationError {
    fn from(err: ByteWriterError) -> Self {
        SerializationError::ByteWriterError { err }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised while deserializing a link payload into a telemetry record.
pub enum DeserializationError {
    /// Payload size does not match the record layout.
    #[error("Invalid data length: expected {expected}, got {actual}")]
    InvalidDataLength { expected: usize, actual: usize },
    /// Byte-level access on the buffer failed.
    #[error("ByteReader error: {err}")]
    ByteReaderError { err: ByteReaderError },
}

impl From<ByteReaderError> for DeserializationError {
    fn from(err: ByteReaderError) -> Self {
        DeserializationError::ByteReaderError { err }
    }
}

//==================================================================================BYTEREADER_ERRORS
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised during little-endian buffer reads.
pub enum ByteReaderError {
    /// Attempted to read past the end of the buffer.
    #[error("Attempted to read out of bounds -> asked: {asked}, available: {available}")]
    OutOfBounds { asked: usize, available: usize },
}
//==================================================================================BYTEWRITER_ERRORS
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised during little-endian buffer writes.
pub enum ByteWriterError {
    /// Attempted to write beyond the provided capacity.
    #[error("Attempted to write out of bounds -> asked: {asked}, available: {available}")]
    OutOfBounds { asked: usize, available: usize },
}
