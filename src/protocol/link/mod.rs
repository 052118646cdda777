//! Serial telemetry link between the bus-facing node and the dashboard.
//!
//! Frame layout:
//!
//! ```text
//! +------+-----+----------------+-----+
//! | 0xAA |  N  | payload[N]     | XOR |
//! +------+-----+----------------+-----+
//! ```
//!
//! `N` is between 1 and [`MAX_LINK_PAYLOAD`]. The checksum is the XOR of the
//! payload bytes only. The only payload currently published is a
//! [`record::TelemetryRecord`] (41 bytes).
use crate::error::ConfigError;
use crate::infra::codec::traits::WireRecord;
use crate::protocol::link::record::TelemetryRecord;

pub mod decoder;
pub mod encoder;
pub mod record;

/// First byte of every frame.
pub const START_MARKER: u8 = 0xAA;
/// Largest payload a frame may announce.
pub const MAX_LINK_PAYLOAD: usize = 128;
/// Start marker, length byte and checksum.
pub const FRAME_OVERHEAD: usize = 3;
/// Length of a frame carrying one telemetry record.
pub const FRAME_LEN: usize = FRAME_OVERHEAD + TelemetryRecord::ENCODED_LEN;

/// Default pause between two transmitted records (ms).
pub const TRANSMIT_INTERVAL_MS: u32 = 100;
/// Default age after which the last received record is considered stale (ms).
pub const STALENESS_MS: u32 = 500;
/// Default bound on bytes consumed from the serial port per receive tick.
pub const MAX_RX_BYTES_PER_TICK: usize = 256;

/// XOR of every byte in `payload`.
pub fn xor_checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, byte| acc ^ byte)
}

//==================================================================================LINK_CONFIG
/// Runtime tuning of both link ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    pub transmit_interval_ms: u32,
    pub staleness_ms: u32,
    pub max_rx_bytes_per_tick: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkConfig {
    pub const fn new() -> Self {
        Self {
            transmit_interval_ms: TRANSMIT_INTERVAL_MS,
            staleness_ms: STALENESS_MS,
            max_rx_bytes_per_tick: MAX_RX_BYTES_PER_TICK,
        }
    }

    pub fn with_transmit_interval_ms(mut self, interval_ms: u32) -> Self {
        self.transmit_interval_ms = interval_ms;
        self
    }

    pub fn with_staleness_ms(mut self, staleness_ms: u32) -> Self {
        self.staleness_ms = staleness_ms;
        self
    }

    /// Bound on bytes drained per receive tick. `0` is clamped to one byte.
    pub fn with_max_rx_bytes_per_tick(mut self, max_bytes: usize) -> Self {
        self.max_rx_bytes_per_tick = max_bytes.max(1);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transmit_interval_ms == 0 {
            return Err(ConfigError::ZeroTransmitInterval);
        }
        if self.staleness_ms == 0 {
            return Err(ConfigError::ZeroStaleness);
        }
        Ok(())
    }
}
