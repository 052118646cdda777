//! Byte-at-a-time link frame decoder and the receiver keeping the last good
//! record.
//!
//! The decoder never blocks and never fails: every byte moves it one step
//! through `AwaitStart → AwaitLength → AwaitPayload → AwaitChecksum`, and the
//! checksum byte always returns it to `AwaitStart`, whatever its value.
use crate::error::ConfigError;
use crate::infra::codec::traits::WireRecord;
use crate::protocol::link::record::TelemetryRecord;
use crate::protocol::link::{xor_checksum, LinkConfig, MAX_LINK_PAYLOAD, START_MARKER};
use crate::protocol::transport::traits::clock::elapsed_ms;
use crate::protocol::transport::traits::serial_port::SerialRead;

/// Decoder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxState {
    AwaitStart,
    AwaitLength,
    AwaitPayload { expected: usize, received: usize },
    AwaitChecksum { expected: usize },
}

/// Why a frame was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RejectReason {
    /// Length byte was zero or above [`MAX_LINK_PAYLOAD`].
    InvalidLength { len: u8 },
    /// Checksum byte differs from the XOR of the payload.
    ChecksumMismatch { expected: u8, actual: u8 },
    /// Intact frame whose payload is not a telemetry record.
    UnexpectedPayloadLength { len: usize },
}

/// Result of feeding a byte.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FeedResult {
    /// Byte consumed, no frame finished.
    Pending,
    /// A verified record.
    Published(TelemetryRecord),
    Rejected(RejectReason),
}

/// Link frame state machine.
#[derive(Debug, Clone)]
pub struct LinkDecoder {
    state: RxState,
    payload: [u8; MAX_LINK_PAYLOAD],
}

impl Default for LinkDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkDecoder {
    pub const fn new() -> Self {
        Self {
            state: RxState::AwaitStart,
            payload: [0; MAX_LINK_PAYLOAD],
        }
    }

    pub fn state(&self) -> RxState {
        self.state
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.state = RxState::AwaitStart;
    }

    /// Advance the state machine by one byte.
    pub fn feed(&mut self, byte: u8) -> FeedResult {
        match self.state {
            RxState::AwaitStart => {
                if byte == START_MARKER {
                    self.state = RxState::AwaitLength;
                }
                FeedResult::Pending
            }
            RxState::AwaitLength => {
                let len = byte as usize;
                if len == 0 || len > MAX_LINK_PAYLOAD {
                    // The rejected byte is not re-examined as a start marker.
                    self.state = RxState::AwaitStart;
                    return FeedResult::Rejected(RejectReason::InvalidLength { len: byte });
                }
                self.state = RxState::AwaitPayload {
                    expected: len,
                    received: 0,
                };
                FeedResult::Pending
            }
            RxState::AwaitPayload { expected, received } => {
                self.payload[received] = byte;
                let received = received + 1;
                self.state = if received == expected {
                    RxState::AwaitChecksum { expected }
                } else {
                    RxState::AwaitPayload { expected, received }
                };
                FeedResult::Pending
            }
            RxState::AwaitChecksum { expected } => {
                self.state = RxState::AwaitStart;
                let payload = &self.payload[..expected];
                let computed = xor_checksum(payload);
                if computed != byte {
                    return FeedResult::Rejected(RejectReason::ChecksumMismatch {
                        expected: computed,
                        actual: byte,
                    });
                }
                match TelemetryRecord::decode_from(payload) {
                    Ok(record) => FeedResult::Published(record),
                    Err(_) => FeedResult::Rejected(RejectReason::UnexpectedPayloadLength {
                        len: expected,
                    }),
                }
            }
        }
    }
}

//==================================================================================RECEIVER
/// Receive-side counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    pub accepted: u32,
    pub checksum_failures: u32,
    /// Invalid length bytes and intact frames of the wrong size.
    pub length_rejections: u32,
    /// Accepted records whose sequence did not follow the previous one.
    pub sequence_gaps: u32,
    pub read_errors: u32,
}

/// Outcome of one receive tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceiveReport {
    pub bytes_read: usize,
    pub records_published: usize,
    pub frames_rejected: usize,
}

/// Drains a serial port into a [`LinkDecoder`] and keeps the last good record.
#[derive(Debug, Clone)]
pub struct LinkReceiver {
    config: LinkConfig,
    decoder: LinkDecoder,
    latest: Option<TelemetryRecord>,
    received_at_ms: Option<u32>,
    stats: LinkStats,
}

impl LinkReceiver {
    pub fn new(config: LinkConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            decoder: LinkDecoder::new(),
            latest: None,
            received_at_ms: None,
            stats: LinkStats::default(),
        })
    }

    /// Read at most `max_rx_bytes_per_tick` bytes and decode them.
    ///
    /// A read error ends the tick early; bytes already decoded are kept.
    pub fn tick<R: SerialRead>(&mut self, port: &mut R, now: u32) -> ReceiveReport {
        let mut report = ReceiveReport::default();
        while report.bytes_read < self.config.max_rx_bytes_per_tick {
            let byte = match port.try_read_byte() {
                Ok(Some(byte)) => byte,
                Ok(None) => break,
                Err(_err) => {
                    self.stats.read_errors = self.stats.read_errors.wrapping_add(1);
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Serial read failed: {}", defmt::Debug2Format(&_err));
                    break;
                }
            };
            report.bytes_read += 1;
            match self.decoder.feed(byte) {
                FeedResult::Pending => {}
                FeedResult::Published(record) => {
                    self.accept(record, now);
                    report.records_published += 1;
                }
                FeedResult::Rejected(reason) => {
                    self.reject(reason);
                    report.frames_rejected += 1;
                }
            }
        }
        report
    }

    fn accept(&mut self, record: TelemetryRecord, now: u32) {
        if let Some(previous) = &self.latest {
            if record.sequence != previous.sequence.wrapping_add(1) {
                self.stats.sequence_gaps = self.stats.sequence_gaps.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::debug!(
                    "Link sequence gap: {} after {}",
                    record.sequence,
                    previous.sequence
                );
            }
        }
        self.stats.accepted = self.stats.accepted.wrapping_add(1);
        self.latest = Some(record);
        self.received_at_ms = Some(now);
    }

    fn reject(&mut self, reason: RejectReason) {
        #[cfg(feature = "defmt")]
        defmt::debug!("Link frame rejected: {}", reason);
        match reason {
            RejectReason::ChecksumMismatch { .. } => {
                self.stats.checksum_failures = self.stats.checksum_failures.wrapping_add(1);
            }
            RejectReason::InvalidLength { .. } | RejectReason::UnexpectedPayloadLength { .. } => {
                self.stats.length_rejections = self.stats.length_rejections.wrapping_add(1);
            }
        }
    }

    /// Last record that passed every check.
    pub fn latest(&self) -> Option<&TelemetryRecord> {
        self.latest.as_ref()
    }

    /// Reception time of [`LinkReceiver::latest`].
    pub fn received_at_ms(&self) -> Option<u32> {
        self.received_at_ms
    }

    /// Whether the latest record is younger than the staleness threshold.
    pub fn is_fresh(&self, now: u32) -> bool {
        match self.received_at_ms {
            Some(at) => elapsed_ms(now, at) < self.config.staleness_ms,
            None => false,
        }
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn decoder(&self) -> &LinkDecoder {
        &self.decoder
    }
}
