//! Link frame encoder and paced transmitter.
use crate::error::{ConfigError, SerializationError};
use crate::infra::codec::traits::WireRecord;
use crate::protocol::link::record::TelemetryRecord;
use crate::protocol::link::{xor_checksum, LinkConfig, FRAME_LEN, START_MARKER};
use crate::protocol::polling::store::TelemetryStore;
use crate::protocol::transport::traits::clock::elapsed_ms;
use crate::protocol::transport::traits::serial_port::SerialWrite;

/// Encode `record` as a complete link frame into `out`.
///
/// Returns the number of bytes written ([`FRAME_LEN`]).
pub fn encode_frame(record: &TelemetryRecord, out: &mut [u8]) -> Result<usize, SerializationError> {
    if out.len() < FRAME_LEN {
        return Err(SerializationError::BufferTooSmall {
            needed: FRAME_LEN,
            available: out.len(),
        });
    }
    let payload_len = TelemetryRecord::ENCODED_LEN;
    out[0] = START_MARKER;
    out[1] = payload_len as u8;
    let written = record.encode_into(&mut out[2..2 + payload_len])?;
    out[2 + written] = xor_checksum(&out[2..2 + written]);
    Ok(written + 3)
}

/// Outcome of a transmitter tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitOutcome {
    /// The interval has not elapsed since the last frame.
    NotDue,
    /// Not enough room in the serial transmit buffer; retried next tick.
    Deferred,
    /// A full frame carrying `sequence` was handed to the port.
    Sent { sequence: u8 },
    /// The port refused the write. The slot is consumed.
    Failed,
}

/// Sends a store snapshot every `transmit_interval_ms`, never writing a
/// partial frame.
#[derive(Debug)]
pub struct LinkTransmitter {
    config: LinkConfig,
    last_sent_at: Option<u32>,
    frames_sent: u32,
    frames_deferred: u32,
    write_errors: u32,
}

impl LinkTransmitter {
    /// Validates `config`; the first frame goes out on the first tick.
    pub fn new(config: LinkConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            last_sent_at: None,
            frames_sent: 0,
            frames_deferred: 0,
            write_errors: 0,
        })
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Frames fully written so far.
    pub fn frames_sent(&self) -> u32 {
        self.frames_sent
    }

    /// Ticks where a due frame had to wait for buffer room.
    pub fn frames_deferred(&self) -> u32 {
        self.frames_deferred
    }

    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }

    fn is_due(&self, now: u32) -> bool {
        match self.last_sent_at {
            None => true,
            Some(sent_at) => elapsed_ms(now, sent_at) >= self.config.transmit_interval_ms,
        }
    }

    /// Transmit a fresh snapshot of `store` if due and the port has room.
    ///
    /// The store's sequence counter only advances when a frame actually goes
    /// out, so deferrals never show up as gaps on the receiving side.
    pub fn tick<W: SerialWrite>(
        &mut self,
        port: &mut W,
        store: &mut TelemetryStore,
        now: u32,
    ) -> TransmitOutcome {
        if !self.is_due(now) {
            return TransmitOutcome::NotDue;
        }
        if port.write_capacity() < FRAME_LEN {
            self.frames_deferred = self.frames_deferred.wrapping_add(1);
            #[cfg(feature = "defmt")]
            defmt::trace!(
                "Link transmit deferred: capacity {} < {}",
                port.write_capacity(),
                FRAME_LEN
            );
            return TransmitOutcome::Deferred;
        }

        let record = store.snapshot();
        let mut frame = [0u8; FRAME_LEN];
        let outcome = match encode_frame(&record, &mut frame) {
            Ok(len) => match port.write(&frame[..len]) {
                Ok(()) => {
                    self.frames_sent = self.frames_sent.wrapping_add(1);
                    TransmitOutcome::Sent {
                        sequence: record.sequence,
                    }
                }
                Err(_err) => {
                    self.write_errors = self.write_errors.wrapping_add(1);
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Link write failed: {}", defmt::Debug2Format(&_err));
                    TransmitOutcome::Failed
                }
            },
            Err(_err) => {
                self.write_errors = self.write_errors.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::warn!("Link frame encoding failed: {}", _err);
                TransmitOutcome::Failed
            }
        };
        self.last_sent_at = Some(now);
        outcome
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
