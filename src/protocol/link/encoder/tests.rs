use super::*;
use crate::protocol::sensors::{Sensor, SensorValue};
use std::vec::Vec;

/// Serial port double with an adjustable transmit buffer.
struct BufferedPort {
    capacity: usize,
    written: Vec<u8>,
    fail: bool,
}

impl BufferedPort {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            written: Vec::new(),
            fail: false,
        }
    }
}

impl SerialWrite for BufferedPort {
    type Error = ();

    fn write_capacity(&self) -> usize {
        self.capacity
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.written.extend_from_slice(bytes);
        Ok(())
    }
}

#[test]
fn test_encode_frame_layout() {
    let record = TelemetryRecord {
        sequence: 3,
        engine_speed_rpm: 800.0,
        ..Default::default()
    };
    let mut out = [0u8; 64];
    let len = encode_frame(&record, &mut out).unwrap();
    assert_eq!(len, 44);
    assert_eq!(out[0], 0xAA);
    assert_eq!(out[1], 41);
    assert_eq!(out[2], 3);
    assert_eq!(out[43], xor_checksum(&out[2..43]));
}

#[test]
fn test_encode_frame_rejects_short_buffer() {
    let mut out = [0u8; 43];
    assert_eq!(
        encode_frame(&TelemetryRecord::default(), &mut out),
        Err(SerializationError::BufferTooSmall {
            needed: 44,
            available: 43
        })
    );
}

#[test]
/// Frames are paced at the configured interval.
fn test_transmit_pacing() {
    let mut transmitter = LinkTransmitter::new(LinkConfig::new()).unwrap();
    let mut store = TelemetryStore::new();
    let mut port = BufferedPort::with_capacity(256);

    assert_eq!(
        transmitter.tick(&mut port, &mut store, 0),
        TransmitOutcome::Sent { sequence: 0 }
    );
    assert_eq!(transmitter.tick(&mut port, &mut store, 99), TransmitOutcome::NotDue);
    assert_eq!(
        transmitter.tick(&mut port, &mut store, 100),
        TransmitOutcome::Sent { sequence: 1 }
    );
    assert_eq!(port.written.len(), 2 * FRAME_LEN);
    assert_eq!(transmitter.frames_sent(), 2);
}

#[test]
/// A short transmit buffer defers the whole frame without consuming a sequence.
fn test_deferred_when_buffer_full() {
    let mut transmitter = LinkTransmitter::new(LinkConfig::new()).unwrap();
    let mut store = TelemetryStore::new();
    store.update(Sensor::EngineSpeed, SensorValue::Float(900.0), 0);
    let mut port = BufferedPort::with_capacity(FRAME_LEN - 1);

    assert_eq!(transmitter.tick(&mut port, &mut store, 0), TransmitOutcome::Deferred);
    assert!(port.written.is_empty());

    port.capacity = FRAME_LEN;
    assert_eq!(
        transmitter.tick(&mut port, &mut store, 10),
        TransmitOutcome::Sent { sequence: 0 }
    );
    assert_eq!(transmitter.frames_deferred(), 1);
    let payload = &port.written[2..43];
    let record = TelemetryRecord::decode_from(payload).unwrap();
    assert_eq!(record.engine_speed_rpm, 900.0);
}

#[test]
fn test_write_failure_consumes_slot() {
    let mut transmitter = LinkTransmitter::new(LinkConfig::new()).unwrap();
    let mut store = TelemetryStore::new();
    let mut port = BufferedPort::with_capacity(256);
    port.fail = true;

    assert_eq!(transmitter.tick(&mut port, &mut store, 0), TransmitOutcome::Failed);
    assert_eq!(transmitter.tick(&mut port, &mut store, 50), TransmitOutcome::NotDue);
    assert_eq!(transmitter.write_errors(), 1);
}

#[test]
fn test_rejects_invalid_config() {
    assert_eq!(
        LinkTransmitter::new(LinkConfig::new().with_transmit_interval_ms(0)).err(),
        Some(ConfigError::ZeroTransmitInterval)
    );
}
