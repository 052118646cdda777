//! `dashlink` library: a `no_std` hybrid-vehicle telemetry relay. Polls an
//! ECU over CAN for a rotating set of sensor values, reassembles segmented
//! replies, and streams checksum-protected records to a dashboard over a
//! serial link.
#![no_std]
//==================================================================================
#[cfg(test)]
extern crate std;
//==================================================================================
/// Domain and low-level errors (frame construction, configuration,
/// record serialization and deserialization).
pub mod error;
/// Byte codec and `embassy-time` glue.
pub mod infra;
/// CAN transport, sensor table, polling, serial link and node runners.
pub mod protocol;
//==================================================================================
