//! Fixed telemetry record carried by the serial link.
//!
//! The wire form is packed little-endian, fields in declaration order, 41
//! bytes. Float fields are IEEE-754 single precision.
use crate::error::{DeserializationError, SerializationError};
use crate::infra::codec::bytes::{ByteReader, ByteWriter};
use crate::infra::codec::traits::WireRecord;

/// Layout revision of [`TelemetryRecord`]; bump on any field change.
pub const RECORD_VERSION: u8 = 1;

/// Snapshot of every polled value, as sent to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryRecord {
    /// Wrapping counter, incremented for each snapshot.
    pub sequence: u8,
    pub engine_speed_rpm: f32,
    /// Positive when the pack is discharging.
    pub hv_current_a: f32,
    pub hv_voltage_v: f32,
    pub coolant_temp_c: f32,
    pub hv_intake_temp_c: f32,
    pub battery_temp1_c: f32,
    pub battery_temp2_c: f32,
    pub battery_temp3_c: f32,
    pub state_of_charge_pct: f32,
    /// Signed regen/assist bar level.
    pub energy_bar: i8,
    pub engine_state: u8,
    pub battery_fan_speed: u8,
    pub battery_fan_request: u8,
}

impl TelemetryRecord {
    /// Pack power in watts (voltage × current).
    pub fn power_w(&self) -> f32 {
        self.hv_voltage_v * self.hv_current_a
    }

    /// Mean of the three pack temperature probes.
    pub fn battery_temp_avg_c(&self) -> f32 {
        (self.battery_temp1_c + self.battery_temp2_c + self.battery_temp3_c) / 3.0
    }
}

/// Celsius to Fahrenheit.
pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}

impl WireRecord for TelemetryRecord {
    const ENCODED_LEN: usize = 41;

    fn decode_from(data: &[u8]) -> Result<Self, DeserializationError> {
        if data.len() != Self::ENCODED_LEN {
            return Err(DeserializationError::InvalidDataLength {
                expected: Self::ENCODED_LEN,
                actual: data.len(),
            });
        }
        let mut reader = ByteReader::new(data);
        Ok(Self {
            sequence: reader.read_u8()?,
            engine_speed_rpm: reader.read_f32()?,
            hv_current_a: reader.read_f32()?,
            hv_voltage_v: reader.read_f32()?,
            coolant_temp_c: reader.read_f32()?,
            hv_intake_temp_c: reader.read_f32()?,
            battery_temp1_c: reader.read_f32()?,
            battery_temp2_c: reader.read_f32()?,
            battery_temp3_c: reader.read_f32()?,
            state_of_charge_pct: reader.read_f32()?,
            energy_bar: reader.read_i8()?,
            engine_state: reader.read_u8()?,
            battery_fan_speed: reader.read_u8()?,
            battery_fan_request: reader.read_u8()?,
        })
    }

    fn encode_into(&self, buffer: &mut [u8]) -> Result<usize, SerializationError> {
        if buffer.len() < Self::ENCODED_LEN {
            return Err(SerializationError::BufferTooSmall {
                needed: Self::ENCODED_LEN,
                available: buffer.len(),
            });
        }
        let mut writer = ByteWriter::new(buffer);
        writer.write_u8(self.sequence)?;
        writer.write_f32(self.engine_speed_rpm)?;
        writer.write_f32(self.hv_current_a)?;
        writer.write_f32(self.hv_voltage_v)?;
        writer.write_f32(self.coolant_temp_c)?;
        writer.write_f32(self.hv_intake_temp_c)?;
        writer.write_f32(self.battery_temp1_c)?;
        writer.write_f32(self.battery_temp2_c)?;
        writer.write_f32(self.battery_temp3_c)?;
        writer.write_f32(self.state_of_charge_pct)?;
        writer.write_i8(self.energy_bar)?;
        writer.write_u8(self.engine_state)?;
        writer.write_u8(self.battery_fan_speed)?;
        writer.write_u8(self.battery_fan_request)?;
        Ok(writer.position())
    }
}
