//! Latest decoded value per sensor, written by the sequencer and read by the
//! link transmitter.
use crate::protocol::link::record::TelemetryRecord;
use crate::protocol::sensors::{Sensor, SensorValue};
use crate::protocol::transport::traits::clock::elapsed_ms;

/// Most recent reading of one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    pub value: Option<SensorValue>,
    pub updated_at_ms: Option<u32>,
}

/// One [`SensorReading`] per [`Sensor`] plus the outgoing record counter.
#[derive(Debug, Clone)]
pub struct TelemetryStore {
    readings: [SensorReading; Sensor::COUNT],
    sequence: u8,
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryStore {
    pub const fn new() -> Self {
        Self {
            readings: [SensorReading {
                value: None,
                updated_at_ms: None,
            }; Sensor::COUNT],
            sequence: 0,
        }
    }

    /// Record a freshly decoded value.
    pub fn update(&mut self, sensor: Sensor, value: SensorValue, now: u32) {
        self.readings[sensor.index()] = SensorReading {
            value: Some(value),
            updated_at_ms: Some(now),
        };
    }

    pub fn reading(&self, sensor: Sensor) -> &SensorReading {
        &self.readings[sensor.index()]
    }

    pub fn value(&self, sensor: Sensor) -> Option<SensorValue> {
        self.readings[sensor.index()].value
    }

    /// Milliseconds since `sensor` was last updated, `None` if never.
    pub fn age_ms(&self, sensor: Sensor, now: u32) -> Option<u32> {
        self.readings[sensor.index()]
            .updated_at_ms
            .map(|at| elapsed_ms(now, at))
    }

    /// Sequence number the next snapshot will carry.
    pub fn next_sequence(&self) -> u8 {
        self.sequence
    }

    fn float(&self, sensor: Sensor) -> f32 {
        self.value(sensor).map_or(0.0, |value| value.as_f32())
    }

    fn integer(&self, sensor: Sensor, min: i32, max: i32) -> i32 {
        self.value(sensor)
            .map_or(0, |value| value.as_i32().clamp(min, max))
    }

    /// Copy every value into a fresh record and advance the sequence counter.
    /// Missing values are sent as zero.
    pub fn snapshot(&mut self) -> TelemetryRecord {
        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        TelemetryRecord {
            sequence,
            engine_speed_rpm: self.float(Sensor::EngineSpeed),
            hv_current_a: self.float(Sensor::HvBatteryCurrent),
            hv_voltage_v: self.float(Sensor::HvBatteryVoltage),
            coolant_temp_c: self.float(Sensor::CoolantTemp),
            hv_intake_temp_c: self.float(Sensor::HvIntakeTemp),
            battery_temp1_c: self.float(Sensor::BatteryTemp1),
            battery_temp2_c: self.float(Sensor::BatteryTemp2),
            battery_temp3_c: self.float(Sensor::BatteryTemp3),
            state_of_charge_pct: self.float(Sensor::StateOfCharge),
            energy_bar: self.integer(Sensor::EnergyBar, i8::MIN as i32, i8::MAX as i32) as i8,
            engine_state: self.integer(Sensor::EngineState, 0, u8::MAX as i32) as u8,
            battery_fan_speed: self.integer(Sensor::BatteryFanSpeed, 0, u8::MAX as i32) as u8,
            battery_fan_request: self.integer(Sensor::BatteryFanRequest, 0, u8::MAX as i32) as u8,
        }
    }
}
