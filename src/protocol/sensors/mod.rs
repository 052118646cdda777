//! Sensor catalogue and decode table for the hybrid control ECU.
//!
//! Each [`Sensor`] maps to a fixed request (service byte + identifier bytes),
//! the position of its value inside the reply, and the scaling that turns the
//! raw word into physical units. Standard values use SAE J1979 mode `0x01`
//! PIDs; battery-pack and hybrid-system values use the ECU's mode `0x21`
//! local identifiers.
//!
//! | sensor | request | value bytes | physical value |
//! |---|---|---|---|
//! | `EngineSpeed` | `01 0C` | u16 BE @0 | raw / 4 rpm |
//! | `CoolantTemp` | `01 05` | u8 @0 | raw - 40 °C |
//! | `StateOfCharge` | `01 5B` | u8 @0 | raw × 100 / 255 % |
//! | `HvBatteryVoltage` | `21 87` | u16 BE @0 | raw / 100 V |
//! | `HvBatteryCurrent` | `21 87` | u16 BE @3 | raw / 100 - 327.68 A |
//! | `BatteryTemp1..3` | `21 87` | u8 @5, @6, @7 | raw - 40 °C |
//! | `HvIntakeTemp` | `21 87` | u8 @8 | raw - 40 °C |
//! | `EnergyBar` | `21 61` | i8 @0 | raw |
//! | `EngineState` | `21 61` | u8 @1 | raw |
//! | `BatteryFanSpeed` | `21 61` | u8 @2 | raw |
//! | `BatteryFanRequest` | `21 61` | u8 @3 | raw |
//!
//! The `21 87` battery block is 11 bytes long and always arrives as a first
//! frame plus one consecutive frame.

/// Offset added to the request service byte in a positive reply.
pub const POSITIVE_REPLY_OFFSET: u8 = 0x40;

//==================================================================================SENSOR
/// Every value the poller knows how to request, in record order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sensor {
    EngineSpeed,
    HvBatteryCurrent,
    HvBatteryVoltage,
    CoolantTemp,
    HvIntakeTemp,
    BatteryTemp1,
    BatteryTemp2,
    BatteryTemp3,
    StateOfCharge,
    EnergyBar,
    EngineState,
    BatteryFanSpeed,
    BatteryFanRequest,
}

impl Sensor {
    /// Number of known sensors.
    pub const COUNT: usize = 13;

    /// All sensors, in table order.
    pub const ALL: [Sensor; Sensor::COUNT] = [
        Sensor::EngineSpeed,
        Sensor::HvBatteryCurrent,
        Sensor::HvBatteryVoltage,
        Sensor::CoolantTemp,
        Sensor::HvIntakeTemp,
        Sensor::BatteryTemp1,
        Sensor::BatteryTemp2,
        Sensor::BatteryTemp3,
        Sensor::StateOfCharge,
        Sensor::EnergyBar,
        Sensor::EngineState,
        Sensor::BatteryFanSpeed,
        Sensor::BatteryFanRequest,
    ];

    /// Position of the sensor in [`Sensor::ALL`] and in the decode table.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Decode rules for this sensor.
    #[inline]
    pub fn descriptor(self) -> &'static SensorDescriptor {
        &SENSOR_TABLE[self.index()]
    }
}

//==================================================================================VALUES
/// Decoded sensor reading.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorValue {
    /// Scaled physical quantity.
    Float(f32),
    /// Raw integer (state codes, counters, signed bars).
    Integer(i32),
}

impl SensorValue {
    /// Value as a float, converting integers exactly where representable.
    pub fn as_f32(&self) -> f32 {
        match *self {
            SensorValue::Float(value) => value,
            SensorValue::Integer(value) => value as f32,
        }
    }

    /// Value as an integer, rounding floats to the nearest whole number.
    pub fn as_i32(&self) -> i32 {
        match *self {
            SensorValue::Float(value) => {
                // `f32::round` lives in std; add half away from zero then truncate.
                if value >= 0.0 {
                    (value + 0.5) as i32
                } else {
                    (value - 0.5) as i32
                }
            }
            SensorValue::Integer(value) => value,
        }
    }
}

//==================================================================================LAYOUT
/// Width of the raw value inside the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Width {
    One,
    /// Two bytes, most significant first.
    TwoBigEndian,
}

impl Width {
    pub const fn bytes(self) -> usize {
        match self {
            Width::One => 1,
            Width::TwoBigEndian => 2,
        }
    }
}

/// Where the raw value sits among the bytes following the echoed identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ValueLayout {
    pub offset: usize,
    pub width: Width,
    pub signed: bool,
}

impl ValueLayout {
    const fn unsigned(offset: usize, width: Width) -> Self {
        Self {
            offset,
            width,
            signed: false,
        }
    }

    const fn signed(offset: usize, width: Width) -> Self {
        Self {
            offset,
            width,
            signed: true,
        }
    }

    /// Number of value bytes a reply must carry for this layout.
    pub const fn required_len(&self) -> usize {
        self.offset + self.width.bytes()
    }

    /// Extract the raw value, sign-extending when the layout is signed.
    pub fn extract(&self, value_bytes: &[u8]) -> Option<i32> {
        let bytes = value_bytes.get(self.offset..self.required_len())?;
        let raw = match (self.width, self.signed) {
            (Width::One, false) => bytes[0] as i32,
            (Width::One, true) => bytes[0] as i8 as i32,
            (Width::TwoBigEndian, false) => u16::from_be_bytes([bytes[0], bytes[1]]) as i32,
            (Width::TwoBigEndian, true) => i16::from_be_bytes([bytes[0], bytes[1]]) as i32,
        };
        Some(raw)
    }
}

/// Conversion from the raw word to the reported value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Scaling {
    /// `raw * scale / divisor + offset`, reported as [`SensorValue::Float`].
    Linear { scale: f32, divisor: f32, offset: f32 },
    /// Raw integer, reported as [`SensorValue::Integer`].
    Raw,
}

impl Scaling {
    const fn divide(divisor: f32) -> Self {
        Scaling::Linear {
            scale: 1.0,
            divisor,
            offset: 0.0,
        }
    }

    const TEMPERATURE: Scaling = Scaling::Linear {
        scale: 1.0,
        divisor: 1.0,
        offset: -40.0,
    };

    pub fn apply(&self, raw: i32) -> SensorValue {
        match *self {
            Scaling::Linear {
                scale,
                divisor,
                offset,
            } => SensorValue::Float(raw as f32 * scale / divisor + offset),
            Scaling::Raw => SensorValue::Integer(raw),
        }
    }
}

//==================================================================================DESCRIPTOR
/// Decode rules for a single sensor.
#[derive(Debug)]
pub struct SensorDescriptor {
    /// Sensor described by this entry.
    pub sensor: Sensor,
    /// Human-readable name (diagnostics).
    pub name: &'static str,
    /// Request payload: service byte followed by its identifier bytes.
    pub request: &'static [u8],
    /// Position of the value after the echoed identifier.
    pub layout: ValueLayout,
    /// Raw to physical conversion.
    pub scaling: Scaling,
    /// Physical unit, empty for raw codes.
    pub unit: &'static str,
}

impl SensorDescriptor {
    /// Number of leading reply bytes echoing the request.
    #[inline]
    pub fn echo_len(&self) -> usize {
        self.request.len()
    }

    /// Whether `message` starts with the positive-reply echo of the request:
    /// `service + 0x40` followed by the same identifier bytes.
    pub fn matches_echo(&self, message: &[u8]) -> bool {
        let Some((service, identifier)) = self.request.split_first() else {
            return false;
        };
        match message.get(..self.echo_len()) {
            Some(echo) => {
                echo[0] == service.wrapping_add(POSITIVE_REPLY_OFFSET) && &echo[1..] == identifier
            }
            None => false,
        }
    }

    /// Decode the value bytes following the echo.
    pub fn decode(&self, value_bytes: &[u8]) -> Option<SensorValue> {
        self.layout
            .extract(value_bytes)
            .map(|raw| self.scaling.apply(raw))
    }
}

const REQ_ENGINE_SPEED: &[u8] = &[0x01, 0x0C];
const REQ_COOLANT_TEMP: &[u8] = &[0x01, 0x05];
const REQ_STATE_OF_CHARGE: &[u8] = &[0x01, 0x5B];
const REQ_BATTERY_BLOCK: &[u8] = &[0x21, 0x87];
const REQ_HYBRID_STATUS: &[u8] = &[0x21, 0x61];

/// Decode table, indexed by [`Sensor::index`].
static SENSOR_TABLE: [SensorDescriptor; Sensor::COUNT] = [
    SensorDescriptor {
        sensor: Sensor::EngineSpeed,
        name: "engine speed",
        request: REQ_ENGINE_SPEED,
        layout: ValueLayout::unsigned(0, Width::TwoBigEndian),
        scaling: Scaling::divide(4.0),
        unit: "rpm",
    },
    SensorDescriptor {
        sensor: Sensor::HvBatteryCurrent,
        name: "HV battery current",
        request: REQ_BATTERY_BLOCK,
        layout: ValueLayout::unsigned(3, Width::TwoBigEndian),
        scaling: Scaling::Linear {
            scale: 1.0,
            divisor: 100.0,
            offset: -327.68,
        },
        unit: "A",
    },
    SensorDescriptor {
        sensor: Sensor::HvBatteryVoltage,
        name: "HV battery voltage",
        request: REQ_BATTERY_BLOCK,
        layout: ValueLayout::unsigned(0, Width::TwoBigEndian),
        scaling: Scaling::divide(100.0),
        unit: "V",
    },
    SensorDescriptor {
        sensor: Sensor::CoolantTemp,
        name: "coolant temperature",
        request: REQ_COOLANT_TEMP,
        layout: ValueLayout::unsigned(0, Width::One),
        scaling: Scaling::TEMPERATURE,
        unit: "°C",
    },
    SensorDescriptor {
        sensor: Sensor::HvIntakeTemp,
        name: "HV battery intake temperature",
        request: REQ_BATTERY_BLOCK,
        layout: ValueLayout::unsigned(8, Width::One),
        scaling: Scaling::TEMPERATURE,
        unit: "°C",
    },
    SensorDescriptor {
        sensor: Sensor::BatteryTemp1,
        name: "battery temperature 1",
        request: REQ_BATTERY_BLOCK,
        layout: ValueLayout::unsigned(5, Width::One),
        scaling: Scaling::TEMPERATURE,
        unit: "°C",
    },
    SensorDescriptor {
        sensor: Sensor::BatteryTemp2,
        name: "battery temperature 2",
        request: REQ_BATTERY_BLOCK,
        layout: ValueLayout::unsigned(6, Width::One),
        scaling: Scaling::TEMPERATURE,
        unit: "°C",
    },
    SensorDescriptor {
        sensor: Sensor::BatteryTemp3,
        name: "battery temperature 3",
        request: REQ_BATTERY_BLOCK,
        layout: ValueLayout::unsigned(7, Width::One),
        scaling: Scaling::TEMPERATURE,
        unit: "°C",
    },
    SensorDescriptor {
        sensor: Sensor::StateOfCharge,
        name: "state of charge",
        request: REQ_STATE_OF_CHARGE,
        layout: ValueLayout::unsigned(0, Width::One),
        scaling: Scaling::Linear {
            scale: 100.0,
            divisor: 255.0,
            offset: 0.0,
        },
        unit: "%",
    },
    SensorDescriptor {
        sensor: Sensor::EnergyBar,
        name: "energy bar",
        request: REQ_HYBRID_STATUS,
        layout: ValueLayout::signed(0, Width::One),
        scaling: Scaling::Raw,
        unit: "",
    },
    SensorDescriptor {
        sensor: Sensor::EngineState,
        name: "engine state",
        request: REQ_HYBRID_STATUS,
        layout: ValueLayout::unsigned(1, Width::One),
        scaling: Scaling::Raw,
        unit: "",
    },
    SensorDescriptor {
        sensor: Sensor::BatteryFanSpeed,
        name: "battery fan speed",
        request: REQ_HYBRID_STATUS,
        layout: ValueLayout::unsigned(2, Width::One),
        scaling: Scaling::Raw,
        unit: "",
    },
    SensorDescriptor {
        sensor: Sensor::BatteryFanRequest,
        name: "battery fan request",
        request: REQ_HYBRID_STATUS,
        layout: ValueLayout::unsigned(3, Width::One),
        scaling: Scaling::Raw,
        unit: "",
    },
];
