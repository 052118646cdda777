//! Sensor polling: configuration, the poll schedule, the telemetry store fed
//! by decoded replies, and the sequencer walking the schedule one request at
//! a time.
use heapless::Vec;

use crate::error::ConfigError;
use crate::protocol::sensors::Sensor;
use crate::protocol::transport::can_id::{CanId, REQUEST_CAN_ID, RESPONSE_CAN_ID};
use crate::protocol::transport::{
    FLOW_CONTROL_BLOCK_SIZE, FLOW_CONTROL_SEPARATION_MS, POLL_INTERVAL_MS, REPLY_TIMEOUT_MS,
};

pub mod sequencer;
pub mod store;

/// Maximum number of slots in a poll schedule.
pub const MAX_SCHEDULE_LEN: usize = 16;

/// Longest reply timeout [`deadline_reached`] can compare reliably.
///
/// [`deadline_reached`]: crate::protocol::transport::traits::clock::deadline_reached
pub const MAX_REPLY_TIMEOUT_MS: u32 = i32::MAX as u32;

//==================================================================================FLOW_CONTROL_TARGETS
/// Identifiers that receive the flow-control frame after a first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlowControlTargets {
    /// Send on both identifiers. Some ECUs only honour flow control on the
    /// request id, some adapters only forward the response id.
    #[default]
    Both,
    /// Only the ECU response identifier.
    ResponseChannel,
    /// Only the request identifier.
    RequestChannel,
}

impl FlowControlTargets {
    /// Resolve the targets against the configured channel pair.
    pub fn resolve(&self, request_id: CanId, response_id: CanId) -> Vec<CanId, 2> {
        let mut ids = Vec::new();
        // Capacity is 2, pushes below never overflow.
        match self {
            FlowControlTargets::Both => {
                let _ = ids.push(response_id);
                let _ = ids.push(request_id);
            }
            FlowControlTargets::ResponseChannel => {
                let _ = ids.push(response_id);
            }
            FlowControlTargets::RequestChannel => {
                let _ = ids.push(request_id);
            }
        }
        ids
    }
}

//==================================================================================POLL_CONFIG
/// Runtime tuning of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollConfig {
    pub request_id: CanId,
    pub response_id: CanId,
    pub reply_timeout_ms: u32,
    pub poll_interval_ms: u32,
    pub flow_control_block_size: u8,
    pub flow_control_separation_ms: u8,
    pub flow_control_targets: FlowControlTargets,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PollConfig {
    /// Defaults from [`crate::protocol::transport`].
    pub const fn new() -> Self {
        Self {
            request_id: REQUEST_CAN_ID,
            response_id: RESPONSE_CAN_ID,
            reply_timeout_ms: REPLY_TIMEOUT_MS,
            poll_interval_ms: POLL_INTERVAL_MS,
            flow_control_block_size: FLOW_CONTROL_BLOCK_SIZE,
            flow_control_separation_ms: FLOW_CONTROL_SEPARATION_MS,
            flow_control_targets: FlowControlTargets::Both,
        }
    }

    /// Sets the identifier pair (requests out, replies in).
    pub fn with_channels(mut self, request_id: CanId, response_id: CanId) -> Self {
        self.request_id = request_id;
        self.response_id = response_id;
        self
    }

    pub fn with_reply_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.reply_timeout_ms = timeout_ms;
        self
    }

    /// Pause between the end of a cycle and the start of the next.
    pub fn with_poll_interval_ms(mut self, interval_ms: u32) -> Self {
        self.poll_interval_ms = interval_ms;
        self
    }

    /// Block size and separation time granted in flow control.
    pub fn with_flow_control(mut self, block_size: u8, separation_ms: u8) -> Self {
        self.flow_control_block_size = block_size;
        self.flow_control_separation_ms = separation_ms;
        self
    }

    pub fn with_flow_control_targets(mut self, targets: FlowControlTargets) -> Self {
        self.flow_control_targets = targets;
        self
    }

    /// Checks the combination is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reply_timeout_ms == 0 {
            return Err(ConfigError::ZeroReplyTimeout);
        }
        if self.reply_timeout_ms > MAX_REPLY_TIMEOUT_MS {
            return Err(ConfigError::ReplyTimeoutTooLong {
                timeout_ms: self.reply_timeout_ms,
                max_ms: MAX_REPLY_TIMEOUT_MS,
            });
        }
        if self.request_id == self.response_id {
            return Err(ConfigError::IdenticalChannels);
        }
        Ok(())
    }
}

//==================================================================================POLL_SCHEDULE
/// Ordered list of sensors polled once per cycle. A sensor may appear more
/// than once to be refreshed more often.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollSchedule {
    slots: Vec<Sensor, MAX_SCHEDULE_LEN>,
}

impl PollSchedule {
    /// Every known sensor once, in table order.
    pub fn default_rotation() -> Self {
        let mut slots = Vec::new();
        for sensor in Sensor::ALL {
            // COUNT <= MAX_SCHEDULE_LEN
            let _ = slots.push(sensor);
        }
        Self { slots }
    }

    /// Build a schedule from an explicit slot list.
    pub fn try_from_slice(sensors: &[Sensor]) -> Result<Self, ConfigError> {
        if sensors.is_empty() {
            return Err(ConfigError::EmptySchedule);
        }
        let slots = Vec::from_slice(sensors).map_err(|_| ConfigError::ScheduleFull {
            capacity: MAX_SCHEDULE_LEN,
        })?;
        Ok(Self { slots })
    }

    /// Append a slot.
    pub fn push(&mut self, sensor: Sensor) -> Result<(), ConfigError> {
        self.slots.push(sensor).map_err(|_| ConfigError::ScheduleFull {
            capacity: MAX_SCHEDULE_LEN,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sensor at `slot`, if any.
    pub fn get(&self, slot: usize) -> Option<Sensor> {
        self.slots.get(slot).copied()
    }

    pub fn as_slice(&self) -> &[Sensor] {
        &self.slots
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::default_rotation()
    }
}
