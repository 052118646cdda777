//! Round-robin poll sequencer: one outstanding request at a time, advanced by
//! a completed decode or by the reply timeout.
//!
//! The sequencer is driven by [`PollSequencer::tick`] and never blocks. Each
//! tick drains at most [`MAX_FRAMES_PER_TICK`] frames, then checks the
//! deadline, so a silent or flooded bus can never stall the cycle.
use heapless::Vec;

use crate::error::ConfigError;
use crate::protocol::polling::store::TelemetryStore;
use crate::protocol::polling::{PollConfig, PollSchedule};
use crate::protocol::sensors::Sensor;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::CanId;
use crate::protocol::transport::iso_tp::assembler::{ProcessResult, ReplyAssembler};
use crate::protocol::transport::iso_tp::builder::{flow_control_frame, request_frame};
use crate::protocol::transport::traits::can_bus::CanBus;
use crate::protocol::transport::traits::clock::{deadline_reached, elapsed_ms};
use crate::protocol::transport::MAX_FRAMES_PER_TICK;

/// Where the sequencer stands in the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerState {
    /// Between cycles. `None` until the first cycle, which starts immediately.
    Idle { completed_at: Option<u32> },
    /// Request for the current slot is outstanding.
    Waiting { deadline: u32 },
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollReport {
    pub requests_sent: u8,
    pub values_decoded: u8,
    pub timeouts: u8,
    pub flow_control_sent: u8,
    /// Frames from other identifiers or not matching the outstanding request.
    pub frames_ignored: u8,
    /// Failed sends and receives.
    pub bus_errors: u8,
    /// A full pass over the schedule ended during this tick.
    pub cycle_completed: bool,
}

/// Walks a [`PollSchedule`], feeding replies to a [`ReplyAssembler`] and
/// decoded values to a [`TelemetryStore`].
#[derive(Debug, Clone)]
pub struct PollSequencer {
    config: PollConfig,
    schedule: PollSchedule,
    flow_control_ids: Vec<CanId, 2>,
    assembler: ReplyAssembler,
    state: SequencerState,
    slot: usize,
    cycles_completed: u32,
}

impl PollSequencer {
    /// Validates `config` and `schedule`; nothing is sent until the first tick.
    pub fn new(config: PollConfig, schedule: PollSchedule) -> Result<Self, ConfigError> {
        config.validate()?;
        if schedule.is_empty() {
            return Err(ConfigError::EmptySchedule);
        }
        let flow_control_ids = config
            .flow_control_targets
            .resolve(config.request_id, config.response_id);
        Ok(Self {
            config,
            schedule,
            flow_control_ids,
            assembler: ReplyAssembler::new(),
            state: SequencerState::Idle { completed_at: None },
            slot: 0,
            cycles_completed: 0,
        })
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn schedule(&self) -> &PollSchedule {
        &self.schedule
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Slot of the outstanding request, or of the next one when idle.
    pub fn current_slot(&self) -> usize {
        self.slot
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self.state, SequencerState::Waiting { .. })
    }

    /// Full passes over the schedule so far.
    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    /// Run one step of the poll loop at time `now`.
    pub fn tick<C: CanBus>(
        &mut self,
        bus: &mut C,
        store: &mut TelemetryStore,
        now: u32,
    ) -> PollReport {
        let mut report = PollReport::default();

        if let SequencerState::Idle { completed_at } = self.state {
            let due = match completed_at {
                None => true,
                Some(at) => elapsed_ms(now, at) >= self.config.poll_interval_ms,
            };
            if !due {
                return report;
            }
            self.slot = 0;
            self.start_request(bus, now, &mut report);
        }

        let mut drained = 0;
        while drained < MAX_FRAMES_PER_TICK && self.is_waiting() {
            match bus.try_recv() {
                Ok(Some(frame)) => {
                    drained += 1;
                    self.on_frame(bus, store, &frame, now, &mut report);
                }
                Ok(None) => break,
                Err(_err) => {
                    report.bus_errors = report.bus_errors.saturating_add(1);
                    #[cfg(feature = "defmt")]
                    defmt::warn!("CAN receive failed: {}", defmt::Debug2Format(&_err));
                    break;
                }
            }
        }

        if let SequencerState::Waiting { deadline } = self.state {
            if deadline_reached(now, deadline) {
                #[cfg(feature = "defmt")]
                defmt::debug!("Reply timeout on slot {}", self.slot);
                report.timeouts = report.timeouts.saturating_add(1);
                self.assembler.reset();
                self.advance(bus, now, &mut report);
            }
        }

        report
    }

    fn on_frame<C: CanBus>(
        &mut self,
        bus: &mut C,
        store: &mut TelemetryStore,
        frame: &CanFrame,
        now: u32,
        report: &mut PollReport,
    ) {
        let Some(sensor) = self.assembler.active_sensor() else {
            report.frames_ignored = report.frames_ignored.saturating_add(1);
            return;
        };
        if frame.id != self.config.response_id {
            report.frames_ignored = report.frames_ignored.saturating_add(1);
            return;
        }

        match self.assembler.process_frame(frame) {
            ProcessResult::Ignored => {
                report.frames_ignored = report.frames_ignored.saturating_add(1);
            }
            ProcessResult::FlowControlRequired => self.send_flow_control(bus, report),
            ProcessResult::Complete(value) => {
                #[cfg(feature = "defmt")]
                {
                    let descriptor = sensor.descriptor();
                    defmt::debug!(
                        "Decoded {=str}: {} {=str}",
                        descriptor.name,
                        value,
                        descriptor.unit
                    );
                }
                store.update(sensor, value, now);
                report.values_decoded = report.values_decoded.saturating_add(1);
                self.advance(bus, now, report);
            }
        }
    }

    fn send_flow_control<C: CanBus>(&mut self, bus: &mut C, report: &mut PollReport) {
        for id in self.flow_control_ids.iter() {
            let frame = flow_control_frame(
                *id,
                self.config.flow_control_block_size,
                self.config.flow_control_separation_ms,
            );
            match bus.try_send(&frame) {
                Ok(()) => {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("Flow control sent on {:#X}", id.raw());
                    report.flow_control_sent = report.flow_control_sent.saturating_add(1);
                }
                Err(_err) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Flow control send failed: {}", defmt::Debug2Format(&_err));
                    report.bus_errors = report.bus_errors.saturating_add(1);
                }
            }
        }
    }

    /// Move to the next slot, closing the cycle after the last one.
    fn advance<C: CanBus>(&mut self, bus: &mut C, now: u32, report: &mut PollReport) {
        self.slot += 1;
        if self.slot >= self.schedule.len() {
            self.slot = 0;
            self.state = SequencerState::Idle {
                completed_at: Some(now),
            };
            self.cycles_completed = self.cycles_completed.wrapping_add(1);
            report.cycle_completed = true;
            #[cfg(feature = "defmt")]
            defmt::info!("Poll cycle {} complete", self.cycles_completed);
            return;
        }
        self.start_request(bus, now, report);
    }

    /// Arm the assembler and send the request for the current slot.
    ///
    /// A failed send still leaves the request outstanding; the timeout moves
    /// the cycle on.
    fn start_request<C: CanBus>(&mut self, bus: &mut C, now: u32, report: &mut PollReport) {
        let Some(sensor) = self.schedule.get(self.slot) else {
            self.slot = 0;
            self.state = SequencerState::Idle {
                completed_at: Some(now),
            };
            return;
        };
        self.assembler.begin(sensor);
        self.state = SequencerState::Waiting {
            deadline: now.wrapping_add(self.config.reply_timeout_ms),
        };

        match request_frame(self.config.request_id, sensor.descriptor().request) {
            Ok(frame) => match bus.try_send(&frame) {
                Ok(()) => {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("Request sent for {} (slot {})", sensor, self.slot);
                    report.requests_sent = report.requests_sent.saturating_add(1);
                }
                Err(_err) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Request send failed: {}", defmt::Debug2Format(&_err));
                    report.bus_errors = report.bus_errors.saturating_add(1);
                }
            },
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Request frame for {} rejected: {}", sensor, _err);
                report.bus_errors = report.bus_errors.saturating_add(1);
            }
        }
    }

    /// Sensor the outstanding request targets.
    pub fn pending_sensor(&self) -> Option<Sensor> {
        if self.is_waiting() {
            self.schedule.get(self.slot)
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
