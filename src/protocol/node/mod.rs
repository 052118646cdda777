//! Node runners tying the layers together.
//!
//! * [`TelemetryNode`]: bus-facing side. Polls the ECU and streams records
//!   over the serial link.
//! * [`DashboardNode`]: display-facing side. Decodes the link and exposes the
//!   last good record with its freshness.
//!
//! Both are plain synchronous state machines driven by `tick()`. The async
//! `run_ticks` / `drive` helpers only interleave ticks with a [`LoopTimer`]
//! delay, so firmware can run them as a single embassy task.
use core::convert::Infallible;

use crate::error::ConfigError;
use crate::protocol::link::decoder::{LinkReceiver, LinkStats, ReceiveReport};
use crate::protocol::link::encoder::{LinkTransmitter, TransmitOutcome};
use crate::protocol::link::record::TelemetryRecord;
use crate::protocol::link::LinkConfig;
use crate::protocol::polling::sequencer::{PollReport, PollSequencer};
use crate::protocol::polling::store::TelemetryStore;
use crate::protocol::polling::{PollConfig, PollSchedule};
use crate::protocol::transport::traits::can_bus::CanBus;
use crate::protocol::transport::traits::clock::MonotonicClock;
use crate::protocol::transport::traits::loop_timer::LoopTimer;
use crate::protocol::transport::traits::serial_port::{SerialRead, SerialWrite};

/// Result of one [`TelemetryNode::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    /// Clock sample shared by both stages.
    pub now_ms: u32,
    pub poll: PollReport,
    pub link: TransmitOutcome,
}

//==================================================================================TELEMETRY_NODE
/// Owns the CAN bus, the serial writer and the clock.
pub struct TelemetryNode<C: CanBus, S: SerialWrite, K: MonotonicClock> {
    bus: C,
    serial: S,
    clock: K,
    sequencer: PollSequencer,
    store: TelemetryStore,
    transmitter: LinkTransmitter,
}

impl<C, S, K> TelemetryNode<C, S, K>
where
    C: CanBus,
    S: SerialWrite,
    K: MonotonicClock,
{
    /// Validates both configurations before taking ownership of the I/O.
    pub fn new(
        bus: C,
        serial: S,
        clock: K,
        poll_config: PollConfig,
        schedule: PollSchedule,
        link_config: LinkConfig,
    ) -> Result<Self, ConfigError> {
        let transmitter = LinkTransmitter::new(link_config)?;
        let sequencer = PollSequencer::new(poll_config, schedule)?;
        #[cfg(feature = "defmt")]
        defmt::info!(
            "Telemetry node ready: {} slots, link every {} ms",
            sequencer.schedule().len(),
            link_config.transmit_interval_ms
        );
        Ok(Self {
            bus,
            serial,
            clock,
            sequencer,
            store: TelemetryStore::new(),
            transmitter,
        })
    }

    /// Defaults everywhere, polling every known sensor.
    pub fn with_defaults(bus: C, serial: S, clock: K) -> Result<Self, ConfigError> {
        Self::new(
            bus,
            serial,
            clock,
            PollConfig::new(),
            PollSchedule::default_rotation(),
            LinkConfig::new(),
        )
    }

    /// Sample the clock once, poll, then transmit.
    pub fn tick(&mut self) -> TickReport {
        let now_ms = self.clock.now_ms();
        let poll = self.sequencer.tick(&mut self.bus, &mut self.store, now_ms);
        let link = self.transmitter.tick(&mut self.serial, &mut self.store, now_ms);
        TickReport { now_ms, poll, link }
    }

    /// Run `count` ticks separated by `period_ms`.
    pub async fn run_ticks<T: LoopTimer>(&mut self, timer: &mut T, period_ms: u32, count: usize) {
        for _ in 0..count {
            self.tick();
            timer.delay_ms(period_ms).await;
        }
    }

    /// Tick forever.
    pub async fn drive<T: LoopTimer>(&mut self, timer: &mut T, period_ms: u32) -> Infallible {
        loop {
            self.tick();
            timer.delay_ms(period_ms).await;
        }
    }

    pub fn store(&self) -> &TelemetryStore {
        &self.store
    }

    pub fn sequencer(&self) -> &PollSequencer {
        &self.sequencer
    }

    pub fn transmitter(&self) -> &LinkTransmitter {
        &self.transmitter
    }

    pub fn bus_mut(&mut self) -> &mut C {
        &mut self.bus
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    /// Give the I/O back.
    pub fn into_parts(self) -> (C, S, K) {
        (self.bus, self.serial, self.clock)
    }
}

//==================================================================================DASHBOARD_NODE
/// Owns the serial reader and the clock.
pub struct DashboardNode<S: SerialRead, K: MonotonicClock> {
    serial: S,
    clock: K,
    receiver: LinkReceiver,
}

impl<S, K> DashboardNode<S, K>
where
    S: SerialRead,
    K: MonotonicClock,
{
    pub fn new(serial: S, clock: K, link_config: LinkConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            serial,
            clock,
            receiver: LinkReceiver::new(link_config)?,
        })
    }

    /// Decode whatever the serial port holds, up to the per-tick bound.
    pub fn tick(&mut self) -> ReceiveReport {
        let now = self.clock.now_ms();
        self.receiver.tick(&mut self.serial, now)
    }

    pub async fn run_ticks<T: LoopTimer>(&mut self, timer: &mut T, period_ms: u32, count: usize) {
        for _ in 0..count {
            self.tick();
            timer.delay_ms(period_ms).await;
        }
    }

    pub async fn drive<T: LoopTimer>(&mut self, timer: &mut T, period_ms: u32) -> Infallible {
        loop {
            self.tick();
            timer.delay_ms(period_ms).await;
        }
    }

    /// Last good record, fresh or not.
    pub fn latest(&self) -> Option<&TelemetryRecord> {
        self.receiver.latest()
    }

    /// Whether [`DashboardNode::latest`] is recent enough to display as live.
    pub fn is_fresh(&self) -> bool {
        self.receiver.is_fresh(self.clock.now_ms())
    }

    pub fn stats(&self) -> &LinkStats {
        self.receiver.stats()
    }

    pub fn receiver(&self) -> &LinkReceiver {
        &self.receiver
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }
}
