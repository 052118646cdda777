use super::*;
use crate::protocol::sensors::SensorValue;
use crate::protocol::transport::can_id::{REQUEST_CAN_ID, RESPONSE_CAN_ID};
use crate::protocol::transport::REPLY_TIMEOUT_MS;
use std::collections::VecDeque;
use std::vec::Vec as StdVec;

/// Bus double: queued inbound frames, recorded outbound frames.
#[derive(Default)]
struct QueueBus {
    inbound: VecDeque<CanFrame>,
    sent: StdVec<CanFrame>,
    fail_sends: bool,
}

impl QueueBus {
    fn reply(&mut self, bytes: &[u8]) {
        self.inbound
            .push_back(CanFrame::padded(RESPONSE_CAN_ID, bytes).unwrap());
    }

    fn sent_requests(&self) -> StdVec<[u8; 3]> {
        self.sent
            .iter()
            .filter(|frame| frame.data[0] >> 4 == 0)
            .map(|frame| [frame.data[0], frame.data[1], frame.data[2]])
            .collect()
    }
}

impl CanBus for QueueBus {
    type Error = ();

    fn try_send(&mut self, frame: &CanFrame) -> Result<(), ()> {
        if self.fail_sends {
            return Err(());
        }
        self.sent.push(frame.clone());
        Ok(())
    }

    fn try_recv(&mut self) -> Result<Option<CanFrame>, ()> {
        Ok(self.inbound.pop_front())
    }
}

fn sequencer(sensors: &[Sensor]) -> PollSequencer {
    PollSequencer::new(
        PollConfig::new(),
        PollSchedule::try_from_slice(sensors).unwrap(),
    )
    .unwrap()
}

#[test]
/// The first cycle starts on the first tick.
fn test_first_tick_sends_first_request() {
    let mut poller = sequencer(&[Sensor::EngineSpeed, Sensor::CoolantTemp]);
    let mut bus = QueueBus::default();
    let mut store = TelemetryStore::new();

    let report = poller.tick(&mut bus, &mut store, 0);
    assert_eq!(report.requests_sent, 1);
    assert!(poller.is_waiting());
    assert_eq!(poller.current_slot(), 0);
    assert_eq!(bus.sent[0].id, REQUEST_CAN_ID);
    assert_eq!(bus.sent_requests(), [[0x02, 0x01, 0x0C]]);
}

#[test]
/// A single-frame reply writes the store and sends the next request at once.
fn test_single_frame_reply_advances() {
    let mut poller = sequencer(&[Sensor::EngineSpeed, Sensor::CoolantTemp]);
    let mut bus = QueueBus::default();
    let mut store = TelemetryStore::new();
    poller.tick(&mut bus, &mut store, 0);

    bus.reply(&[0x04, 0x41, 0x0C, 0x1A, 0xF8]);
    let report = poller.tick(&mut bus, &mut store, 5);
    assert_eq!(report.values_decoded, 1);
    assert_eq!(report.requests_sent, 1);
    assert_eq!(store.value(Sensor::EngineSpeed), Some(SensorValue::Float(1726.0)));
    assert_eq!(store.reading(Sensor::EngineSpeed).updated_at_ms, Some(5));
    assert_eq!(poller.current_slot(), 1);
    assert_eq!(
        bus.sent_requests(),
        [[0x02, 0x01, 0x0C], [0x02, 0x01, 0x05]]
    );
}

#[test]
/// Every slot is visited once per cycle, in order, even when nothing answers.
fn test_cycle_order_with_timeouts() {
    let schedule = [Sensor::EngineSpeed, Sensor::CoolantTemp, Sensor::StateOfCharge];
    let mut poller = sequencer(&schedule);
    let mut bus = QueueBus::default();
    let mut store = TelemetryStore::new();

    let mut now = 0;
    poller.tick(&mut bus, &mut store, now);
    let mut completed = false;
    for _ in 0..schedule.len() {
        now += REPLY_TIMEOUT_MS;
        let report = poller.tick(&mut bus, &mut store, now);
        assert_eq!(report.timeouts, 1);
        completed = report.cycle_completed;
    }
    assert!(completed);
    assert_eq!(poller.cycles_completed(), 1);
    assert!(!poller.is_waiting());
    assert_eq!(
        bus.sent_requests(),
        [[0x02, 0x01, 0x0C], [0x02, 0x01, 0x05], [0x02, 0x01, 0x5B]]
    );
    for sensor in schedule {
        assert_eq!(store.value(sensor), None);
    }

    // Idle until the poll interval has elapsed since the cycle ended.
    assert_eq!(poller.tick(&mut bus, &mut store, now + 249).requests_sent, 0);
    assert_eq!(poller.tick(&mut bus, &mut store, now + 250).requests_sent, 1);
    assert_eq!(poller.current_slot(), 0);
}

#[test]
/// First frame triggers flow control on both identifiers, consecutive frame decodes.
fn test_segmented_reply_with_flow_control() {
    let mut poller = sequencer(&[Sensor::HvBatteryVoltage]);
    let mut bus = QueueBus::default();
    let mut store = TelemetryStore::new();
    poller.tick(&mut bus, &mut store, 0);

    bus.reply(&[0x10, 0x0B, 0x61, 0x87, 0x4E, 0xB6, 0x00, 0x88]);
    let report = poller.tick(&mut bus, &mut store, 2);
    assert_eq!(report.flow_control_sent, 2);
    let flow_control: StdVec<&CanFrame> =
        bus.sent.iter().filter(|frame| frame.data[0] == 0x30).collect();
    assert_eq!(flow_control.len(), 2);
    assert_eq!(flow_control[0].id, RESPONSE_CAN_ID);
    assert_eq!(flow_control[1].id, REQUEST_CAN_ID);
    assert_eq!(flow_control[0].data, [0x30, 0x00, 0x05, 0, 0, 0, 0, 0]);

    bus.reply(&[0x21, 0x02, 0x41, 0x42, 0x43, 0x3C, 0x00, 0x00]);
    let report = poller.tick(&mut bus, &mut store, 4);
    assert_eq!(report.values_decoded, 1);
    assert!(report.cycle_completed);
    assert_eq!(
        store.value(Sensor::HvBatteryVoltage),
        Some(SensorValue::Float(201.5))
    );
}

#[test]
fn test_flow_control_single_target() {
    let config = PollConfig::new()
        .with_flow_control_targets(crate::protocol::polling::FlowControlTargets::ResponseChannel);
    let mut poller = PollSequencer::new(
        config,
        PollSchedule::try_from_slice(&[Sensor::BatteryTemp1]).unwrap(),
    )
    .unwrap();
    let mut bus = QueueBus::default();
    let mut store = TelemetryStore::new();
    poller.tick(&mut bus, &mut store, 0);
    bus.reply(&[0x10, 0x0B, 0x61, 0x87, 0x4E, 0xB6, 0x00, 0x88]);
    assert_eq!(poller.tick(&mut bus, &mut store, 1).flow_control_sent, 1);
}

#[test]
/// A first frame with no consecutive frame: slot skipped, nothing written.
fn test_first_frame_without_continuation_times_out() {
    let mut poller = sequencer(&[Sensor::HvBatteryVoltage, Sensor::EngineSpeed]);
    let mut bus = QueueBus::default();
    let mut store = TelemetryStore::new();
    poller.tick(&mut bus, &mut store, 0);
    bus.reply(&[0x10, 0x0B, 0x61, 0x87, 0x4E, 0xB6, 0x00, 0x88]);
    poller.tick(&mut bus, &mut store, 1);

    let report = poller.tick(&mut bus, &mut store, REPLY_TIMEOUT_MS);
    assert_eq!(report.timeouts, 1);
    assert_eq!(report.requests_sent, 1);
    assert_eq!(store.value(Sensor::HvBatteryVoltage), None);
    assert_eq!(poller.pending_sensor(), Some(Sensor::EngineSpeed));

    // A late consecutive frame for the skipped slot is dropped.
    bus.reply(&[0x21, 0x02, 0x41, 0x42, 0x43, 0x3C, 0x00, 0x00]);
    let report = poller.tick(&mut bus, &mut store, REPLY_TIMEOUT_MS + 1);
    assert_eq!(report.frames_ignored, 1);
    assert_eq!(store.value(Sensor::HvBatteryVoltage), None);
}

#[test]
/// Send failures are counted; the timeout still moves the cycle on.
fn test_send_errors_recover_by_timeout() {
    let mut poller = sequencer(&[Sensor::EngineSpeed, Sensor::CoolantTemp]);
    let mut bus = QueueBus {
        fail_sends: true,
        ..Default::default()
    };
    let mut store = TelemetryStore::new();

    let report = poller.tick(&mut bus, &mut store, 0);
    assert_eq!(report.bus_errors, 1);
    assert_eq!(report.requests_sent, 0);
    assert!(poller.is_waiting());

    bus.fail_sends = false;
    let report = poller.tick(&mut bus, &mut store, REPLY_TIMEOUT_MS);
    assert_eq!(report.timeouts, 1);
    assert_eq!(report.requests_sent, 1);
    assert_eq!(poller.current_slot(), 1);
}

#[test]
fn test_foreign_identifiers_are_ignored() {
    let mut poller = sequencer(&[Sensor::CoolantTemp]);
    let mut bus = QueueBus::default();
    let mut store = TelemetryStore::new();
    poller.tick(&mut bus, &mut store, 0);

    let other = CanId::new(0x7E8).unwrap();
    bus.inbound
        .push_back(CanFrame::padded(other, &[0x03, 0x41, 0x05, 0x5A]).unwrap());
    let report = poller.tick(&mut bus, &mut store, 1);
    assert_eq!(report.frames_ignored, 1);
    assert_eq!(store.value(Sensor::CoolantTemp), None);
}

#[test]
/// Draining is bounded per tick.
fn test_drain_is_bounded() {
    let mut poller = sequencer(&[Sensor::CoolantTemp]);
    let mut bus = QueueBus::default();
    let mut store = TelemetryStore::new();
    poller.tick(&mut bus, &mut store, 0);

    for _ in 0..MAX_FRAMES_PER_TICK + 4 {
        bus.reply(&[0x03, 0x7F, 0x01, 0x11]);
    }
    let report = poller.tick(&mut bus, &mut store, 1);
    assert_eq!(report.frames_ignored as usize, MAX_FRAMES_PER_TICK);
    assert_eq!(bus.inbound.len(), 4);
}

#[test]
/// Deadlines keep working when the millisecond counter wraps.
fn test_timeout_across_clock_wrap() {
    let mut poller = sequencer(&[Sensor::EngineSpeed, Sensor::CoolantTemp]);
    let mut bus = QueueBus::default();
    let mut store = TelemetryStore::new();
    let start = u32::MAX - 50;
    poller.tick(&mut bus, &mut store, start);

    assert_eq!(poller.tick(&mut bus, &mut store, 10).timeouts, 0);
    assert_eq!(
        poller
            .tick(&mut bus, &mut store, start.wrapping_add(REPLY_TIMEOUT_MS))
            .timeouts,
        1
    );
}

#[test]
fn test_rejects_invalid_config() {
    assert_eq!(
        PollSequencer::new(
            PollConfig::new().with_reply_timeout_ms(0),
            PollSchedule::default_rotation()
        )
        .err(),
        Some(ConfigError::ZeroReplyTimeout)
    );
}

#[test]
/// A timeout past the signed comparison range is refused up front instead of
/// expiring every request in the tick that sent it.
fn test_rejects_timeout_beyond_deadline_range() {
    let config = PollConfig::new().with_reply_timeout_ms(u32::MAX / 2 + 10);
    assert!(matches!(
        PollSequencer::new(config, PollSchedule::default_rotation()),
        Err(ConfigError::ReplyTimeoutTooLong { .. })
    ));

    // The largest accepted timeout keeps the request outstanding.
    let config = PollConfig::new().with_reply_timeout_ms(i32::MAX as u32);
    let mut poller = PollSequencer::new(config, PollSchedule::default_rotation()).unwrap();
    let mut bus = QueueBus::default();
    let mut store = TelemetryStore::new();
    assert_eq!(poller.tick(&mut bus, &mut store, 0).timeouts, 0);
    assert_eq!(poller.tick(&mut bus, &mut store, 1).timeouts, 0);
    assert!(poller.is_waiting());
}
