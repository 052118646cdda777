//! Reply assembler: rebuilds the answer to the single outstanding request
//! from one single frame, or from one first frame plus its first
//! consecutive frame.
//!
//! Malformed or unmatched frames never raise an error. They are dropped and
//! the context is left untouched; the poller's timeout recovers if no valid
//! completion ever arrives.
use crate::protocol::sensors::{Sensor, SensorDescriptor, SensorValue};
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::iso_tp::{
    ProtocolControl, CONSECUTIVE_FRAME_DATA_LEN, FIRST_FRAME_DATA_LEN, MAX_REPLY_LEN,
};

//==================================================================================Enums and Structs
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProcessResult {
    /// Frame does not match the expected pattern for the active sensor
    /// (bad echo, unexpected role, wrong sequence, nothing armed...).
    Ignored,
    /// A first frame was stored. The caller must grant flow control so the
    /// peer sends the remaining bytes.
    FlowControlRequired,
    /// The reply is complete and decoded.
    Complete(SensorValue),
}

/// Possible phases for the reassembly in progress.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReassemblyPhase {
    /// No segmented reply in progress.
    Idle,
    /// First frame stored, waiting for consecutive frame `next_sequence`.
    AwaitingConsecutive,
}

/// Scratch state for the one reply in flight.
#[derive(Debug, Clone, Copy)]
pub struct ReassemblyContext {
    phase: ReassemblyPhase,
    sensor: Option<Sensor>,
    next_sequence: u8,
    buffer: [u8; MAX_REPLY_LEN],
    current_size: usize,
    expected_size: usize,
}

impl ReassemblyContext {
    const fn new() -> Self {
        Self {
            phase: ReassemblyPhase::Idle,
            sensor: None,
            next_sequence: 1,
            buffer: [0; MAX_REPLY_LEN],
            current_size: 0,
            expected_size: 0,
        }
    }

    /// Drop any partial reply, keeping the armed sensor.
    fn clear_progress(&mut self) {
        self.phase = ReassemblyPhase::Idle;
        self.next_sequence = 1;
        self.current_size = 0;
        self.expected_size = 0;
        // No need to wipe the buffer; upcoming copies will overwrite it.
    }
}

/// Classifies incoming reply frames and reassembles them for the armed sensor.
#[derive(Debug, Clone, Copy)]
pub struct ReplyAssembler {
    context: ReassemblyContext,
}

impl Default for ReplyAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyAssembler {
    /// Instantiate the assembler with nothing armed.
    pub const fn new() -> Self {
        Self {
            context: ReassemblyContext::new(),
        }
    }

    /// Arm the assembler for the reply to `sensor`'s request, discarding any
    /// previous partial reply.
    pub fn begin(&mut self, sensor: Sensor) {
        self.context.clear_progress();
        self.context.sensor = Some(sensor);
    }

    /// Disarm: every frame is ignored until the next [`ReplyAssembler::begin`].
    pub fn reset(&mut self) {
        self.context.clear_progress();
        self.context.sensor = None;
    }

    /// Sensor the assembler is currently waiting on.
    pub fn active_sensor(&self) -> Option<Sensor> {
        self.context.sensor
    }

    /// Current reassembly phase.
    pub fn phase(&self) -> ReassemblyPhase {
        self.context.phase
    }

    //==================================================================================Process Functions
    /// Process a frame received on the response channel.
    ///
    /// Returns a `ProcessResult` indicating whether the frame was ignored,
    /// started a segmented reply, or completed the decode.
    pub fn process_frame(&mut self, frame: &CanFrame) -> ProcessResult {
        let Some(sensor) = self.context.sensor else {
            return ProcessResult::Ignored;
        };
        let descriptor = sensor.descriptor();
        let data = frame.payload();

        let Some(control) = ProtocolControl::classify(data) else {
            return ProcessResult::Ignored;
        };

        match control {
            ProtocolControl::Single { len } => self.on_single_frame(descriptor, data, len as usize),
            ProtocolControl::First { total_len } => {
                self.on_first_frame(descriptor, data, total_len as usize)
            }
            ProtocolControl::Consecutive { sequence } => {
                self.on_consecutive_frame(descriptor, data, sequence)
            }
            // Flow control only travels from us to the peer.
            ProtocolControl::FlowControl { .. } => ProcessResult::Ignored,
            ProtocolControl::Reserved { .. } => ProcessResult::Ignored,
        }
    }

    fn on_single_frame(
        &mut self,
        descriptor: &SensorDescriptor,
        data: &[u8],
        len: usize,
    ) -> ProcessResult {
        if len == 0 || 1 + len > data.len() {
            return ProcessResult::Ignored;
        }
        let message = &data[1..1 + len];
        self.complete(descriptor, message)
    }

    fn on_first_frame(
        &mut self,
        descriptor: &SensorDescriptor,
        data: &[u8],
        total_len: usize,
    ) -> ProcessResult {
        // A first frame is always a full frame announcing more than a single
        // frame could carry.
        if data.len() < 2 + FIRST_FRAME_DATA_LEN || total_len <= FIRST_FRAME_DATA_LEN + 1 {
            return ProcessResult::Ignored;
        }
        let message = &data[2..2 + FIRST_FRAME_DATA_LEN];
        if !descriptor.matches_echo(message) {
            return ProcessResult::Ignored;
        }

        let context = &mut self.context;
        context.buffer[..FIRST_FRAME_DATA_LEN].copy_from_slice(message);
        context.current_size = FIRST_FRAME_DATA_LEN;
        // Only the first consecutive frame is ever consumed.
        context.expected_size = total_len.min(MAX_REPLY_LEN);
        context.next_sequence = 1;
        context.phase = ReassemblyPhase::AwaitingConsecutive;

        ProcessResult::FlowControlRequired
    }

    fn on_consecutive_frame(
        &mut self,
        descriptor: &SensorDescriptor,
        data: &[u8],
        sequence: u8,
    ) -> ProcessResult {
        let context = &self.context;
        if context.phase != ReassemblyPhase::AwaitingConsecutive
            || sequence != context.next_sequence
        {
            return ProcessResult::Ignored;
        }

        let bytes_needed = context.expected_size - context.current_size;
        let copy_len = bytes_needed
            .min(CONSECUTIVE_FRAME_DATA_LEN)
            .min(data.len().saturating_sub(1));

        // Assemble in a scratch copy so a reply that fails to decode leaves
        // the context untouched.
        let mut message = context.buffer;
        message[context.current_size..context.current_size + copy_len]
            .copy_from_slice(&data[1..1 + copy_len]);
        let message_len = context.current_size + copy_len;

        self.complete(descriptor, &message[..message_len])
    }

    /// Validate the echoed identifier, decode, and release the context.
    fn complete(&mut self, descriptor: &SensorDescriptor, message: &[u8]) -> ProcessResult {
        if !descriptor.matches_echo(message) {
            return ProcessResult::Ignored;
        }
        match descriptor.decode(&message[descriptor.echo_len()..]) {
            Some(value) => {
                self.reset();
                ProcessResult::Complete(value)
            }
            None => ProcessResult::Ignored,
        }
    }
}
