//! Test doubles simulating the ECU, the serial link and time during
//! integration tests.
use dashlink::protocol::transport::{
    can_frame::CanFrame,
    can_id::{CanId, REQUEST_CAN_ID, RESPONSE_CAN_ID},
    traits::{
        can_bus::CanBus,
        clock::MonotonicClock,
        loop_timer::LoopTimer,
        serial_port::{SerialRead, SerialWrite},
    },
};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

//==================================================================================ECU
/// How the simulated ECU answers one request.
#[derive(Clone, Debug)]
#[allow(dead_code)]
pub enum EcuReply {
    /// One single frame (payload before padding).
    Single(Vec<u8>),
    /// First frame, then the consecutive frame once flow control arrives.
    Segmented { first: [u8; 8], consecutive: [u8; 8] },
    /// First frame only; the continuation never comes.
    FirstOnly([u8; 8]),
    Silent,
}

#[allow(dead_code)]
/// Battery block reply: 201.5 V, 20.5 A, 25/26/27 °C, intake 20 °C.
pub const BATTERY_FIRST: [u8; 8] = [0x10, 0x0B, 0x61, 0x87, 0x4E, 0xB6, 0x00, 0x88];
#[allow(dead_code)]
pub const BATTERY_CONSECUTIVE: [u8; 8] = [0x21, 0x02, 0x41, 0x42, 0x43, 0x3C, 0x00, 0x00];

/// Request-keyed reply script.
#[derive(Clone, Debug)]
#[allow(dead_code)]
pub struct ScriptedEcu {
    replies: HashMap<Vec<u8>, EcuReply>,
}

#[allow(dead_code)]
impl ScriptedEcu {
    pub fn empty() -> Self {
        Self {
            replies: HashMap::new(),
        }
    }

    /// Answers every known request with realistic values.
    pub fn healthy() -> Self {
        Self::empty()
            // 1726 rpm
            .with(&[0x01, 0x0C], EcuReply::Single(vec![0x04, 0x41, 0x0C, 0x1A, 0xF8]))
            // 50 °C
            .with(&[0x01, 0x05], EcuReply::Single(vec![0x03, 0x41, 0x05, 0x5A]))
            // 80 %
            .with(&[0x01, 0x5B], EcuReply::Single(vec![0x03, 0x41, 0x5B, 0xCC]))
            .with(
                &[0x21, 0x87],
                EcuReply::Segmented {
                    first: BATTERY_FIRST,
                    consecutive: BATTERY_CONSECUTIVE,
                },
            )
            // bar -3, engine state 1, fan speed 3, fan request 1
            .with(
                &[0x21, 0x61],
                EcuReply::Single(vec![0x06, 0x61, 0x61, 0xFD, 0x01, 0x03, 0x01]),
            )
    }

    pub fn with(mut self, request: &[u8], reply: EcuReply) -> Self {
        self.replies.insert(request.to_vec(), reply);
        self
    }

    fn reply_for(&self, request: &[u8]) -> EcuReply {
        self.replies
            .get(request)
            .cloned()
            .unwrap_or(EcuReply::Silent)
    }
}

//==================================================================================CAN_BUS
#[allow(dead_code)]
/// In-memory CAN bus with an ECU answering on the response identifier.
pub struct MockCanBus {
    pub sent: Vec<CanFrame>,
    inbound: VecDeque<CanFrame>,
    ecu: ScriptedEcu,
    pending_consecutive: Option<[u8; 8]>,
    /// Number of upcoming sends to refuse.
    pub refuse_sends: usize,
}

#[allow(dead_code)]
impl MockCanBus {
    pub fn new(ecu: ScriptedEcu) -> Self {
        Self {
            sent: Vec::new(),
            inbound: VecDeque::new(),
            ecu,
            pending_consecutive: None,
            refuse_sends: 0,
        }
    }

    /// Inject an unsolicited frame.
    pub fn inject(&mut self, frame: CanFrame) {
        self.inbound.push_back(frame);
    }

    /// `[service, identifier]` of every request sent, in order.
    pub fn requests(&self) -> Vec<[u8; 2]> {
        self.sent
            .iter()
            .filter(|frame| frame.id == REQUEST_CAN_ID && frame.data[0] >> 4 == 0)
            .map(|frame| [frame.data[1], frame.data[2]])
            .collect()
    }

    pub fn flow_control_frames(&self) -> Vec<&CanFrame> {
        self.sent
            .iter()
            .filter(|frame| frame.data[0] >> 4 == 3)
            .collect()
    }

    fn respond(&mut self, frame: &CanFrame) {
        let pci = frame.data[0];
        match pci >> 4 {
            0x0 if frame.id == REQUEST_CAN_ID => {
                let len = (pci & 0x0F) as usize;
                match self.ecu.reply_for(&frame.data[1..1 + len]) {
                    EcuReply::Single(bytes) => self.queue(&bytes),
                    EcuReply::Segmented { first, consecutive } => {
                        self.queue(&first);
                        self.pending_consecutive = Some(consecutive);
                    }
                    EcuReply::FirstOnly(first) => self.queue(&first),
                    EcuReply::Silent => {}
                }
            }
            // The ECU answers the first flow control it sees.
            0x3 => {
                if let Some(consecutive) = self.pending_consecutive.take() {
                    self.queue(&consecutive);
                }
            }
            _ => {}
        }
    }

    fn queue(&mut self, bytes: &[u8]) {
        let frame = CanFrame::padded(RESPONSE_CAN_ID, bytes).expect("scripted reply fits");
        self.inbound.push_back(frame);
    }
}

impl CanBus for MockCanBus {
    type Error = ();

    fn try_send(&mut self, frame: &CanFrame) -> Result<(), Self::Error> {
        if self.refuse_sends > 0 {
            self.refuse_sends -= 1;
            return Err(());
        }
        self.sent.push(frame.clone());
        self.respond(frame);
        Ok(())
    }

    fn try_recv(&mut self) -> Result<Option<CanFrame>, Self::Error> {
        Ok(self.inbound.pop_front())
    }
}

#[allow(dead_code)]
pub fn can_id(raw: u16) -> CanId {
    CanId::new(raw).expect("valid 11-bit id")
}

//==================================================================================SERIAL
/// Shared byte pipe standing in for a UART pair.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct SerialPipe {
    bytes: Rc<RefCell<VecDeque<u8>>>,
    capacity: Rc<Cell<usize>>,
}

#[allow(dead_code)]
impl SerialPipe {
    /// Pipe whose writer accepts up to `capacity` buffered bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Rc::default(),
            capacity: Rc::new(Cell::new(capacity)),
        }
    }

    pub fn set_capacity(&self, capacity: usize) {
        self.capacity.set(capacity);
    }

    pub fn buffered(&self) -> usize {
        self.bytes.borrow().len()
    }

    pub fn push_bytes(&self, bytes: &[u8]) {
        self.bytes.borrow_mut().extend(bytes.iter().copied());
    }

    pub fn drain(&self) -> Vec<u8> {
        self.bytes.borrow_mut().drain(..).collect()
    }
}

impl SerialWrite for SerialPipe {
    type Error = ();

    fn write_capacity(&self) -> usize {
        self.capacity.get().saturating_sub(self.buffered())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        if bytes.len() > self.write_capacity() {
            return Err(());
        }
        self.push_bytes(bytes);
        Ok(())
    }
}

impl SerialRead for SerialPipe {
    type Error = ();

    fn try_read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        Ok(self.bytes.borrow_mut().pop_front())
    }
}

//==================================================================================TIME
/// Clock that only moves when told to.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct ManualClock {
    now: Rc<Cell<u32>>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn starting_at(now: u32) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    pub fn advance(&self, millis: u32) {
        self.now.set(self.now.get().wrapping_add(millis));
    }
}

impl MonotonicClock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}

#[allow(dead_code)]
/// Timer advancing a [`ManualClock`] by each delay, yielding to tokio in between.
pub struct SteppingTimer {
    pub clock: ManualClock,
}

impl LoopTimer for SteppingTimer {
    async fn delay_ms(&mut self, millis: u32) {
        self.clock.advance(millis);
        tokio::task::yield_now().await;
    }
}
