//! In-memory representation of a classic CAN data frame on the diagnostic bus.
use crate::error::FrameBuildError;
use crate::protocol::transport::can_id::CanId;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Raw frame as read from or written to the CAN bus.
pub struct CanFrame {
    /// Standard 11-bit identifier.
    pub id: CanId,
    /// Payload buffer. Classic CAN frames always provide eight bytes.
    pub data: [u8; 8],
    /// Number of valid payload bytes (Data Length Code, 0 to 8).
    pub len: usize,
}

impl CanFrame {
    /// Build a frame carrying exactly `bytes`.
    pub fn new(id: CanId, bytes: &[u8]) -> Result<Self, FrameBuildError> {
        if bytes.len() > 8 {
            return Err(FrameBuildError::PayloadTooLong { len: bytes.len() });
        }
        let mut data = [0u8; 8];
        data[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            id,
            data,
            len: bytes.len(),
        })
    }

    /// Build a full eight-byte frame, zero-padding the unused tail.
    pub fn padded(id: CanId, bytes: &[u8]) -> Result<Self, FrameBuildError> {
        let mut frame = Self::new(id, bytes)?;
        frame.len = 8;
        Ok(frame)
    }

    /// Valid payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len.min(8)]
    }
}

impl embedded_can::Frame for CanFrame {
    fn new(id: impl Into<embedded_can::Id>, data: &[u8]) -> Option<Self> {
        let id = CanId::try_from(id.into()).ok()?;
        CanFrame::new(id, data).ok()
    }

    /// Remote frames are never used on the diagnostic channel.
    fn new_remote(_id: impl Into<embedded_can::Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        false
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> embedded_can::Id {
        self.id.into()
    }

    fn dlc(&self) -> usize {
        self.len
    }

    fn data(&self) -> &[u8] {
        self.payload()
    }
}
