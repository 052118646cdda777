//! Creation and validation of the 11-bit standard CAN identifiers used by the
//! diagnostic request/response pair.
use crate::error::FrameBuildError;
use embedded_can::{Id, StandardId};

/// Identifier the poller sends its requests to.
pub const REQUEST_CAN_ID: CanId = CanId(0x7E2);
/// Identifier the peer ECU answers on (request + 8).
pub const RESPONSE_CAN_ID: CanId = CanId(0x7EA);

//==================================================================================CAN_ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Encapsulates a standard CAN identifier (11 bits).
pub struct CanId(u16);

impl CanId {
    /// Highest identifier representable on 11 bits.
    pub const MAX: u16 = 0x7FF;

    /// Validates `raw` against the 11-bit range.
    pub fn new(raw: u16) -> Result<Self, FrameBuildError> {
        if raw > Self::MAX {
            return Err(FrameBuildError::InvalidIdentifier { raw });
        }
        Ok(Self(raw))
    }

    /// Raw identifier value.
    pub const fn raw(&self) -> u16 {
        self.0
    }

    /// Conventional response identifier for a physical request id (`+ 8`).
    pub fn response_id(&self) -> Result<Self, FrameBuildError> {
        Self::new(self.0 + 8)
    }
}

impl From<CanId> for StandardId {
    fn from(id: CanId) -> Self {
        // The constructor guarantees the 11-bit range.
        StandardId::new(id.0).unwrap_or(StandardId::MAX)
    }
}

impl From<CanId> for Id {
    fn from(id: CanId) -> Self {
        Id::Standard(id.into())
    }
}

impl From<StandardId> for CanId {
    fn from(id: StandardId) -> Self {
        Self(id.as_raw())
    }
}

impl TryFrom<Id> for CanId {
    type Error = FrameBuildError;

    /// Only standard identifiers map onto the diagnostic channel pair.
    fn try_from(id: Id) -> Result<Self, Self::Error> {
        match id {
            Id::Standard(standard) => Ok(standard.into()),
            Id::Extended(extended) => Err(FrameBuildError::InvalidIdentifier {
                raw: (extended.as_raw() & 0xFFFF) as u16,
            }),
        }
    }
}
