//! Segmented diagnostic replies (ISO 15765-2 framing subset): classifies the
//! protocol-control byte of each frame, reassembles single- and two-frame
//! replies, and builds the request and flow-control frames sent by the poller.
//!
//! Only what a request-then-response poller needs is implemented: one reply
//! in flight, no interleaving, no block-size negotiation from the peer.

/// Useful bytes carried by a first frame after its two PCI bytes.
pub const FIRST_FRAME_DATA_LEN: usize = 6;
/// Useful bytes carried by a consecutive frame after its PCI byte.
pub const CONSECUTIVE_FRAME_DATA_LEN: usize = 7;
/// Largest reply the assembler keeps: one first frame plus one consecutive frame.
pub const MAX_REPLY_LEN: usize = FIRST_FRAME_DATA_LEN + CONSECUTIVE_FRAME_DATA_LEN;
/// Largest message a single frame can carry.
pub const MAX_SINGLE_FRAME_LEN: usize = 7;

pub mod assembler;
pub mod builder;

//==================================================================================PROTOCOL_CONTROL
/// Role of a frame, decoded from the top nibble of its first payload byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolControl {
    /// `0x0_`: the whole message fits in this frame; low nibble is its length.
    Single { len: u8 },
    /// `0x1_`: start of a segmented message; low nibble + next byte give the
    /// 12-bit total length.
    First { total_len: u16 },
    /// `0x2_`: continuation; low nibble is the wrapping 1-based sequence number.
    Consecutive { sequence: u8 },
    /// `0x3_`: flow control; low nibble is the flow status.
    FlowControl { status: u8 },
    /// `0x4_`..`0xF_`: not part of the framing scheme.
    Reserved { nibble: u8 },
}

impl ProtocolControl {
    /// Classify a frame payload. Returns `None` for an empty payload or a
    /// first frame missing its length byte.
    pub fn classify(payload: &[u8]) -> Option<Self> {
        let pci = *payload.first()?;
        let low = pci & 0x0F;
        let control = match pci >> 4 {
            0x0 => Self::Single { len: low },
            0x1 => {
                let low_byte = *payload.get(1)?;
                Self::First {
                    total_len: ((low as u16) << 8) | low_byte as u16,
                }
            }
            0x2 => Self::Consecutive { sequence: low },
            0x3 => Self::FlowControl { status: low },
            nibble => Self::Reserved { nibble },
        };
        Some(control)
    }
}
