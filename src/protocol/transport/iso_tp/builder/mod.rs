//! Frame generator for the poller's outgoing traffic: single-frame requests
//! and the flow-control frames granting a peer permission to finish a
//! segmented reply.
use crate::error::FrameBuildError;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::CanId;
use crate::protocol::transport::iso_tp::MAX_SINGLE_FRAME_LEN;

/// Flow status "continue to send".
pub const FLOW_STATUS_CONTINUE: u8 = 0x00;

/// Encode `request` (service byte followed by its identifier bytes) as a
/// zero-padded single frame: `[len, request..., 0...]`.
pub fn request_frame(id: CanId, request: &[u8]) -> Result<CanFrame, FrameBuildError> {
    if request.is_empty() || request.len() > MAX_SINGLE_FRAME_LEN {
        return Err(FrameBuildError::InvalidRequestLength { len: request.len() });
    }
    let mut data = [0u8; 8];
    data[0] = request.len() as u8;
    data[1..=request.len()].copy_from_slice(request);
    CanFrame::padded(id, &data)
}

/// Encode a "continue to send" flow-control frame:
/// `[0x30, block_size, separation_ms, 0, 0, 0, 0, 0]`.
///
/// A `block_size` of `0` grants an unlimited block.
pub fn flow_control_frame(id: CanId, block_size: u8, separation_ms: u8) -> CanFrame {
    CanFrame {
        id,
        data: [
            0x30 | FLOW_STATUS_CONTINUE,
            block_size,
            separation_ms,
            0,
            0,
            0,
            0,
            0,
        ],
        len: 8,
    }
}
