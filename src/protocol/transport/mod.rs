//! CAN transport layer: frame representation, 11-bit identifiers, segmented
//! replies (single/first/consecutive frames with flow control), and bus
//! abstraction traits.
//!
//! ## Polling Timing Constants
//!
//! These constants define the default pacing of the request/response cycle.
//! They can be overridden through
//! [`PollConfig`](crate::protocol::polling::PollConfig).

pub mod can_frame;
pub mod can_id;
pub mod iso_tp;
pub mod traits;

/// Default time to wait for a complete reply before skipping a sensor (ms).
///
/// A timeout is a normal cycle edge, not an error: the slot is left untouched
/// and the next request goes out immediately. At 500 kbit/s a two-frame reply
/// plus flow control completes in well under 10 ms, so 150 ms only trips for
/// ECUs that do not answer at all.
pub const REPLY_TIMEOUT_MS: u32 = 150;

/// Default pause between the end of one full poll cycle and the next (ms).
pub const POLL_INTERVAL_MS: u32 = 250;

/// Minimum separation time (STmin) granted to the peer in flow control (ms).
pub const FLOW_CONTROL_SEPARATION_MS: u8 = 5;

/// Block size granted in flow control. `0` lets the peer send every
/// remaining consecutive frame without waiting for another flow control.
pub const FLOW_CONTROL_BLOCK_SIZE: u8 = 0;

/// Upper bound on frames drained from the bus in a single tick, so a noisy
/// bus can never starve the rest of the loop.
pub const MAX_FRAMES_PER_TICK: usize = 16;
