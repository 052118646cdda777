//! Monotonic millisecond clock injected into the polling and link layers so
//! they can be driven without real time passing.

/// Source of a monotonically increasing millisecond counter.
///
/// The counter is allowed to wrap; every comparison goes through
/// [`deadline_reached`] / [`elapsed_ms`].
pub trait MonotonicClock {
    /// Current time in milliseconds.
    fn now_ms(&self) -> u32;
}

/// Milliseconds elapsed from `since` to `now`, tolerating counter wraparound.
#[inline]
pub fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Whether `now` is at or past `deadline`, tolerating counter wraparound.
///
/// Valid as long as deadlines are never scheduled more than `i32::MAX` ms ahead.
#[inline]
pub fn deadline_reached(now: u32, deadline: u32) -> bool {
    (now.wrapping_sub(deadline) as i32) >= 0
}
