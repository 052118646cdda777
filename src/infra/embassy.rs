//! `embassy-time` implementations of the clock and loop-timer traits for
//! firmware builds.
use embassy_time::{Instant, Timer};

use crate::protocol::transport::traits::{clock::MonotonicClock, loop_timer::LoopTimer};

/// Clock reading the embassy time driver. Truncates to `u32`, which wraps
/// after ~49 days; all deadline arithmetic is wraparound-safe.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyClock;

impl MonotonicClock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }
}

/// Loop timer backed by `embassy_time::Timer`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyTimer;

impl LoopTimer for EmbassyTimer {
    async fn delay_ms(&mut self, millis: u32) {
        Timer::after_millis(millis as u64).await;
    }
}
