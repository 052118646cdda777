//! Asynchronous timer abstraction pacing the cooperative tick loop.

/// Timer trait abstraction; must remain thread-safe when applicable.
pub trait LoopTimer {
    /// Asynchronously wait for `millis` milliseconds.
    fn delay_ms<'a>(
        &'a mut self,
        millis: u32,
    ) -> impl core::future::Future<Output = ()> + 'a;
}
