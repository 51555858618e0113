//! Monotonic time source trait.

/// Monotonic millisecond clock.
///
/// Timestamps wrap at `u32::MAX`; elapsed-time math is expected to use
/// wrapping subtraction so a wrap between two samples still yields the right
/// difference.
pub trait Clock {
    /// Current monotonic time in milliseconds.
    fn now(&self) -> u32;

    /// Milliseconds elapsed since an earlier [`Clock::now`] sample.
    fn elapsed_since(&self, start: u32) -> u32 {
        self.now().wrapping_sub(start)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> u32 {
        (**self).now()
    }
}
