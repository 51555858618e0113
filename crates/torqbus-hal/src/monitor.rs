//! Watchdog and activity monitor trait.

use std::sync::Arc;

/// Supervisory watchdog and bus-activity monitor.
///
/// Receivers take `&self` so a single monitor instance can be shared by the
/// signal handler and the motor controller; implementations use interior
/// mutability for their counters.
pub trait SystemMonitor {
    /// Kick the watchdog. Each periodic core entry point does this exactly
    /// once per invocation.
    fn feed_watchdog(&self);

    /// Record that application traffic was handled this cycle.
    fn report_activity(&self);
}

impl<M: SystemMonitor + ?Sized> SystemMonitor for &M {
    fn feed_watchdog(&self) {
        (**self).feed_watchdog()
    }

    fn report_activity(&self) {
        (**self).report_activity()
    }
}

impl<M: SystemMonitor + ?Sized> SystemMonitor for Arc<M> {
    fn feed_watchdog(&self) {
        (**self).feed_watchdog()
    }

    fn report_activity(&self) {
        (**self).report_activity()
    }
}
