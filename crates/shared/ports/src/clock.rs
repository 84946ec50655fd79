use lockstep_core::{TimestampMillis, TimestampSeconds};

use crate::ClockResult;

/// Port for time abstraction
///
/// This allows every participant to read the same notion of "now":
/// - Real wall-clock time for production
/// - Externally driven simulated time for tests and co-simulation
pub trait Clock: Send + Sync {
    /// Current time in milliseconds
    ///
    /// Fails with [`ClockError::UninitializedClock`](crate::ClockError::UninitializedClock)
    /// when simulated time has not been set yet.
    fn now_millis(&self) -> ClockResult<TimestampMillis>;

    /// Current time in whole seconds, truncated
    fn now_seconds(&self) -> ClockResult<TimestampSeconds> {
        self.now_millis().map(lockstep_core::to_seconds)
    }

    /// Whether time is driven externally rather than read from the host
    fn is_simulation_mode(&self) -> bool;

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}
