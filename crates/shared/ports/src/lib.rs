//! Lockstep Ports
//!
//! Port definitions (traits) for the Lockstep clock.
//! Participants program against these; the clock crate provides the implementation.

mod clock;
mod error;

pub use clock::Clock;
pub use error::{ClockError, ClockResult};
