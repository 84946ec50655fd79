//! Lockstep Core
//!
//! Timestamp value types shared by every Lockstep crate.
//! This crate contains no locking, no async, and is 100% unit testable.

pub mod values;

// Re-export commonly used types at crate root
pub use values::{
    TimestampMillis, TimestampSeconds, from_datetime, to_datetime, to_seconds, wall_clock_millis,
    wall_clock_seconds,
};
