//! Lockstep Driver - External time source for simulated clocks
//!
//! Plays the driver role for a [`LockstepClock`](lockstep_clock::LockstepClock)
//! in simulated mode: advances it by a fixed step at a fixed wall-clock
//! interval, so participants blocked in `wait_for_initialization` or
//! `sleep_until` make progress.
//!
//! - **Thread driver**: [`TimeDriver::spawn`] runs on a dedicated OS thread.
//! - **Async driver**: [`TimeDriver::run`] / [`TimeDriver::run_ticks`] run on a tokio task.

pub mod driver;

pub use driver::{DriverConfig, DriverHandle, TimeDriver};
