//! Lockstep Clock
//!
//! A single time source that every participant in a simulation or test
//! harness reads, in one of two modes:
//!
//! - **Real**: host wall-clock time.
//! - **Simulated**: time set only by an external driver calling `advance`.
//!
//! ## Coordination
//!
//! ```text
//!   driver thread                      participant threads
//!   ─────────────                      ───────────────────
//!   advance(t) ──► current time ◄───── now() / now_seconds()
//!        │
//!        ├──► initialization gate ◄─── wait_for_initialization()
//!        │      (opened once, broadcast)
//!        │
//!        └──► sleeper registry ◄────── sleep_until(d) / sleep_for(ms)
//!               (entries with d <= t are signalled and removed)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use lockstep_clock::LockstepClock;
//!
//! let clock = LockstepClock::new(true);
//!
//! let worker = {
//!     let clock = clock.clone();
//!     std::thread::spawn(move || {
//!         clock.wait_for_initialization()?;
//!         clock.sleep_until(1_500)?;       // returns at once if already past
//!         clock.now()
//!     })
//! };
//!
//! clock.advance(1_000)?;                   // releases the initialization gate
//! clock.advance(1_500)?;                   // releases the sleeper
//! ```

mod config;
mod gate;
mod lockstep;
mod waiter;

pub use config::{ClockConfig, ClockMode};
pub use lockstep::LockstepClock;

// Re-export the Clock port and its errors for convenience
pub use lockstep_ports::{Clock, ClockError, ClockResult};
