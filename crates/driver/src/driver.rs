use lockstep_clock::{ClockResult, LockstepClock};
use lockstep_core::TimestampMillis;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Configuration for a time driver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Simulated time set by the first tick
    pub start_ms: TimestampMillis,
    /// Simulated milliseconds added per tick
    pub step_ms: i64,
    /// Wall-clock pause between ticks
    pub interval: Duration,
    /// Stop after this many ticks (`None` = until stopped)
    pub max_ticks: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            start_ms: 0,
            step_ms: 100,
            interval: Duration::from_millis(10),
            max_ticks: None,
        }
    }
}

/// Advances a simulated clock on a fixed cadence
pub struct TimeDriver {
    clock: Arc<LockstepClock>,
    config: DriverConfig,
    /// Time the next tick will set
    next_time: TimestampMillis,
    /// Last time actually set
    last_time: Option<TimestampMillis>,
    ticks: u64,
}

impl TimeDriver {
    /// Create a driver for `clock`
    pub fn new(clock: Arc<LockstepClock>, config: DriverConfig) -> Self {
        let next_time = config.start_ms;
        Self {
            clock,
            config,
            next_time,
            last_time: None,
            ticks: 0,
        }
    }

    /// Advance the clock once, returning the time that was set
    ///
    /// Fails with `InvalidModeOperation` if the clock is in real mode.
    pub fn tick(&mut self) -> ClockResult<TimestampMillis> {
        let time = self.next_time;
        self.clock.advance(time)?;

        self.ticks += 1;
        self.last_time = Some(time);
        self.next_time = time.saturating_add(self.config.step_ms);
        Ok(time)
    }

    /// Number of ticks performed so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Last time set on the clock
    pub fn last_time(&self) -> Option<TimestampMillis> {
        self.last_time
    }

    /// Whether the configured tick budget is spent or the clock has shut down
    pub fn is_finished(&self) -> bool {
        self.config.max_ticks.is_some_and(|max| self.ticks >= max) || self.clock.is_shut_down()
    }

    /// Run for a specified number of ticks
    pub async fn run_ticks(&mut self, num_ticks: u64) -> ClockResult<()> {
        for i in 0..num_ticks {
            self.tick()?;
            if i + 1 < num_ticks {
                tokio::time::sleep(self.config.interval).await;
            }
        }
        Ok(())
    }

    /// Run until the tick budget is spent or the clock shuts down
    pub async fn run(&mut self) -> ClockResult<()> {
        log::info!(
            "Time driver started ({}ms step, {:?} interval)",
            self.config.step_ms,
            self.config.interval
        );
        while !self.is_finished() {
            self.tick()?;
            if self.is_finished() {
                break;
            }
            tokio::time::sleep(self.config.interval).await;
        }
        log::info!("Time driver stopped after {} ticks", self.ticks);
        Ok(())
    }

    /// Run on a dedicated thread until stopped
    pub fn spawn(mut self) -> DriverHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        let thread = thread::spawn(move || -> ClockResult<Option<TimestampMillis>> {
            log::info!(
                "Time driver thread started ({}ms step, {:?} interval)",
                self.config.step_ms,
                self.config.interval
            );
            while !stop_flag.load(Ordering::Acquire) && !self.is_finished() {
                let time = self.tick()?;
                log::trace!("Driver tick {} set {}ms", self.ticks, time);
                if self.is_finished() {
                    break;
                }
                thread::sleep(self.config.interval);
            }
            log::info!("Time driver thread stopped after {} ticks", self.ticks);
            Ok(self.last_time)
        });

        DriverHandle { stop, thread }
    }
}

/// Handle to a driver running on its own thread
pub struct DriverHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<ClockResult<Option<TimestampMillis>>>,
}

impl DriverHandle {
    /// Ask the driver to stop after its current tick
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Wait for the driver thread, returning the last time it set
    pub fn join(self) -> ClockResult<Option<TimestampMillis>> {
        match self.thread.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Stop the driver and wait for it
    pub fn shutdown(self) -> ClockResult<Option<TimestampMillis>> {
        self.stop();
        self.join()
    }
}
