use lockstep_core::{TimestampMillis, TimestampSeconds, to_seconds, wall_clock_millis};
use lockstep_ports::{Clock, ClockError, ClockResult};
use log::{debug, info, trace, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockWriteGuard};
use std::time::Duration;

use crate::config::{ClockConfig, ClockMode};
use crate::gate::{GateStatus, InitializationGate};
use crate::waiter::WaiterRegistry;

/// Shared time source for every participant in a simulation
///
/// In [`ClockMode::Real`] every query reads the host wall clock. In
/// [`ClockMode::Simulated`] time only moves when a driver calls
/// [`advance`](Self::advance), and callers can block until the first
/// advance or until time reaches a deadline.
///
/// The clock is handed out as `Arc<LockstepClock>` and is not `Clone`:
/// all holders observe the same state.
///
/// Locking: the current time, the initialization gate and the sleeper
/// registry each have their own lock. A sleeper reads the current time while
/// holding the registry lock, and `advance` scans the registry under that
/// lock after storing the new time, so a registration is either seen by the
/// scan or sees the new time itself.
pub struct LockstepClock {
    mode: ClockMode,
    name: String,
    /// `None` until the first advance (simulated mode only)
    current_time: RwLock<Option<TimestampMillis>>,
    gate: InitializationGate,
    sleepers: Mutex<WaiterRegistry>,
}

impl LockstepClock {
    /// Create a new clock
    ///
    /// # Arguments
    /// * `simulation_mode` - `true` for externally driven time, `false` for wall-clock time
    pub fn new(simulation_mode: bool) -> Arc<Self> {
        let config = ClockConfig {
            mode: ClockMode::from_simulation_flag(simulation_mode),
            ..Default::default()
        };
        Self::with_config(config)
    }

    /// Create with custom configuration
    pub fn with_config(config: ClockConfig) -> Arc<Self> {
        // A real clock needs no external seed
        let initialized = config.mode == ClockMode::Real;

        Arc::new(Self {
            mode: config.mode,
            name: config.name,
            current_time: RwLock::new(None),
            gate: InitializationGate::new(initialized),
            sleepers: Mutex::new(WaiterRegistry::default()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    pub fn is_simulation_mode(&self) -> bool {
        self.mode == ClockMode::Simulated
    }

    /// Current time in milliseconds
    ///
    /// Fails with [`ClockError::UninitializedClock`] in simulated mode before the first advance.
    pub fn now(&self) -> ClockResult<TimestampMillis> {
        match self.mode {
            ClockMode::Real => Ok(wall_clock_millis()),
            ClockMode::Simulated => self.simulated_now(),
        }
    }

    /// Current time in whole seconds, truncated toward zero
    pub fn now_seconds(&self) -> ClockResult<TimestampSeconds> {
        self.now().map(to_seconds)
    }

    /// Set simulated time and wake everything it releases
    ///
    /// The first call opens the initialization gate. Every sleeper whose
    /// deadline is at or before the new time is signalled and removed.
    /// Time is stored as given; a smaller value rewinds the clock.
    pub fn advance(&self, new_time: TimestampMillis) -> ClockResult<()> {
        if !self.is_simulation_mode() {
            return Err(ClockError::InvalidModeOperation {
                operation: "advance",
            });
        }

        let previous = self.write_time().replace(new_time);

        match previous {
            None => {
                info!("[{}] Simulated time initialized at {}ms", self.name, new_time);
                self.gate.open();
            }
            Some(previous) if new_time < previous => {
                warn!(
                    "[{}] Simulated time rewound from {}ms to {}ms",
                    self.name, previous, new_time
                );
            }
            Some(_) => {}
        }

        let (released, pending) = {
            let mut sleepers = self.lock_sleepers();
            // Concurrent advances may have landed since our write; scan against the latest
            let now = self.read_time().unwrap_or(new_time);
            (sleepers.release_due(now), sleepers.len())
        };

        debug!(
            "[{}] Advanced to {}ms, released {} sleepers ({} pending)",
            self.name, new_time, released, pending
        );
        Ok(())
    }

    /// Block until simulated time has been set at least once
    ///
    /// Returns immediately in real mode or once initialized.
    pub fn wait_for_initialization(&self) -> ClockResult<()> {
        self.gate.wait()
    }

    /// Async form of [`wait_for_initialization`](Self::wait_for_initialization)
    pub async fn wait_for_initialization_async(&self) -> ClockResult<()> {
        self.gate.wait_async().await
    }

    /// Block until the clock reaches `deadline`
    ///
    /// Simulated mode returns immediately if the deadline has already
    /// passed; otherwise only an [`advance`](Self::advance) to `deadline` or
    /// later releases the caller. Real mode sleeps on the wall clock.
    pub fn sleep_until(&self, deadline: TimestampMillis) -> ClockResult<()> {
        match self.mode {
            ClockMode::Real => self.gate.park_for(Self::wall_clock_remaining(deadline)),
            ClockMode::Simulated => {
                let channel = {
                    let mut sleepers = self.lock_sleepers();
                    if !self.needs_registration(&sleepers, deadline)? {
                        return Ok(());
                    }
                    sleepers.register_thread(deadline)?
                };
                trace!("[{}] Thread sleeping until {}ms", self.name, deadline);
                channel.wait().into_result()
            }
        }
    }

    /// Block for `duration_ms` of clock time, measured from the current time
    pub fn sleep_for(&self, duration_ms: i64) -> ClockResult<()> {
        let deadline = self.sleep_base()?.saturating_add(duration_ms);
        self.sleep_until(deadline)
    }

    /// Async form of [`sleep_until`](Self::sleep_until)
    ///
    /// Dropping the future before it completes abandons its registry entry;
    /// the entry is pruned before the registry is next touched.
    pub async fn sleep_until_async(&self, deadline: TimestampMillis) -> ClockResult<()> {
        match self.mode {
            ClockMode::Real => {
                self.gate
                    .park_for_async(Self::wall_clock_remaining(deadline))
                    .await
            }
            ClockMode::Simulated => {
                let receiver = {
                    let mut sleepers = self.lock_sleepers();
                    if !self.needs_registration(&sleepers, deadline)? {
                        return Ok(());
                    }
                    sleepers.register_task(deadline)?
                };
                trace!("[{}] Task sleeping until {}ms", self.name, deadline);
                // A dropped sender means the registry went away with the clock
                receiver
                    .await
                    .map_err(|_| ClockError::ShutDown)?
                    .into_result()
            }
        }
    }

    /// Async form of [`sleep_for`](Self::sleep_for)
    pub async fn sleep_for_async(&self, duration_ms: i64) -> ClockResult<()> {
        let deadline = self.sleep_base()?.saturating_add(duration_ms);
        self.sleep_until_async(deadline).await
    }

    /// Release every blocked caller with [`ClockError::ShutDown`]
    ///
    /// Idempotent. Later blocking calls fail immediately; queries and
    /// `advance` keep working.
    pub fn shutdown(&self) {
        if !self.gate.shut_down() {
            return;
        }
        let cancelled = self.lock_sleepers().close();
        info!(
            "[{}] Clock shut down, cancelled {} sleepers",
            self.name, cancelled
        );
    }

    pub fn is_shut_down(&self) -> bool {
        self.gate.status() == GateStatus::ShutDown
    }

    /// Number of callers currently waiting on a simulated deadline
    pub fn pending_sleepers(&self) -> usize {
        self.lock_sleepers().len()
    }

    /// Base time for relative sleeps; shutdown takes precedence over an uninitialized clock
    fn sleep_base(&self) -> ClockResult<TimestampMillis> {
        if self.is_shut_down() {
            return Err(ClockError::ShutDown);
        }
        self.now()
    }

    /// Decide, under the registry lock, whether a simulated sleeper must block
    fn needs_registration(
        &self,
        sleepers: &WaiterRegistry,
        deadline: TimestampMillis,
    ) -> ClockResult<bool> {
        sleepers.ensure_open()?;
        Ok(deadline > self.simulated_now()?)
    }

    fn simulated_now(&self) -> ClockResult<TimestampMillis> {
        self.read_time().ok_or(ClockError::UninitializedClock)
    }

    fn wall_clock_remaining(deadline: TimestampMillis) -> Duration {
        let remaining = deadline.saturating_sub(wall_clock_millis());
        Duration::from_millis(u64::try_from(remaining).unwrap_or(0))
    }

    fn read_time(&self) -> Option<TimestampMillis> {
        *self
            .current_time
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_time(&self) -> RwLockWriteGuard<'_, Option<TimestampMillis>> {
        self.current_time
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_sleepers(&self) -> MutexGuard<'_, WaiterRegistry> {
        self.sleepers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for LockstepClock {
    fn now_millis(&self) -> ClockResult<TimestampMillis> {
        self.now()
    }

    fn is_simulation_mode(&self) -> bool {
        LockstepClock::is_simulation_mode(self)
    }

    fn name(&self) -> &str {
        LockstepClock::name(self)
    }
}
