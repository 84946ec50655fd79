use lockstep_ports::{ClockError, ClockResult};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GateStatus {
    /// Simulated time not yet known
    Closed,
    /// Time known, waiters pass straight through
    Open,
    /// Clock shut down, every wait fails
    ShutDown,
}

#[derive(Debug, Default)]
struct GateState {
    open: bool,
    shut_down: bool,
}

impl GateState {
    fn status(&self) -> GateStatus {
        if self.shut_down {
            GateStatus::ShutDown
        } else if self.open {
            GateStatus::Open
        } else {
            GateStatus::Closed
        }
    }
}

impl GateStatus {
    fn into_result(self) -> ClockResult<()> {
        match self {
            GateStatus::ShutDown => Err(ClockError::ShutDown),
            _ => Ok(()),
        }
    }
}

/// One-shot barrier released by the first time-advance
///
/// Also carries the shutdown flag, so anything parked here (initialization
/// waiters and real-mode sleepers) is released by `shut_down`.
/// Threads park on the condvar; async tasks park on the `Notify`.
#[derive(Debug)]
pub(crate) struct InitializationGate {
    state: Mutex<GateState>,
    cv: Condvar,
    notify: Notify,
}

impl InitializationGate {
    pub(crate) fn new(open: bool) -> Self {
        Self {
            state: Mutex::new(GateState {
                open,
                shut_down: false,
            }),
            cv: Condvar::new(),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn status(&self) -> GateStatus {
        self.lock().status()
    }

    /// Open the gate, broadcasting to every waiter. Returns `false` if it was already open.
    pub(crate) fn open(&self) -> bool {
        {
            let mut state = self.lock();
            if state.open {
                return false;
            }
            state.open = true;
        }
        self.cv.notify_all();
        self.notify.notify_waiters();
        true
    }

    /// Raise the shutdown flag, broadcasting to every waiter. Returns `false` on repeat calls.
    pub(crate) fn shut_down(&self) -> bool {
        {
            let mut state = self.lock();
            if state.shut_down {
                return false;
            }
            state.shut_down = true;
        }
        self.cv.notify_all();
        self.notify.notify_waiters();
        true
    }

    /// Block until the gate opens or the clock shuts down
    pub(crate) fn wait(&self) -> ClockResult<()> {
        let guard = self
            .cv
            .wait_while(self.lock(), |state| !state.open && !state.shut_down)
            .unwrap_or_else(PoisonError::into_inner);
        guard.status().into_result()
    }

    pub(crate) async fn wait_async(&self) -> ClockResult<()> {
        loop {
            // Register interest before checking, so a broadcast between the
            // check and the await is not lost.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.status() {
                GateStatus::Closed => notified.await,
                status => return status.into_result(),
            }
        }
    }

    /// Block for `duration`, returning early with an error if the clock shuts down
    pub(crate) fn park_for(&self, duration: Duration) -> ClockResult<()> {
        let (guard, _) = self
            .cv
            .wait_timeout_while(self.lock(), duration, |state| !state.shut_down)
            .unwrap_or_else(PoisonError::into_inner);
        if guard.shut_down {
            Err(ClockError::ShutDown)
        } else {
            Ok(())
        }
    }

    pub(crate) async fn park_for_async(&self, duration: Duration) -> ClockResult<()> {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.status() == GateStatus::ShutDown {
            return Err(ClockError::ShutDown);
        }

        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = notified => Err(ClockError::ShutDown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_open_gate_does_not_block() {
        let gate = InitializationGate::new(true);
        assert_eq!(gate.status(), GateStatus::Open);
        assert!(gate.wait().is_ok());
        assert!(!gate.open());
    }

    #[test]
    fn test_open_releases_waiters() {
        let gate = Arc::new(InitializationGate::new(false));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let gate = gate.clone();
                thread::spawn(move || gate.wait())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        assert!(gate.open());

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Ok(()));
        }
    }

    #[test]
    fn test_shutdown_releases_waiters_with_error() {
        let gate = Arc::new(InitializationGate::new(false));
        let waiter = {
            let gate = gate.clone();
            thread::spawn(move || gate.wait())
        };

        thread::sleep(Duration::from_millis(20));
        assert!(gate.shut_down());
        assert!(!gate.shut_down());

        assert_eq!(waiter.join().unwrap(), Err(ClockError::ShutDown));
        assert_eq!(gate.status(), GateStatus::ShutDown);
    }

    #[test]
    fn test_park_for_interrupted_by_shutdown() {
        let gate = Arc::new(InitializationGate::new(true));
        let start = Instant::now();
        let parker = {
            let gate = gate.clone();
            thread::spawn(move || gate.park_for(Duration::from_secs(30)))
        };

        thread::sleep(Duration::from_millis(20));
        gate.shut_down();

        assert_eq!(parker.join().unwrap(), Err(ClockError::ShutDown));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_wait_async_released_by_open() {
        let gate = Arc::new(InitializationGate::new(false));
        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait_async().await })
        };

        tokio::task::yield_now().await;
        gate.open();

        assert_eq!(waiter.await.unwrap(), Ok(()));
    }
}
