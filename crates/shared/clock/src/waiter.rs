use lockstep_core::TimestampMillis;
use lockstep_ports::{ClockError, ClockResult};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use tokio::sync::oneshot;

/// Why a registered sleeper was released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WakeReason {
    /// Simulated time reached the sleeper's deadline
    DeadlineReached,
    /// The clock shut down first
    Cancelled,
}

impl WakeReason {
    pub(crate) fn into_result(self) -> ClockResult<()> {
        match self {
            WakeReason::DeadlineReached => Ok(()),
            WakeReason::Cancelled => Err(ClockError::ShutDown),
        }
    }
}

/// Single-use wake channel owned by one blocked thread
///
/// The slot stays `Some` once fired, so a spurious condvar wakeup can never
/// release the thread early.
#[derive(Debug, Default)]
pub(crate) struct WakeChannel {
    reason: Mutex<Option<WakeReason>>,
    cv: Condvar,
}

impl WakeChannel {
    fn fire(&self, reason: WakeReason) {
        {
            let mut slot = self.reason.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                return;
            }
            *slot = Some(reason);
        }
        self.cv.notify_one();
    }

    /// Block until fired
    pub(crate) fn wait(&self) -> WakeReason {
        let slot = self
            .cv
            .wait_while(
                self.reason.lock().unwrap_or_else(PoisonError::into_inner),
                |reason| reason.is_none(),
            )
            .unwrap_or_else(PoisonError::into_inner);
        slot.unwrap_or(WakeReason::Cancelled)
    }
}

#[derive(Debug)]
enum Waker {
    Thread(Arc<WakeChannel>),
    Task(oneshot::Sender<WakeReason>),
}

impl Waker {
    /// An async sleeper whose future was dropped before it was woken
    fn is_abandoned(&self) -> bool {
        match self {
            Waker::Thread(_) => false,
            Waker::Task(sender) => sender.is_closed(),
        }
    }

    fn wake(self, reason: WakeReason) {
        match self {
            Waker::Thread(channel) => channel.fire(reason),
            Waker::Task(sender) => {
                // Receiver gone means the sleeping future was dropped
                let _ = sender.send(reason);
            }
        }
    }
}

#[derive(Debug)]
struct WaiterEntry {
    deadline: TimestampMillis,
    waker: Waker,
}

/// Outstanding "wake me at T" requests
///
/// Unordered; every advance scans the whole collection. Entries are removed
/// in the same call that signals them, so the caller holding the registry
/// lock makes removal and signalling atomic. Entries of async sleepers whose
/// future was dropped are pruned on every registration, scan and count.
#[derive(Debug, Default)]
pub(crate) struct WaiterRegistry {
    entries: Vec<WaiterEntry>,
    closed: bool,
}

impl WaiterRegistry {
    /// Fail if the registry no longer accepts sleepers
    pub(crate) fn ensure_open(&self) -> ClockResult<()> {
        if self.closed {
            Err(ClockError::ShutDown)
        } else {
            Ok(())
        }
    }

    /// Register a blocking thread, returning the channel it should wait on
    pub(crate) fn register_thread(
        &mut self,
        deadline: TimestampMillis,
    ) -> ClockResult<Arc<WakeChannel>> {
        self.ensure_open()?;
        self.prune_abandoned();
        let channel = Arc::new(WakeChannel::default());
        self.entries.push(WaiterEntry {
            deadline,
            waker: Waker::Thread(channel.clone()),
        });
        Ok(channel)
    }

    /// Register an async task, returning the receiver it should await
    pub(crate) fn register_task(
        &mut self,
        deadline: TimestampMillis,
    ) -> ClockResult<oneshot::Receiver<WakeReason>> {
        self.ensure_open()?;
        self.prune_abandoned();
        let (sender, receiver) = oneshot::channel();
        self.entries.push(WaiterEntry {
            deadline,
            waker: Waker::Task(sender),
        });
        Ok(receiver)
    }

    /// Signal and remove every entry whose deadline is at or before `now`
    pub(crate) fn release_due(&mut self, now: TimestampMillis) -> usize {
        self.prune_abandoned();
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.deadline <= now);
        self.entries = pending;

        let released = due.len();
        for entry in due {
            entry.waker.wake(WakeReason::DeadlineReached);
        }
        released
    }

    /// Stop accepting sleepers and cancel every outstanding one
    pub(crate) fn close(&mut self) -> usize {
        self.closed = true;
        self.prune_abandoned();
        let cancelled = self.entries.len();
        for entry in self.entries.drain(..) {
            entry.waker.wake(WakeReason::Cancelled);
        }
        cancelled
    }

    /// Number of sleepers still waiting
    pub(crate) fn len(&mut self) -> usize {
        self.prune_abandoned();
        self.entries.len()
    }

    fn prune_abandoned(&mut self) {
        self.entries.retain(|entry| !entry.waker.is_abandoned());
    }
}
