//! Timer driver for deadline and sleep registrations.
//!
//! The driver owns a [`TimerHeap`] and one worker thread that sleeps on a
//! condition variable until the earliest deadline, then runs the actions of
//! every expired registration. Actions run on the worker thread with the
//! driver lock released, so they may register or cancel other timers.
//!
//! Cancelling a registration removes its heap entry, so the worker never
//! wakes for a timer nobody is waiting on.

use super::timer::{TimerHeap, TimerKey};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;
use std::time::Instant;

/// Work run once when a timer expires.
pub type TimerAction = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct DriverState {
    heap: TimerHeap,
    actions: HashMap<TimerKey, TimerAction>,
    shutdown: bool,
}

#[derive(Default)]
struct Shared {
    state: Mutex<DriverState>,
    wakeup: Condvar,
}

/// Cloneable handle for registering timers with a running driver.
#[derive(Clone)]
pub struct TimerHandle {
    shared: Arc<Shared>,
}

impl TimerHandle {
    /// Returns the handle of the process-wide driver, starting it on first
    /// use.
    ///
    /// # Panics
    ///
    /// Panics if the driver thread cannot be spawned.
    #[must_use]
    pub fn global() -> Self {
        static GLOBAL: OnceLock<TimerDriver> = OnceLock::new();
        GLOBAL.get_or_init(TimerDriver::new).handle()
    }

    /// Registers `action` to run once `deadline` has passed.
    pub fn register(&self, deadline: Instant, action: TimerAction) -> TimerKey {
        let key = {
            let mut state = self.shared.state.lock();
            let key = state.heap.insert(deadline);
            state.actions.insert(key, action);
            key
        };
        tracing::trace!(generation = key.generation(), "timer registered");
        self.shared.wakeup.notify_one();
        key
    }

    /// Cancels a pending registration.
    ///
    /// Returns `true` if the action had not run yet and will now never run.
    pub fn cancel(&self, key: TimerKey) -> bool {
        let removed = {
            let mut state = self.shared.state.lock();
            state.heap.remove(key);
            state.actions.remove(&key).is_some()
        };
        if removed {
            tracing::trace!(generation = key.generation(), "timer cancelled");
        }
        removed
    }

    /// Returns the number of registrations whose action has not run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.state.lock().actions.len()
    }

    /// Returns the number of queued heap entries.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.shared.state.lock().heap.len()
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("pending", &self.pending())
            .finish()
    }
}

/// A timer driver and its worker thread.
///
/// Dropping the driver stops the worker; registrations that have not
/// expired by then never run.
pub struct TimerDriver {
    handle: TimerHandle,
    worker: Option<JoinHandle<()>>,
}

impl TimerDriver {
    /// Starts a new driver.
    ///
    /// # Panics
    ///
    /// Panics if the worker thread cannot be spawned.
    #[must_use]
    pub fn new() -> Self {
        let shared = Arc::new(Shared::default());
        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("cancel-lines-timer".into())
            .spawn(move || run(&worker_shared))
            .expect("failed to spawn timer driver thread");
        Self {
            handle: TimerHandle { shared },
            worker: Some(worker),
        }
    }

    /// Returns a handle for registering timers.
    #[must_use]
    pub fn handle(&self) -> TimerHandle {
        self.handle.clone()
    }
}

impl Default for TimerDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.handle.shared.state.lock().shutdown = true;
        self.handle.shared.wakeup.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run(shared: &Shared) {
    let mut state = shared.state.lock();
    loop {
        if state.shutdown {
            break;
        }

        let expired = state.heap.pop_expired(Instant::now());
        let due: Vec<TimerAction> = expired
            .into_iter()
            .filter_map(|key| state.actions.remove(&key))
            .collect();
        if !due.is_empty() {
            tracing::trace!(count = due.len(), "timers expired");
            parking_lot::MutexGuard::unlocked(&mut state, || {
                for action in due {
                    action();
                }
            });
            continue;
        }

        match state.heap.peek_deadline() {
            Some(deadline) => {
                shared.wakeup.wait_until(&mut state, deadline);
            }
            None => shared.wakeup.wait(&mut state),
        }
    }
}
