//! Background tasks.
//!
//! A task runs a closure on its own named thread. The returned
//! [`TaskHandle`] either joins it, turning a panic into
//! [`Error::Panicked`], or detaches it.

use crate::error::{Error, Result};
use std::any::Any;
use std::thread::JoinHandle;

/// Owned handle to a spawned task.
#[must_use = "dropping a TaskHandle detaches the task"]
#[derive(Debug)]
pub struct TaskHandle<T> {
    name: String,
    inner: JoinHandle<T>,
}

impl<T> TaskHandle<T> {
    /// Returns the task's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true once the task's closure has returned or panicked.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Waits for the task and returns its value.
    pub fn join(self) -> Result<T> {
        self.inner.join().map_err(|payload| {
            let message = panic_message(payload.as_ref());
            tracing::error!(task = %self.name, %message, "task panicked");
            Error::Panicked(message)
        })
    }

    /// Lets the task run to completion unobserved.
    ///
    /// A detached task does not keep the process alive: whatever it has not
    /// done when `main` returns is lost.
    pub fn detach(self) {
        tracing::debug!(task = %self.name, "task detached");
    }
}

/// Spawns `f` as a named background task.
pub fn spawn<F, T>(name: impl Into<String>, f: F) -> Result<TaskHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let name = name.into();
    let inner = std::thread::Builder::new()
        .name(name.clone())
        .spawn(f)
        .map_err(|source| Error::Spawn {
            name: name.clone(),
            source,
        })?;
    tracing::debug!(task = %name, "task spawned");
    Ok(TaskHandle { name, inner })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
