/*++

Licensed under the Apache-2.0 license.

File Name:

    sync.rs

Abstract:

    Blocking primitives used by the startup and offload handshakes.

--*/

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Lock a mutex, tolerating poisoning. State guarded by these mutexes is
/// only ever written in single assignments, so a panicking holder cannot
/// leave it half-updated.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn wait<'a, T>(cond: &Condvar, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
    cond.wait(guard).unwrap_or_else(PoisonError::into_inner)
}

/// Semaphore with an initial count of 0 and a limit of 1.
///
/// Giving an already available semaphore has no effect, so at most one
/// wakeup is ever outstanding.
#[derive(Default)]
pub struct BinarySemaphore {
    available: Mutex<bool>,
    cond: Condvar,
}

impl BinarySemaphore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the semaphore available and wake one taker. Never blocks for
    /// longer than the internal lock hold time.
    pub fn give(&self) {
        let mut available = lock(&self.available);
        *available = true;
        self.cond.notify_one();
    }

    /// Block until the semaphore is available, then consume it.
    pub fn take(&self) {
        let mut available = lock(&self.available);
        while !*available {
            available = wait(&self.cond, available);
        }
        *available = false;
    }

    /// Consume the semaphore if it is available.
    pub fn try_take(&self) -> bool {
        let mut available = lock(&self.available);
        std::mem::replace(&mut *available, false)
    }
}
