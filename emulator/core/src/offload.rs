/*++

Licensed under the Apache-2.0 license.

File Name:

    offload.rs

Abstract:

    Single-slot broker that runs caller supplied routines on the kernel
    context by way of a simulated interrupt.

--*/

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};

use log::{error, trace};

use crate::irq::{Delivery, Isr};
use crate::sync::{lock, wait, BinarySemaphore};

/// Work handed to the kernel context. Captures its own argument.
pub type Routine = Box<dyn FnOnce() + Send + 'static>;

type PanicPayload = Box<dyn Any + Send + 'static>;

enum OffloadState {
    Idle,
    /// Routine stored and interrupt raised, handler not yet woken.
    Requested(Routine),
    /// Handler took the routine and is executing it.
    Delivered,
    /// Handler finished. Carries the panic payload if the routine panicked.
    Completed(Option<PanicPayload>),
}

/// Observable phase of the broker's single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffloadPhase {
    Idle,
    Requested,
    Delivered,
    Completed,
}

impl From<&OffloadState> for OffloadPhase {
    fn from(state: &OffloadState) -> Self {
        match state {
            OffloadState::Idle => OffloadPhase::Idle,
            OffloadState::Requested(_) => OffloadPhase::Requested,
            OffloadState::Delivered => OffloadPhase::Delivered,
            OffloadState::Completed(_) => OffloadPhase::Completed,
        }
    }
}

/// Producer/consumer handshake between arbitrary caller threads and the one
/// thread running [`OffloadBroker::run_handler_loop`].
///
/// Two channels are kept apart on purpose: the availability semaphore wakes
/// the handler, the completion condition wakes the producer.
///
/// Preconditions (not checked at runtime, violating them deadlocks):
/// * exactly one thread runs the handler loop, and it is running before the
///   first request is made;
/// * `request_offload` is never called from the handler thread, including
///   from inside an offloaded routine.
pub struct OffloadBroker {
    /// Serializes producers for the whole round trip.
    request_lock: Mutex<()>,
    /// Completion lock guarding the slot.
    state: Mutex<OffloadState>,
    completed: Condvar,
    availability: Arc<BinarySemaphore>,
    isr: Isr,
    delivery: Box<dyn Delivery>,
}

impl OffloadBroker {
    pub fn new(delivery: Box<dyn Delivery>) -> Self {
        let availability = Arc::new(BinarySemaphore::new());
        let wakeup = Arc::clone(&availability);
        let isr: Isr = Arc::new(move || wakeup.give());
        Self {
            request_lock: Mutex::new(()),
            state: Mutex::new(OffloadState::Idle),
            completed: Condvar::new(),
            availability,
            isr,
            delivery,
        }
    }

    /// Run `routine` on the handler thread and block until it has finished.
    ///
    /// Concurrent callers are served one at a time. If the routine panics,
    /// the panic is resumed on the calling thread once the broker is idle
    /// again.
    pub fn request_offload<F>(&self, routine: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let request = lock(&self.request_lock);
        let mut state = lock(&self.state);
        debug_assert!(matches!(*state, OffloadState::Idle));

        *state = OffloadState::Requested(Box::new(routine));
        trace!("offload requested");
        self.delivery.deliver(&self.isr);

        while !matches!(*state, OffloadState::Completed(_)) {
            state = wait(&self.completed, state);
        }
        let outcome = std::mem::replace(&mut *state, OffloadState::Idle);
        drop(state);
        drop(request);
        trace!("offload completed");

        if let OffloadState::Completed(Some(payload)) = outcome {
            panic::resume_unwind(payload);
        }
    }

    /// Offload `f` and hand its return value back to the caller.
    pub fn call<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let result = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&result);
        self.request_offload(move || {
            *lock(&sink) = Some(f());
        });
        let value = lock(&result).take();
        match value {
            Some(value) => value,
            // request_offload only returns normally after the routine stored its result.
            None => unreachable!("offloaded routine completed without a result"),
        }
    }

    /// Interrupt-side half: wake the handler and return. Never blocks on the
    /// slot.
    pub fn deliver_to_handler(&self) {
        self.availability.give();
    }

    /// Wait for one availability signal and serve the pending request, if
    /// any. Returns whether a routine was executed.
    pub fn handle_next(&self) -> bool {
        self.availability.take();

        let routine = {
            let mut state = lock(&self.state);
            match std::mem::replace(&mut *state, OffloadState::Delivered) {
                OffloadState::Requested(routine) => routine,
                other => {
                    *state = other;
                    trace!("availability signalled with nothing pending");
                    return false;
                }
            }
        };

        trace!("offload delivered");
        let outcome = panic::catch_unwind(AssertUnwindSafe(routine)).err();
        if outcome.is_some() {
            error!("offloaded routine panicked");
        }

        let mut state = lock(&self.state);
        *state = OffloadState::Completed(outcome);
        self.completed.notify_all();
        true
    }

    /// Serve offload requests forever. Must be the permanent duty of exactly
    /// one thread.
    pub fn run_handler_loop(&self) -> ! {
        loop {
            self.handle_next();
        }
    }

    pub fn phase(&self) -> OffloadPhase {
        OffloadPhase::from(&*lock(&self.state))
    }

    pub fn is_idle(&self) -> bool {
        self.phase() == OffloadPhase::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::irq::DirectDelivery;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn broker_with_handler() -> Arc<OffloadBroker> {
        let broker = Arc::new(OffloadBroker::new(Box::new(DirectDelivery)));
        let handler = Arc::clone(&broker);
        thread::spawn(move || handler.run_handler_loop());
        broker
    }

    #[test]
    fn test_new_broker_is_idle() {
        let broker = OffloadBroker::new(Box::new(DirectDelivery));
        assert!(broker.is_idle());
    }

    #[test]
    fn test_spurious_signal_is_ignored() {
        let broker = OffloadBroker::new(Box::new(DirectDelivery));
        broker.deliver_to_handler();
        assert!(!broker.handle_next());
        assert_eq!(broker.phase(), OffloadPhase::Idle);
    }

    #[test]
    fn test_call_returns_value() {
        let broker = broker_with_handler();
        assert_eq!(broker.call(|| 6 * 7), 42);
        assert_eq!(broker.call(|| String::from("zephyr")), "zephyr");
        assert!(broker.is_idle());
    }

    #[test]
    fn test_routine_panic_reaches_caller() {
        let broker = broker_with_handler();
        let runs = Arc::new(AtomicUsize::new(0));

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            broker.request_offload(|| panic!("routine failure"));
        }));
        let payload = result.unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"routine failure"));
        assert!(broker.is_idle());

        // The handler loop survived the panic.
        let counter = Arc::clone(&runs);
        broker.request_offload(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
