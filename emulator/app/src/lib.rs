// Licensed under the Apache-2.0 license

//! Host launcher library
//!
//! Starts the emulated kernel from a host process and exercises it with the
//! test syscall.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub mod host;

// Cleared by the Ctrl-C handler.
pub static HOST_RUNNING: AtomicBool = AtomicBool::new(true);

pub fn wait_for_shutdown() {
    while HOST_RUNNING.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(10));
    }
}

// Re-export the main types for convenience
pub use host::{run, HostArgs};
