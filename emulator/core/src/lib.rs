// Licensed under the Apache-2.0 license

//! Host bridge core
//!
//! Synchronization core of a host-process emulation layer: starts an
//! emulated kernel on its own thread and waits for it to finish early
//! initialization, and lets any host thread run a routine on the kernel's
//! context by round-tripping through a simulated interrupt.

pub mod config;
pub mod context;
pub mod error;
pub mod init;
pub mod irq;
pub mod kernel;
pub mod offload;
pub mod startup;
pub mod sync;
pub mod syscall;

// Re-export the main types for convenience
pub use config::{DeliveryMode, HostConfig};
pub use context::HostContext;
pub use error::{HostError, InitError};
pub use init::{InitLevel, InitTable};
pub use irq::{Delivery, DirectDelivery, HwIrqCtrl, IrqController, IrqDelivery, Isr};
pub use kernel::{EmulatedKernel, Kernel};
pub use offload::{OffloadBroker, OffloadPhase, Routine};
pub use startup::{LaunchRequest, Spawner, StartupGate, ThreadSpawner};
