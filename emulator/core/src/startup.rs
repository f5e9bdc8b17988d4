/*++

Licensed under the Apache-2.0 license.

File Name:

    startup.rs

Abstract:

    Startup handshake between the host launcher and the kernel's
    initialization sequence.

--*/

use std::io;
use std::sync::{Condvar, Mutex};
use std::thread;

use log::{debug, error, info};
use zhci_consts::KERNEL_MAIN_THREAD_NAME;

use crate::error::HostError;
use crate::sync::{lock, wait};

/// One-way "kernel initialization completed" flag.
#[derive(Default)]
pub struct StartupGate {
    started: Mutex<bool>,
    cond: Condvar,
}

impl StartupGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until [`StartupGate::signal_started`] has been called. No
    /// timeout: a kernel that never finishes init hangs the caller.
    pub fn await_started(&self) {
        let mut started = lock(&self.started);
        while !*started {
            started = wait(&self.cond, started);
        }
    }

    /// Mark initialization complete and release every waiter. Later calls
    /// have no further effect.
    pub fn signal_started(&self) {
        let mut started = lock(&self.started);
        if !*started {
            info!("kernel post-init reached");
        }
        *started = true;
        self.cond.notify_all();
    }

    pub fn is_started(&self) -> bool {
        *lock(&self.started)
    }
}

/// Owned copy of the launcher's argument vector, moved into the kernel main
/// thread so it may outlive the caller's buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    args: Vec<String>,
}

impl LaunchRequest {
    pub fn duplicate<S: AsRef<str>>(args: &[S]) -> Result<Self, HostError> {
        Self::duplicate_with(args, duplicate_arg)
    }

    /// Duplicate `args` with a caller supplied allocator. `dup` returning
    /// `None` reports exhaustion; every copy made so far is released before
    /// the error is returned.
    pub fn duplicate_with<S, D>(args: &[S], mut dup: D) -> Result<Self, HostError>
    where
        S: AsRef<str>,
        D: FnMut(usize, &str) -> Option<String>,
    {
        let mut owned = Vec::new();
        owned
            .try_reserve_exact(args.len())
            .map_err(|_| HostError::OutOfMemory { index: None })?;

        for (index, arg) in args.iter().enumerate() {
            let copy = dup(index, arg.as_ref())
                .ok_or(HostError::OutOfMemory { index: Some(index) })?;
            owned.push(copy);
        }
        Ok(Self { args: owned })
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn into_args(self) -> Vec<String> {
        self.args
    }
}

/// Default duplicator: fallible heap copy.
pub fn duplicate_arg(_index: usize, arg: &str) -> Option<String> {
    let mut copy = String::new();
    copy.try_reserve_exact(arg.len()).ok()?;
    copy.push_str(arg);
    Some(copy)
}

pub type KernelEntry = Box<dyn FnOnce() + Send + 'static>;

/// Creates the execution context that runs the kernel's main entry point.
pub trait Spawner {
    /// Start `entry` on a new context. On failure `entry` must be dropped
    /// without running.
    fn spawn(&self, name: &str, entry: KernelEntry) -> io::Result<()>;
}

/// Spawns detached OS threads.
#[derive(Default)]
pub struct ThreadSpawner;

impl Spawner for ThreadSpawner {
    fn spawn(&self, name: &str, entry: KernelEntry) -> io::Result<()> {
        thread::Builder::new()
            .name(name.to_owned())
            .spawn(entry)
            .map(|_| ())
    }
}

/// Duplicate `args`, start `kernel_main` on a new thread and block until the
/// kernel signals `gate`.
pub fn launch<S, M>(gate: &StartupGate, args: &[S], kernel_main: M) -> Result<(), HostError>
where
    S: AsRef<str>,
    M: FnOnce(Vec<String>) + Send + 'static,
{
    let request = LaunchRequest::duplicate(args)?;
    launch_with(gate, request, &ThreadSpawner, kernel_main)
}

/// Launch with an already duplicated request and an explicit spawner.
pub fn launch_with<M>(
    gate: &StartupGate,
    request: LaunchRequest,
    spawner: &dyn Spawner,
    kernel_main: M,
) -> Result<(), HostError>
where
    M: FnOnce(Vec<String>) + Send + 'static,
{
    info!("launching kernel with {} argument(s)", request.len());

    spawner
        .spawn(
            KERNEL_MAIN_THREAD_NAME,
            Box::new(move || kernel_main(request.into_args())),
        )
        .map_err(|err| {
            error!("can't create kernel main thread: {err}");
            HostError::Spawn(err)
        })?;

    gate.await_started();
    debug!("launcher released");
    Ok(())
}
