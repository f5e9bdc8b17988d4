// Licensed under the Apache-2.0 license

//! Launch handshake between a host thread and the kernel's init sequence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use zhci_consts::KERNEL_MAIN_THREAD_NAME;
use zhci_core::startup::launch;
use zhci_core::{HostConfig, HostContext, HostError, Kernel, StartupGate};

/// Records its arguments, optionally lingers, then signals post-init.
struct RecordingKernel {
    delay: Duration,
    args: Mutex<Option<Vec<String>>>,
    thread_name: Mutex<Option<String>>,
}

impl RecordingKernel {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            args: Mutex::new(None),
            thread_name: Mutex::new(None),
        })
    }
}

impl Kernel for RecordingKernel {
    fn main(&self, ctx: Arc<HostContext>, args: Vec<String>) {
        *self.thread_name.lock().unwrap() = thread::current().name().map(str::to_owned);
        *self.args.lock().unwrap() = Some(args);
        thread::sleep(self.delay);
        ctx.gate().signal_started();
    }
}

#[test]
fn test_await_blocks_until_signal() {
    let gate = Arc::new(StartupGate::new());
    let returned = Arc::new(AtomicBool::new(false));

    let waiter = {
        let gate = Arc::clone(&gate);
        let returned = Arc::clone(&returned);
        thread::spawn(move || {
            gate.await_started();
            returned.store(true, Ordering::SeqCst);
            Instant::now()
        })
    };

    thread::sleep(Duration::from_millis(100));
    assert!(!returned.load(Ordering::SeqCst));

    let signalled_at = Instant::now();
    gate.signal_started();
    let released_at = waiter.join().unwrap();

    assert!(released_at >= signalled_at);
    assert!(released_at - signalled_at < Duration::from_secs(2));
}

#[test]
fn test_signal_releases_every_waiter() {
    let gate = Arc::new(StartupGate::new());
    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.await_started())
        })
        .collect();

    thread::sleep(Duration::from_millis(20));
    gate.signal_started();
    for waiter in waiters {
        waiter.join().unwrap();
    }
}

#[test]
fn test_launch_returns_only_after_post_init() {
    let gate = Arc::new(StartupGate::new());
    let kernel_gate = Arc::clone(&gate);
    let start = Instant::now();

    launch(&gate, &["zhci"], move |_| {
        thread::sleep(Duration::from_millis(100));
        kernel_gate.signal_started();
    })
    .unwrap();

    assert!(gate.is_started());
    assert!(start.elapsed() >= Duration::from_millis(100));
}

#[test]
fn test_launch_arguments_are_owned_copies() {
    let ctx = HostContext::new(HostConfig::default());
    let kernel = RecordingKernel::new(Duration::ZERO);
    let mut argv: Vec<String> = vec!["a".into(), "bb".into(), "ccc".into()];

    ctx.launch(kernel.clone(), &argv).unwrap();
    let caller_ptrs: Vec<*const u8> = argv.iter().map(|s| s.as_ptr()).collect();

    for arg in argv.iter_mut() {
        arg.clear();
        arg.push('x');
    }
    argv.clear();

    let seen = kernel.args.lock().unwrap().clone().unwrap();
    assert_eq!(seen, ["a", "bb", "ccc"]);
    for (copy, original) in seen.iter().zip(caller_ptrs) {
        assert_ne!(copy.as_ptr(), original);
    }
    assert_eq!(
        kernel.thread_name.lock().unwrap().as_deref(),
        Some(KERNEL_MAIN_THREAD_NAME)
    );
}

#[test]
fn test_context_launches_once() {
    let ctx = HostContext::new(HostConfig::default());
    let first = RecordingKernel::new(Duration::ZERO);
    let second = RecordingKernel::new(Duration::ZERO);

    ctx.launch(first, &["zhci"]).unwrap();
    assert!(ctx.is_launched());

    let err = ctx.launch(second.clone(), &["zhci"]).unwrap_err();
    assert!(matches!(err, HostError::AlreadyLaunched));
    assert!(second.args.lock().unwrap().is_none());
}

#[test]
fn test_second_launch_during_boot_is_not_readiness() {
    let ctx = HostContext::new(HostConfig::default());
    let slow = RecordingKernel::new(Duration::from_millis(200));

    let first = {
        let ctx = Arc::clone(&ctx);
        let slow = slow.clone();
        thread::spawn(move || ctx.launch(slow, &["zhci"]))
    };
    while slow.args.lock().unwrap().is_none() {
        thread::sleep(Duration::from_millis(5));
    }

    let err = ctx
        .launch(RecordingKernel::new(Duration::ZERO), &["zhci"])
        .unwrap_err();
    assert_eq!(err.errno(), -libc::EALREADY);
    assert!(!ctx.gate().is_started());

    first.join().unwrap().unwrap();
    assert!(ctx.gate().is_started());
}
