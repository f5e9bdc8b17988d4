/*++

Licensed under the Apache-2.0 license.

File Name:

    simple_test.rs

Abstract:

    Drives the C entry points against the process-wide context.

--*/

use std::ffi::{c_void, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use zhci_core::HostContext;

use crate::{zhci_irq_offload_hw, zhci_is_started, zhci_sc_test, zhci_start};

fn ensure_started() {
    let owned: Vec<CString> = ["zhci", "--bt-dev=hci1"]
        .iter()
        .map(|s| CString::new(*s).unwrap())
        .collect();
    let argv: Vec<*const c_char> = owned.iter().map(|s| s.as_ptr()).collect();

    let ret = unsafe { zhci_start(argv.len() as c_int, argv.as_ptr()) };
    assert!(ret == 0 || ret == -libc::EALREADY, "zhci_start returned {ret}");

    // A concurrent test may have won the launch and still be booting.
    HostContext::global().gate().await_started();
    assert_eq!(zhci_is_started(), 1);
}

unsafe extern "C" fn bump(parameter: *mut c_void) {
    let counter = &*(parameter as *const AtomicUsize);
    counter.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn test_start_rejects_invalid_argv() {
    let argv = [ptr::null::<c_char>()];
    unsafe {
        assert_eq!(zhci_start(-1, ptr::null()), -libc::EINVAL);
        assert_eq!(zhci_start(1, argv.as_ptr()), -libc::EINVAL);
    }
}

#[test]
fn test_sc_test_round_trip() {
    ensure_started();
    for _ in 0..3 {
        assert_eq!(zhci_sc_test(42, 1337), 0);
    }
}

#[test]
fn test_irq_offload_hw_runs_routine() {
    ensure_started();
    let counter = AtomicUsize::new(0);
    let parameter = &counter as *const AtomicUsize as *mut c_void;

    unsafe {
        zhci_irq_offload_hw(Some(bump), parameter);
        zhci_irq_offload_hw(Some(bump), parameter);
        zhci_irq_offload_hw(None, parameter);
    }
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_irq_offload_hw_from_many_threads() {
    ensure_started();
    let counter = AtomicUsize::new(0);

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let parameter = &counter as *const AtomicUsize as *mut c_void;
                for _ in 0..5 {
                    unsafe { zhci_irq_offload_hw(Some(bump), parameter) };
                }
            });
        }
    });
    assert_eq!(counter.load(Ordering::SeqCst), 20);
}
