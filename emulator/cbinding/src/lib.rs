/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    C bindings for the host bridge. Loaded by host programs (for example
    through Python ctypes) to start the emulated kernel and call into it.

--*/

use std::borrow::Cow;
use std::ffi::{c_void, CStr};
use std::os::raw::{c_char, c_int, c_uchar};
use std::sync::{Arc, Once};

use log::error;
use simple_logger::SimpleLogger;
use zhci_core::syscall::sc_test;
use zhci_core::{EmulatedKernel, HostContext};

#[cfg(test)]
mod simple_test;

/// Routine signature accepted by [`zhci_irq_offload_hw`].
pub type ZhciRoutine = unsafe extern "C" fn(parameter: *mut c_void);

static LOGGER: Once = Once::new();

fn init_logging(ctx: &HostContext) {
    LOGGER.call_once(|| {
        // Another logger may already be installed by the embedding program.
        let _ = SimpleLogger::new().with_level(ctx.config().log_level).init();
    });
}

/// Opaque parameter carried to the kernel thread. The C caller stays
/// blocked until the routine has run, so the pointee outlives the hop.
struct SendPtr(*mut c_void);

unsafe impl Send for SendPtr {}

impl SendPtr {
    fn into_inner(self) -> *mut c_void {
        self.0
    }
}

/// Start the emulated kernel and block until it has finished early
/// initialization.
///
/// # Returns
/// * 0 on success
/// * `-EINVAL` if `argc` is negative or `argv` holds a null entry
/// * `-ENOMEM` if the arguments could not be duplicated
/// * `-EALREADY` if another call already launched the kernel. That call may
///   still be waiting for post-init, so this code does not mean the kernel
///   is ready: poll [`zhci_is_started`] before issuing offload requests.
/// * negated OS error if the kernel thread could not be created
///
/// # Safety
/// * `argv` must point to `argc` pointers, each a valid null-terminated C string
#[no_mangle]
pub unsafe extern "C" fn zhci_start(argc: c_int, argv: *const *const c_char) -> c_int {
    let ctx = HostContext::global();
    init_logging(&ctx);

    let args = match convert_argv(argc, argv) {
        Some(args) => args,
        None => {
            error!("zhci_start: invalid argument vector");
            return -libc::EINVAL;
        }
    };

    match ctx.launch(Arc::new(EmulatedKernel::new()), &args) {
        Ok(()) => 0,
        Err(err) => {
            error!("zhci_start: {err}");
            err.errno()
        }
    }
}

/// Returns 1 once the kernel has reached post-init, 0 before.
#[no_mangle]
pub extern "C" fn zhci_is_started() -> c_uchar {
    HostContext::global().gate().is_started() as c_uchar
}

/// Demo kernel service, executed on the kernel context.
///
/// Must only be called after [`zhci_start`] returned 0, and never from the
/// kernel context itself.
#[no_mangle]
pub extern "C" fn zhci_sc_test(a: c_int, b: c_int) -> c_int {
    sc_test(HostContext::global().broker(), a, b)
}

/// Run `routine(parameter)` on the kernel context as if from an interrupt and
/// block until it returns. A null routine is ignored.
///
/// # Safety
/// * `routine` must be safe to call with `parameter` from another thread
/// * must only be called after [`zhci_start`] returned 0, and never from
///   inside an offloaded routine
#[no_mangle]
pub unsafe extern "C" fn zhci_irq_offload_hw(routine: Option<ZhciRoutine>, parameter: *mut c_void) {
    let Some(routine) = routine else {
        return;
    };
    let parameter = SendPtr(parameter);
    HostContext::global().broker().request_offload(move || {
        let parameter = parameter.into_inner();
        unsafe { routine(parameter) }
    });
}

// Helper functions

unsafe fn convert_argv<'a>(argc: c_int, argv: *const *const c_char) -> Option<Vec<Cow<'a, str>>> {
    let argc = usize::try_from(argc).ok()?;
    if argc == 0 {
        return Some(Vec::new());
    }
    if argv.is_null() {
        return None;
    }

    (0..argc)
        .map(|i| {
            let arg = *argv.add(i);
            if arg.is_null() {
                None
            } else {
                Some(CStr::from_ptr(arg).to_string_lossy())
            }
        })
        .collect()
}
