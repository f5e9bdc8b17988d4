/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Constants shared by the host bridge crates.

--*/

/// IRQ line used to route offloaded routines onto the kernel context.
pub const OFFLOAD_HW_IRQ: u32 = 10;

/// Priority the offload IRQ is declared with.
pub const OFFLOAD_HW_IRQ_PRIORITY: u8 = 0;

/// Number of lines exposed by the simulated interrupt controller.
pub const NUM_IRQS: usize = 32;

/// Init priority of the startup hook within the POST_KERNEL level.
pub const STARTUP_HOOK_PRIORITY: u8 = 0;

pub const DEFAULT_BOARD: &str = "native_posix_64";

/// Program name prepended to the kernel argument vector by launchers.
pub const PROGRAM_NAME: &str = "zhci";

pub const KERNEL_MAIN_THREAD_NAME: &str = "zephyr-main";
