/*++

Licensed under the Apache-2.0 license.

File Name:

    kernel.rs

Abstract:

    Kernel entry point run on the kernel main thread.

--*/

use std::sync::Arc;

use log::debug;

use crate::context::HostContext;
use crate::init::InitTable;

/// Main entry point of an emulated kernel.
///
/// Implementations must eventually call
/// [`StartupGate::signal_started`](crate::startup::StartupGate::signal_started)
/// on `ctx.gate()`, otherwise the launcher blocks forever.
pub trait Kernel: Send + Sync {
    fn main(&self, ctx: Arc<HostContext>, args: Vec<String>);
}

/// Kernel that runs its init table, prints the board banner and then serves
/// offload requests on its main thread forever.
pub struct EmulatedKernel {
    init: InitTable,
}

impl Default for EmulatedKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatedKernel {
    pub fn new() -> Self {
        Self::with_init(InitTable::with_defaults())
    }

    pub fn with_init(init: InitTable) -> Self {
        Self { init }
    }

    pub fn init_mut(&mut self) -> &mut InitTable {
        &mut self.init
    }
}

impl Kernel for EmulatedKernel {
    fn main(&self, ctx: Arc<HostContext>, args: Vec<String>) {
        debug!("kernel main started with {args:?}");
        let hooks = self.init.run_all(&ctx);
        debug!("ran {hooks} init hook(s)");

        println!("Hello World! {}", ctx.config().board);

        ctx.broker().run_handler_loop()
    }
}
