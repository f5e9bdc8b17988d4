/*++

Licensed under the Apache-2.0 license.

File Name:

    init.rs

Abstract:

    Kernel initialization table: hooks run per level in priority order.

--*/

use log::{debug, warn};
use zhci_consts::STARTUP_HOOK_PRIORITY;

use crate::context::HostContext;
use crate::error::InitError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InitLevel {
    PreKernel1,
    PreKernel2,
    /// Core kernel services are up, application code has not run yet.
    PostKernel,
    Application,
}

impl InitLevel {
    pub const ALL: [InitLevel; 4] = [
        InitLevel::PreKernel1,
        InitLevel::PreKernel2,
        InitLevel::PostKernel,
        InitLevel::Application,
    ];
}

pub type InitHook = Box<dyn Fn(&HostContext) -> Result<(), InitError> + Send + Sync>;

struct InitEntry {
    level: InitLevel,
    priority: u8,
    name: &'static str,
    hook: InitHook,
}

/// Registered init hooks. Within a level, lower priority values run first and
/// equal priorities keep registration order.
#[derive(Default)]
pub struct InitTable {
    entries: Vec<InitEntry>,
}

impl InitTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding the hooks every kernel boot needs: the startup signal
    /// at POST_KERNEL.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.register(
            InitLevel::PostKernel,
            STARTUP_HOOK_PRIORITY,
            "startup",
            startup_hook,
        );
        table
    }

    pub fn register<F>(&mut self, level: InitLevel, priority: u8, name: &'static str, hook: F)
    where
        F: Fn(&HostContext) -> Result<(), InitError> + Send + Sync + 'static,
    {
        self.entries.push(InitEntry {
            level,
            priority,
            name,
            hook: Box::new(hook),
        });
    }

    /// Run every hook of `level`. Failures are logged and do not stop the
    /// sequence. Returns the number of hooks run.
    pub fn run_level(&self, level: InitLevel, ctx: &HostContext) -> usize {
        let mut hooks: Vec<&InitEntry> = self.entries.iter().filter(|e| e.level == level).collect();
        hooks.sort_by_key(|e| e.priority);

        for entry in &hooks {
            debug!("init {:?}/{}: {}", level, entry.priority, entry.name);
            if let Err(err) = (entry.hook)(ctx) {
                warn!("{err}");
            }
        }
        hooks.len()
    }

    pub fn run_all(&self, ctx: &HostContext) -> usize {
        InitLevel::ALL
            .iter()
            .map(|level| self.run_level(*level, ctx))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Releases the launcher once the kernel has reached POST_KERNEL.
pub fn startup_hook(ctx: &HostContext) -> Result<(), InitError> {
    ctx.gate().signal_started();
    Ok(())
}
