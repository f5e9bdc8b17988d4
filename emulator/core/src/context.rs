/*++

Licensed under the Apache-2.0 license.

File Name:

    context.rs

Abstract:

    Process-wide state shared by the launcher, the kernel and offload
    callers.

--*/

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::config::{DeliveryMode, HostConfig};
use crate::error::HostError;
use crate::irq::{Delivery, DirectDelivery, HwIrqCtrl, IrqDelivery};
use crate::kernel::Kernel;
use crate::offload::OffloadBroker;
use crate::startup::{self, LaunchRequest, Spawner, StartupGate, ThreadSpawner};

lazy_static! {
    static ref GLOBAL: Arc<HostContext> = HostContext::new(HostConfig::from_env());
}

pub struct HostContext {
    config: HostConfig,
    gate: StartupGate,
    broker: OffloadBroker,
    irq: Arc<HwIrqCtrl>,
    launched: AtomicBool,
}

impl HostContext {
    /// Fresh context whose offload delivery follows `config.delivery`.
    pub fn new(config: HostConfig) -> Arc<Self> {
        let irq = Arc::new(HwIrqCtrl::new());
        let delivery: Box<dyn Delivery> = match config.delivery {
            DeliveryMode::Irq => Box::new(IrqDelivery::new(irq.clone())),
            DeliveryMode::Direct => Box::new(DirectDelivery),
        };
        Self::with_delivery(config, irq, delivery)
    }

    pub fn with_delivery(
        config: HostConfig,
        irq: Arc<HwIrqCtrl>,
        delivery: Box<dyn Delivery>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            gate: StartupGate::new(),
            broker: OffloadBroker::new(delivery),
            irq,
            launched: AtomicBool::new(false),
        })
    }

    /// The context used by the C ABI, configured from the environment on
    /// first use.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn gate(&self) -> &StartupGate {
        &self.gate
    }

    pub fn broker(&self) -> &OffloadBroker {
        &self.broker
    }

    pub fn irq(&self) -> &Arc<HwIrqCtrl> {
        &self.irq
    }

    /// Start `kernel` on its own thread and block until it reaches post-init.
    pub fn launch<S: AsRef<str>>(
        self: &Arc<Self>,
        kernel: Arc<dyn Kernel>,
        args: &[S],
    ) -> Result<(), HostError> {
        let request = LaunchRequest::duplicate(args)?;
        self.launch_with(kernel, request, &ThreadSpawner)
    }

    /// A context runs one kernel; a second launch fails with
    /// [`HostError::AlreadyLaunched`] unless the first one failed to spawn.
    pub fn launch_with(
        self: &Arc<Self>,
        kernel: Arc<dyn Kernel>,
        request: LaunchRequest,
        spawner: &dyn Spawner,
    ) -> Result<(), HostError> {
        if self.launched.swap(true, Ordering::AcqRel) {
            return Err(HostError::AlreadyLaunched);
        }

        let ctx = Arc::clone(self);
        let result = startup::launch_with(&self.gate, request, spawner, move |args| {
            kernel.main(ctx, args)
        });
        if result.is_err() {
            self.launched.store(false, Ordering::Release);
        }
        result
    }

    pub fn is_launched(&self) -> bool {
        self.launched.load(Ordering::Acquire)
    }
}
