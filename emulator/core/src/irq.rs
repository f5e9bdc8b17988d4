/*++

Licensed under the Apache-2.0 license.

File Name:

    irq.rs

Abstract:

    Simulated interrupt controller and the delivery paths that route an
    offload request onto the kernel context.

--*/

use std::sync::{Arc, Mutex};

use log::{trace, warn};
use zhci_consts::{NUM_IRQS, OFFLOAD_HW_IRQ, OFFLOAD_HW_IRQ_PRIORITY};

use crate::sync::lock;

/// Interrupt service routine. Must be short and must not block.
pub type Isr = Arc<dyn Fn() + Send + Sync>;

/// Minimal interface of an interrupt controller as seen by the offload path.
pub trait IrqController: Send + Sync {
    /// Install `isr` for `irq`. Declaring again replaces the previous routine.
    fn declare(&self, irq: u32, priority: u8, isr: Isr);

    fn enable(&self, irq: u32);

    fn disable(&self, irq: u32);

    /// Raise `irq` now. Delivers synchronously on the calling thread if the
    /// line is enabled, otherwise latches it until the next `enable`.
    fn raise_immediately(&self, irq: u32);

    fn is_enabled(&self, irq: u32) -> bool;
}

#[derive(Default, Clone)]
struct IrqLine {
    isr: Option<Isr>,
    priority: u8,
    enabled: bool,
    pending: bool,
}

/// Edge-triggered software interrupt controller.
///
/// Each raise sets a pending latch; a latched line is delivered exactly once,
/// either immediately (line enabled) or as soon as it is enabled. Routines run
/// with the controller unlocked so they may raise further interrupts.
pub struct HwIrqCtrl {
    lines: Mutex<Vec<IrqLine>>,
}

impl Default for HwIrqCtrl {
    fn default() -> Self {
        Self::new()
    }
}

impl HwIrqCtrl {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(vec![IrqLine::default(); NUM_IRQS]),
        }
    }

    pub fn is_pending(&self, irq: u32) -> bool {
        lock(&self.lines)
            .get(irq as usize)
            .map(|line| line.pending)
            .unwrap_or(false)
    }

    pub fn priority(&self, irq: u32) -> Option<u8> {
        lock(&self.lines)
            .get(irq as usize)
            .filter(|line| line.isr.is_some())
            .map(|line| line.priority)
    }

    /// Consume the latch of an enabled line and hand back its routine.
    fn take_deliverable(line: &mut IrqLine, irq: u32) -> Option<Isr> {
        if !line.enabled || !line.pending {
            return None;
        }
        line.pending = false;
        if line.isr.is_none() {
            warn!("spurious IRQ {irq}: no handler declared");
        }
        line.isr.clone()
    }

    fn with_line<R>(&self, irq: u32, f: impl FnOnce(&mut IrqLine) -> R) -> Option<R> {
        let mut lines = lock(&self.lines);
        match lines.get_mut(irq as usize) {
            Some(line) => Some(f(line)),
            None => {
                warn!("IRQ {irq} out of range (controller has {NUM_IRQS} lines)");
                None
            }
        }
    }
}

impl IrqController for HwIrqCtrl {
    fn declare(&self, irq: u32, priority: u8, isr: Isr) {
        self.with_line(irq, |line| {
            line.isr = Some(isr);
            line.priority = priority;
        });
    }

    fn enable(&self, irq: u32) {
        let isr = self
            .with_line(irq, |line| {
                line.enabled = true;
                Self::take_deliverable(line, irq)
            })
            .flatten();
        if let Some(isr) = isr {
            trace!("delivering latched IRQ {irq}");
            isr();
        }
    }

    fn disable(&self, irq: u32) {
        self.with_line(irq, |line| line.enabled = false);
    }

    fn raise_immediately(&self, irq: u32) {
        let isr = self
            .with_line(irq, |line| {
                line.pending = true;
                Self::take_deliverable(line, irq)
            })
            .flatten();
        if let Some(isr) = isr {
            trace!("delivering IRQ {irq}");
            isr();
        }
    }

    fn is_enabled(&self, irq: u32) -> bool {
        lock(&self.lines)
            .get(irq as usize)
            .map(|line| line.enabled)
            .unwrap_or(false)
    }
}

/// How a raised offload request reaches the handler's wakeup routine.
pub trait Delivery: Send + Sync {
    fn deliver(&self, isr: &Isr);
}

/// Calls the routine straight from the requesting thread.
#[derive(Default)]
pub struct DirectDelivery;

impl Delivery for DirectDelivery {
    fn deliver(&self, isr: &Isr) {
        isr();
    }
}

/// Round-trips through an interrupt controller line: declare, enable, raise,
/// disable. The raise yields exactly one delivery even though the line is
/// disabled right after.
pub struct IrqDelivery {
    ctrl: Arc<dyn IrqController>,
    irq: u32,
    priority: u8,
}

impl IrqDelivery {
    pub fn new(ctrl: Arc<dyn IrqController>) -> Self {
        Self::with_line(ctrl, OFFLOAD_HW_IRQ, OFFLOAD_HW_IRQ_PRIORITY)
    }

    pub fn with_line(ctrl: Arc<dyn IrqController>, irq: u32, priority: u8) -> Self {
        Self {
            ctrl,
            irq,
            priority,
        }
    }

    pub fn irq(&self) -> u32 {
        self.irq
    }
}

impl Delivery for IrqDelivery {
    fn deliver(&self, isr: &Isr) {
        self.ctrl.declare(self.irq, self.priority, Arc::clone(isr));
        self.ctrl.enable(self.irq);
        self.ctrl.raise_immediately(self.irq);
        self.ctrl.disable(self.irq);
    }
}
