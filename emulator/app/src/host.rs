/*++

Licensed under the Apache-2.0 license.

File Name:

    host.rs

Abstract:

    Command line arguments and the launch sequence of the host program.

--*/

use std::sync::Arc;

use clap::Parser;
use log::{info, LevelFilter};
use zhci_consts::{DEFAULT_BOARD, PROGRAM_NAME};
use zhci_core::syscall::sc_test;
use zhci_core::{DeliveryMode, EmulatedKernel, HostConfig, HostContext, HostError};

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, name = "zhci")]
pub struct HostArgs {
    /// Board name reported by the kernel banner.
    #[arg(short, long, env = "ZHCI_BOARD", default_value = DEFAULT_BOARD)]
    pub board: String,

    /// How offload requests reach the kernel thread (irq or direct).
    #[arg(short, long, env = "ZHCI_DELIVERY", default_value_t = DeliveryMode::Irq)]
    pub delivery: DeliveryMode,

    #[arg(short, long, env = "ZHCI_LOG", value_parser = parse_level, default_value = "info")]
    pub log_level: LevelFilter,

    /// Number of test syscalls issued once the kernel is up.
    #[arg(short, long, default_value_t = 3)]
    pub calls: u32,

    /// First test syscall argument.
    #[arg(long, default_value_t = 42, allow_negative_numbers = true)]
    pub a: i32,

    /// Second test syscall argument.
    #[arg(long, default_value_t = 1337, allow_negative_numbers = true)]
    pub b: i32,

    /// Keep running after the test syscalls until Ctrl-C.
    #[arg(short, long, default_value_t = false)]
    pub wait: bool,

    /// Arguments passed through to the kernel's main entry point.
    #[arg(last = true)]
    pub kernel_args: Vec<String>,
}

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    s.parse().map_err(|_| format!("unknown log level {s:?}"))
}

impl HostArgs {
    pub fn config(&self) -> HostConfig {
        HostConfig {
            board: self.board.clone(),
            delivery: self.delivery,
            log_level: self.log_level,
        }
    }

    /// Kernel argument vector, program name first.
    pub fn kernel_argv(&self) -> Vec<String> {
        std::iter::once(PROGRAM_NAME.to_string())
            .chain(self.kernel_args.iter().cloned())
            .collect()
    }
}

/// Start the kernel, wait for post-init and run the test syscalls. Returns
/// the running context and each syscall's result.
pub fn run(cli: &HostArgs) -> Result<(Arc<HostContext>, Vec<i32>), HostError> {
    let ctx = HostContext::new(cli.config());
    ctx.launch(Arc::new(EmulatedKernel::new()), &cli.kernel_argv())?;
    info!("kernel up on {} ({} delivery)", cli.board, cli.delivery);

    let results = (0..cli.calls)
        .map(|_| sc_test(ctx.broker(), cli.a, cli.b))
        .collect();
    Ok((ctx, results))
}
