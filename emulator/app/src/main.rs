/*++

Licensed under the Apache-2.0 license.

File Name:

    main.rs

Abstract:

    File contains main entrypoint for the host launcher.

--*/

use std::process::ExitCode;
use std::sync::atomic::Ordering;

use clap::Parser;
use log::{error, warn};
use simple_logger::SimpleLogger;
use zhci_app::{run, wait_for_shutdown, HostArgs, HOST_RUNNING};

fn main() -> ExitCode {
    let cli = HostArgs::parse();

    if let Err(err) = SimpleLogger::new().with_level(cli.log_level).init() {
        eprintln!("failed to install logger: {err}");
    }

    if cli.wait {
        if let Err(err) = ctrlc::set_handler(move || {
            HOST_RUNNING.store(false, Ordering::Relaxed);
        }) {
            warn!("can't install Ctrl-C handler: {err}");
        }
    }

    let (_ctx, results) = match run(&cli) {
        Ok(output) => output,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    for (i, ret) in results.iter().enumerate() {
        println!("zhci_sc_test #{i}: {ret}");
    }

    if cli.wait {
        wait_for_shutdown();
    }
    ExitCode::SUCCESS
}
