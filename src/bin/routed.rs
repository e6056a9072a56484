//! Process entry point (C10): parses arguments, opens one socket per
//! neighbor, and runs the event loop to completion.

use std::process::ExitCode;

use clap::Parser;
use log::error;

use routed::{Cli, Config, Dispatcher, EventLoop};

/// Startup misconfiguration and a fatal transport failure both exit
/// non-zero, but are reported distinctly so an operator can tell "bad
/// arguments" from "a neighbor session died" (§6, Exit codes).
const EXIT_CONFIG_ERROR: u8 = 1;
const EXIT_TRANSPORT_FAILURE: u8 = 2;

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let config = match Config::from_cli(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("routed: {e}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let mut event_loop = match EventLoop::connect(&config.neighbors) {
        Ok(event_loop) => event_loop,
        Err(e) => {
            eprintln!("routed: {e}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let mut dispatcher = Dispatcher::new(config.asn, config.relations());
    match event_loop.run(&mut dispatcher) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("fatal: {e}");
            ExitCode::from(EXIT_TRANSPORT_FAILURE)
        }
    }
}
