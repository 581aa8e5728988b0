//! tunup - bring up a TUN interface with an IPv4 address.
//!
//! Thin front end over `tunup-ifconf`: resolves configuration, installs
//! logging, runs one command and turns its outcome into an exit status.
//! Every failure, including invalid input, exits non-zero.

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

mod commands;
mod config;
mod device;
mod error;
mod logging;

use commands::Cli;
use config::{FileConfig, LogFormat};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging is not up yet, so a bad config file goes straight to stderr.
    let file = match FileConfig::load_optional(cli.config.as_deref()) {
        Ok(file) => file,
        Err(e) => {
            error::print_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let format = cli.log_format.or(file.log_format).unwrap_or_default();
    logging::init(format, file.log_level());
    debug!(version = env!("CARGO_PKG_VERSION"), "tunup starting");

    match cli.run(&file) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // JSON consumers get a structured record; people get the hints.
            // A filter that drops the record falls back to plain stderr.
            match format {
                LogFormat::Json if error::error_events_enabled() => error::log_error(&e),
                _ => error::print_error(&e),
            }
            ExitCode::FAILURE
        }
    }
}
