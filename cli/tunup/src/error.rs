//! Error handling and display for the CLI.

use std::io;
use std::path::PathBuf;

use colored::Colorize;
use thiserror::Error;
use tracing::{error, Level};
use tunup_ifconf::{Errno, IfConfError};

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("no {setting} given; pass --{setting} or set `{setting}` in the config file")]
    MissingSetting { setting: &'static str },

    #[error("address {address} already carries a prefix; drop --prefix or the /suffix")]
    ConflictingPrefix { address: String },

    #[error("failed to open TUN device {path:?}")]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[cfg(not(target_os = "linux"))]
    #[error("TUN interfaces are only supported on Linux")]
    UnsupportedPlatform,
}

/// Whether an error record from this module would reach the log output.
pub fn error_events_enabled() -> bool {
    tracing::enabled!(Level::ERROR)
}

/// Log a failed command with its reason code and cause chain.
pub fn log_error(err: &anyhow::Error) {
    let reason = interface_error(err).map_or("cli_error", IfConfError::reason_code);
    error!(error = %err, reason, "command failed");
    for cause in err.chain().skip(1) {
        error!(cause = %cause, "caused by");
    }
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);
    for cause in err.chain().skip(1) {
        eprintln!("  {} {}", "caused by:".dimmed(), cause);
    }

    if let Some(hint) = hint(err) {
        eprintln!("\n{}", format!("Hint: {}", hint).yellow());
    }
}

fn interface_error(err: &anyhow::Error) -> Option<&IfConfError> {
    err.chain().find_map(|cause| cause.downcast_ref::<IfConfError>())
}

fn hint(err: &anyhow::Error) -> Option<&'static str> {
    if let Some(CliError::DeviceOpen { source, .. }) = err.downcast_ref::<CliError>() {
        return match source.kind() {
            io::ErrorKind::NotFound => Some("Is the tun module loaded? Try `modprobe tun`."),
            io::ErrorKind::PermissionDenied => Some("Check the permissions on the TUN node."),
            _ => None,
        };
    }

    let ifconf = interface_error(err)?;
    if ifconf.is_permission_denied() {
        return Some("Configuring interfaces needs root or CAP_NET_ADMIN.");
    }
    if ifconf.is_partial() {
        return Some(
            "The address was applied without its netmask. Remove it with `ip addr del` or re-run.",
        );
    }
    match ifconf.errno() {
        Some(Errno::EBUSY) => Some("Another process already holds this TUN interface."),
        Some(Errno::ENODEV) => Some("No such interface. Create it with `tunup run` first."),
        _ => None,
    }
}
