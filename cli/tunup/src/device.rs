//! TUN driver node handling.
//!
//! The interface created by TUNSETIFF lives as long as the driver handle is
//! open, so commands that create one hold the handle until the process is
//! told to stop.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::mpsc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::error::CliError;

/// Handle given to the mock kernel in place of the driver node.
const DRY_RUN_DEVICE: &str = "/dev/null";

/// Open the TUN driver node read-write.
pub fn open(path: &Path) -> Result<File, CliError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| CliError::DeviceOpen {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), "TUN device opened");
    Ok(file)
}

/// Open the driver node, or a stand-in handle for a dry run so previews
/// work without the tun module or access to its node.
pub fn open_handle(path: &Path, dry_run: bool) -> Result<File, CliError> {
    if dry_run {
        debug!(path = %path.display(), "dry run: driver node not opened");
        return open(Path::new(DRY_RUN_DEVICE));
    }
    open(path)
}

/// Block until SIGINT or SIGTERM arrives.
pub fn wait_for_shutdown() -> Result<()> {
    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("failed to install signal handler")?;

    rx.recv().context("signal channel closed")?;
    Ok(())
}
