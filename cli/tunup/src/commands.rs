//! CLI commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tunup_ifconf::{
    assign_address, attach, interface_flags, provision, set_admin_state, AdminState,
    InterfaceName, Kernel, MockKernel, TunConfig,
};

use crate::config::{self, FileConfig, LogFormat};
use crate::device;

/// tunup - Create a TUN interface, give it an IPv4 address and bring it up.
#[derive(Debug, Parser)]
#[command(name = "tunup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, env = "TUNUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, env = "TUNUP_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,

    /// Log the kernel calls that would be made instead of making them.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the interface, assign its address, bring it up, and hold it
    /// until interrupted.
    Run(RunCommand),

    /// Create the interface only and hold it until interrupted.
    Attach(AttachCommand),

    /// Assign an address to an existing interface.
    Address(AddressCommand),

    /// Bring an existing interface up or down.
    Link(LinkCommand),

    /// Show the flags of an interface.
    Show(ShowCommand),
}

#[derive(Debug, Args)]
struct InterfaceArgs {
    /// Interface name (at most 15 bytes; `tun%d` lets the kernel pick).
    #[arg(long, short = 'n', env = "TUNUP_NAME")]
    name: Option<String>,
}

#[derive(Debug, Args)]
struct AddressArgs {
    /// IPv4 address, optionally with a prefix (10.0.0.1/24).
    #[arg(long, short = 'a', env = "TUNUP_ADDRESS")]
    address: Option<String>,

    /// Prefix length (1-31), when --address has none.
    #[arg(long, short = 'p', env = "TUNUP_PREFIX", allow_negative_numbers = true)]
    prefix: Option<i32>,
}

#[derive(Debug, Args)]
struct DeviceArgs {
    /// TUN driver node.
    #[arg(long, env = "TUNUP_DEVICE")]
    device: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RunCommand {
    #[command(flatten)]
    interface: InterfaceArgs,

    #[command(flatten)]
    address: AddressArgs,

    #[command(flatten)]
    device: DeviceArgs,

    /// Leave the interface administratively down.
    #[arg(long)]
    down: bool,
}

#[derive(Debug, Args)]
struct AttachCommand {
    #[command(flatten)]
    interface: InterfaceArgs,

    #[command(flatten)]
    device: DeviceArgs,
}

#[derive(Debug, Args)]
struct AddressCommand {
    #[command(flatten)]
    interface: InterfaceArgs,

    #[command(flatten)]
    address: AddressArgs,
}

#[derive(Debug, Args)]
struct LinkCommand {
    #[command(flatten)]
    interface: InterfaceArgs,

    /// Desired admin state (up or down).
    state: AdminState,
}

#[derive(Debug, Args)]
struct ShowCommand {
    #[command(flatten)]
    interface: InterfaceArgs,
}

impl Cli {
    /// Run the selected command against the real kernel, or the mock one
    /// with `--dry-run`.
    pub fn run(self, file: &FileConfig) -> Result<()> {
        let name = config::resolve_name(self.command.interface().name.as_deref(), file)?;

        if self.dry_run {
            warn!("dry run: no kernel calls will be made");
            // Commands that expect an existing interface get one.
            let kernel = if self.command.creates_interface() {
                MockKernel::new()
            } else {
                MockKernel::with_interface(&name)
            };
            return self.command.execute(&kernel, name, file, true);
        }

        #[cfg(target_os = "linux")]
        {
            self.command
                .execute(&tunup_ifconf::LinuxKernel::new(), name, file, false)
        }

        #[cfg(not(target_os = "linux"))]
        {
            Err(crate::error::CliError::UnsupportedPlatform.into())
        }
    }
}

impl Commands {
    fn interface(&self) -> &InterfaceArgs {
        match self {
            Commands::Run(cmd) => &cmd.interface,
            Commands::Attach(cmd) => &cmd.interface,
            Commands::Address(cmd) => &cmd.interface,
            Commands::Link(cmd) => &cmd.interface,
            Commands::Show(cmd) => &cmd.interface,
        }
    }

    fn creates_interface(&self) -> bool {
        matches!(self, Commands::Run(_) | Commands::Attach(_))
    }

    /// A dry run neither opens the driver node nor holds the interface.
    fn execute<K: Kernel>(
        self,
        kernel: &K,
        name: InterfaceName,
        file: &FileConfig,
        dry_run: bool,
    ) -> Result<()> {
        match self {
            Commands::Run(cmd) => {
                let address = config::resolve_address(
                    cmd.address.address.as_deref(),
                    cmd.address.prefix,
                    file,
                )?;
                let path = config::resolve_device(cmd.device.device.as_deref(), file);
                let state = if cmd.down {
                    AdminState::Down
                } else {
                    AdminState::Up
                };

                let handle = device::open_handle(&path, dry_run)?;
                let tun = TunConfig::new(name, address).with_state(state);
                let bound = provision(kernel, &handle, &tun)
                    .context("Failed to provision TUN interface")?;

                if !dry_run {
                    hold_until_shutdown(&bound)?;
                    if state == AdminState::Up {
                        if let Err(e) = set_admin_state(kernel, &bound, AdminState::Down) {
                            warn!(
                                interface = %bound,
                                error = %e,
                                "failed to bring interface down"
                            );
                        }
                    }
                }
                drop(handle);
                info!(interface = %bound, "TUN interface released");
                Ok(())
            }

            Commands::Attach(cmd) => {
                let path = config::resolve_device(cmd.device.device.as_deref(), file);
                let handle = device::open_handle(&path, dry_run)?;
                let bound =
                    attach(kernel, &handle, &name).context("Failed to attach TUN device")?;

                if !dry_run {
                    hold_until_shutdown(&bound)?;
                }
                drop(handle);
                info!(interface = %bound, "TUN interface released");
                Ok(())
            }

            Commands::Address(cmd) => {
                let address = config::resolve_address(
                    cmd.address.address.as_deref(),
                    cmd.address.prefix,
                    file,
                )?;
                assign_address(kernel, &name, &address)
                    .with_context(|| format!("Failed to assign {} to {}", address, name))?;
                println!("{}: {}", name, address);
                Ok(())
            }

            Commands::Link(cmd) => {
                let flags = set_admin_state(kernel, &name, cmd.state)
                    .with_context(|| format!("Failed to set {} {}", name, cmd.state))?;
                println!("{}: {} flags={}", name, cmd.state, flags);
                Ok(())
            }

            Commands::Show(_) => {
                let flags = interface_flags(kernel, &name)
                    .with_context(|| format!("Failed to read flags of {}", name))?;
                println!(
                    "{}: {} running={} flags={}",
                    name,
                    flags.admin_state(),
                    flags.is_running(),
                    flags
                );
                Ok(())
            }
        }
    }
}

fn hold_until_shutdown(name: &InterfaceName) -> Result<()> {
    info!(interface = %name, "holding interface; send SIGINT or SIGTERM to release");
    device::wait_for_shutdown()?;
    info!(interface = %name, "shutdown signal received");
    Ok(())
}
