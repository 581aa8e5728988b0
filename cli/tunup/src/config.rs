//! Configuration loading and resolution.
//!
//! Sources, highest precedence first:
//! - command-line flags
//! - `TUNUP_*` environment variables (handled by clap)
//! - the TOML file given with `--config`
//! - built-in defaults

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use tunup_ifconf::{InterfaceAddress, InterfaceName};

use crate::error::CliError;

/// Interface name used when none is configured.
pub const DEFAULT_NAME: &str = "tun0";

/// TUN driver node.
pub const DEFAULT_DEVICE: &str = "/dev/net/tun";

/// Default log level when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line records.
    #[default]
    Compact,
    /// One JSON object per record.
    Json,
}

/// Contents of the optional TOML config file.
///
/// ```toml
/// name = "tun0"
/// address = "10.0.0.1/24"
/// device = "/dev/net/tun"
/// log_format = "json"
/// log_level = "debug"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Interface name.
    pub name: Option<String>,

    /// IPv4 address, plain or in CIDR form.
    pub address: Option<String>,

    /// Prefix length, when `address` has none.
    pub prefix: Option<i32>,

    /// TUN driver node.
    pub device: Option<PathBuf>,

    /// Log output format.
    pub log_format: Option<LogFormat>,

    /// Default log filter.
    pub log_level: Option<String>,
}

impl FileConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", path))
    }

    /// Load config from `path` if given, or return the empty config.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Log level to use when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

/// Resolve the interface name.
pub fn resolve_name(flag: Option<&str>, file: &FileConfig) -> Result<InterfaceName> {
    let name = flag.or(file.name.as_deref()).unwrap_or(DEFAULT_NAME);
    InterfaceName::new(name).context("Invalid interface name")
}

/// Resolve the interface address.
///
/// The address may carry its own prefix (`10.0.0.1/24`); otherwise the
/// prefix comes from `--prefix` or the file. A prefix given alongside a CIDR
/// address from the same or a higher layer is rejected.
pub fn resolve_address(
    address_flag: Option<&str>,
    prefix_flag: Option<i32>,
    file: &FileConfig,
) -> Result<InterfaceAddress> {
    let address = address_flag
        .or(file.address.as_deref())
        .ok_or(CliError::MissingSetting { setting: "address" })?;

    let parsed = if address.contains('/') {
        let explicit_prefix = match address_flag {
            Some(_) => prefix_flag,
            None => prefix_flag.or(file.prefix),
        };
        if explicit_prefix.is_some() {
            return Err(CliError::ConflictingPrefix {
                address: address.to_string(),
            }
            .into());
        }
        InterfaceAddress::from_cidr(address)
    } else {
        let prefix = prefix_flag
            .or(file.prefix)
            .ok_or(CliError::MissingSetting { setting: "prefix" })?;
        InterfaceAddress::new(address, prefix)
    };
    parsed.context("Invalid interface address")
}

/// Resolve the TUN driver node path.
pub fn resolve_device(flag: Option<&Path>, file: &FileConfig) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| file.device.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DEVICE))
}
