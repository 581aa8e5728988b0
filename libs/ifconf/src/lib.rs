//! # tunup-ifconf
//!
//! Provisioning of a Linux TUN interface through the kernel's control
//! surface.
//!
//! ## Operations
//!
//! - [`attach`]: bind an open `/dev/net/tun` handle to a named interface
//!   (`TUNSETIFF`, `IFF_TUN | IFF_NO_PI`)
//! - [`assign_address`]: set IPv4 address and netmask (`SIOCSIFADDR`,
//!   `SIOCSIFNETMASK`)
//! - [`set_admin_state`]: bring the interface up or down (`SIOCGIFFLAGS`,
//!   `SIOCSIFFLAGS`)
//! - [`interface_flags`]: read the current flag word
//! - [`provision`]: all of the above, in order
//!
//! Each operation that needs a control socket opens its own and closes it
//! before returning, on success and on failure. Nothing is retried and
//! nothing terminates the process: every failure comes back as an
//! [`IfConfError`] for the caller to act on.
//!
//! The device handle is borrowed, never closed. Closing it is how the caller
//! deletes a non-persistent interface.
//!
//! ## Kernel seam
//!
//! Operations are generic over [`Kernel`]. Use [`LinuxKernel`] for real
//! ioctls and [`MockKernel`] for tests or dry runs.

mod addr;
mod address;
mod attach;
mod error;
mod flags;
pub mod kernel;
mod link;
mod name;
mod provision;
mod socket;

pub use addr::{network_order, parse_ipv4, InterfaceAddress, PrefixLength};
pub use address::assign_address;
pub use attach::attach;
pub use error::{ErrorKind, IfConfError};
pub use flags::{AdminState, InterfaceFlags, ParseAdminStateError};
#[cfg(target_os = "linux")]
pub use kernel::LinuxKernel;
pub use kernel::{ControlSocket, Kernel, MockKernel};
pub use link::{interface_flags, set_admin_state};
pub use name::{InterfaceName, IFNAMSIZ, MAX_NAME_LEN};
pub use provision::{provision, TunConfig};

/// Re-export for callers matching on [`IfConfError::errno`].
pub use nix::errno::Errno;
