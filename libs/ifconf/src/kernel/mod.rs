//! Kernel control-call interface.
//!
//! The provisioning operations talk to the kernel only through these traits:
//! - [`Kernel`] attaches a TUN device and opens control sockets
//! - [`ControlSocket`] issues the per-interface `SIOC*` calls
//!
//! [`LinuxKernel`] makes the real ioctls. [`MockKernel`] keeps an in-memory
//! interface table for tests and dry runs.

use std::net::Ipv4Addr;
use std::os::fd::BorrowedFd;

use nix::errno::Errno;

use crate::flags::InterfaceFlags;
use crate::name::InterfaceName;

#[cfg(target_os = "linux")]
mod linux;
mod mock;

#[cfg(target_os = "linux")]
pub use linux::{LinuxControlSocket, LinuxKernel};
pub use mock::{KernelCall, MockInterface, MockKernel, MockSocket, Operation};

/// Entry points into the kernel's interface control surface.
pub trait Kernel {
    /// Socket type returned by [`Kernel::open_control_socket`].
    type Socket: ControlSocket;

    /// Issue `TUNSETIFF` with `IFF_TUN | IFF_NO_PI` on an open driver handle.
    ///
    /// Returns the name the kernel bound the device to.
    fn attach_tun(
        &self,
        device: BorrowedFd<'_>,
        name: &InterfaceName,
    ) -> Result<InterfaceName, Errno>;

    /// Open a datagram socket to carry interface ioctls.
    fn open_control_socket(&self) -> Result<Self::Socket, Errno>;
}

/// A transient socket used purely as an ioctl handle.
pub trait ControlSocket {
    /// `SIOCSIFADDR`.
    fn set_address(&mut self, name: &InterfaceName, address: Ipv4Addr) -> Result<(), Errno>;

    /// `SIOCSIFNETMASK`.
    fn set_netmask(&mut self, name: &InterfaceName, netmask: Ipv4Addr) -> Result<(), Errno>;

    /// `SIOCGIFFLAGS`.
    fn flags(&mut self, name: &InterfaceName) -> Result<InterfaceFlags, Errno>;

    /// `SIOCSIFFLAGS`.
    fn set_flags(&mut self, name: &InterfaceName, flags: InterfaceFlags) -> Result<(), Errno>;

    /// Close the socket. Consumes it, so a socket is closed at most once.
    fn close(self) -> Result<(), Errno>;
}
