//! Linux ioctl backend.
//!
//! See https://www.kernel.org/doc/Documentation/networking/tuntap.txt

use std::mem;
use std::net::Ipv4Addr;
use std::os::fd::{AsRawFd, BorrowedFd, IntoRawFd, OwnedFd};

use nix::errno::Errno;
use nix::sys::socket::{socket, AddressFamily, SockFlag, SockType};
use tracing::trace;

use super::{ControlSocket, Kernel};
use crate::addr::network_order;
use crate::flags::InterfaceFlags;
use crate::name::InterfaceName;

// TUNSETIFF reads the request and writes the bound name back into it.
nix::ioctl_readwrite_bad!(tun_set_iff, libc::TUNSETIFF, libc::ifreq);
nix::ioctl_write_ptr_bad!(set_if_addr, libc::SIOCSIFADDR, libc::ifreq);
nix::ioctl_write_ptr_bad!(set_if_netmask, libc::SIOCSIFNETMASK, libc::ifreq);
nix::ioctl_readwrite_bad!(get_if_flags, libc::SIOCGIFFLAGS, libc::ifreq);
nix::ioctl_write_ptr_bad!(set_if_flags, libc::SIOCSIFFLAGS, libc::ifreq);

/// Kernel backend that issues real ioctls.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxKernel;

impl LinuxKernel {
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for LinuxKernel {
    type Socket = LinuxControlSocket;

    fn attach_tun(
        &self,
        device: BorrowedFd<'_>,
        name: &InterfaceName,
    ) -> Result<InterfaceName, Errno> {
        let mut req = request(name);
        req.ifr_ifru.ifru_flags = (libc::IFF_TUN | libc::IFF_NO_PI) as libc::c_short;

        // SAFETY: req is a fully initialized ifreq that outlives the call.
        unsafe { tun_set_iff(device.as_raw_fd(), &mut req) }?;

        Ok(bound_name(&req).unwrap_or_else(|| name.clone()))
    }

    fn open_control_socket(&self) -> Result<LinuxControlSocket, Errno> {
        let fd = socket(
            AddressFamily::Inet,
            SockType::Datagram,
            SockFlag::SOCK_CLOEXEC,
            None,
        )?;
        trace!(fd = fd.as_raw_fd(), "control socket opened");
        Ok(LinuxControlSocket { fd })
    }
}

/// `AF_INET` datagram socket carrying `SIOC*` requests.
///
/// Dropping it without calling [`ControlSocket::close`] still closes the
/// descriptor, but any close error is lost.
#[derive(Debug)]
pub struct LinuxControlSocket {
    fd: OwnedFd,
}

impl ControlSocket for LinuxControlSocket {
    fn set_address(&mut self, name: &InterfaceName, address: Ipv4Addr) -> Result<(), Errno> {
        let mut req = request(name);
        req.ifr_ifru.ifru_addr = sockaddr(address);
        // SAFETY: req is a fully initialized ifreq that outlives the call.
        unsafe { set_if_addr(self.fd.as_raw_fd(), &req) }.map(drop)
    }

    fn set_netmask(&mut self, name: &InterfaceName, netmask: Ipv4Addr) -> Result<(), Errno> {
        let mut req = request(name);
        req.ifr_ifru.ifru_netmask = sockaddr(netmask);
        // SAFETY: as above.
        unsafe { set_if_netmask(self.fd.as_raw_fd(), &req) }.map(drop)
    }

    fn flags(&mut self, name: &InterfaceName) -> Result<InterfaceFlags, Errno> {
        let mut req = request(name);
        // SAFETY: as above; the kernel fills ifru_flags.
        unsafe { get_if_flags(self.fd.as_raw_fd(), &mut req) }?;
        // SAFETY: SIOCGIFFLAGS succeeded, so the flags member is the live one.
        let raw = unsafe { req.ifr_ifru.ifru_flags };
        Ok(InterfaceFlags::from_bits(raw as u16))
    }

    fn set_flags(&mut self, name: &InterfaceName, flags: InterfaceFlags) -> Result<(), Errno> {
        let mut req = request(name);
        req.ifr_ifru.ifru_flags = flags.bits() as libc::c_short;
        // SAFETY: as above.
        unsafe { set_if_flags(self.fd.as_raw_fd(), &req) }.map(drop)
    }

    fn close(self) -> Result<(), Errno> {
        let fd = self.fd.into_raw_fd();
        trace!(fd, "closing control socket");
        // The descriptor is released even when close reports an error, so
        // it must not be retried.
        nix::unistd::close(fd)
    }
}

/// Zeroed `ifreq` carrying `name`.
fn request(name: &InterfaceName) -> libc::ifreq {
    // SAFETY: ifreq is plain old data and all-zero is a valid value.
    let mut req: libc::ifreq = unsafe { mem::zeroed() };
    // InterfaceName is at most IFNAMSIZ - 1 bytes, so the NUL survives.
    for (dst, src) in req.ifr_name.iter_mut().zip(name.as_bytes()) {
        *dst = *src as libc::c_char;
    }
    req
}

fn sockaddr(address: Ipv4Addr) -> libc::sockaddr {
    let sin = libc::sockaddr_in {
        sin_family: libc::AF_INET as libc::sa_family_t,
        sin_port: 0,
        sin_addr: libc::in_addr {
            s_addr: network_order(address),
        },
        sin_zero: [0; 8],
    };
    // SAFETY: sockaddr_in and sockaddr are both 16-byte C structs; the kernel
    // reads the AF_INET layout back out of this union member.
    unsafe { mem::transmute::<libc::sockaddr_in, libc::sockaddr>(sin) }
}

/// Name the kernel wrote back after TUNSETIFF.
fn bound_name(req: &libc::ifreq) -> Option<InterfaceName> {
    let bytes: Vec<u8> = req
        .ifr_name
        .iter()
        .take_while(|c| **c != 0)
        .map(|c| *c as u8)
        .collect();
    String::from_utf8(bytes)
        .ok()
        .and_then(|s| InterfaceName::new(s).ok())
}
