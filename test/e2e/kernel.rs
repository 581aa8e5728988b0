//! End-to-end provisioning against the real kernel.
//!
//! These tests create real interfaces and need CAP_NET_ADMIN, so they are
//! ignored by default. Run them as root with:
//!
//! ```sh
//! cargo test -p tunup-e2e -- --ignored --test-threads=1
//! ```

#![cfg(target_os = "linux")]

use std::fs::{File, OpenOptions};
use std::net::{Ipv4Addr, SocketAddrV4};

use nix::ifaddrs::getifaddrs;
use tunup_ifconf::{
    assign_address, attach, interface_flags, provision, set_admin_state, AdminState, Errno,
    InterfaceAddress, InterfaceName, LinuxKernel, TunConfig,
};

fn open_tun() -> File {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/net/tun")
        .expect("open /dev/net/tun")
}

/// IPv4 address and netmask currently on `name`, as listed by getifaddrs.
fn ipv4_of(name: &str) -> Option<(Ipv4Addr, Ipv4Addr)> {
    getifaddrs()
        .expect("getifaddrs")
        .filter(|ifa| ifa.interface_name == name)
        .find_map(|ifa| {
            let address = ifa.address?;
            let netmask = ifa.netmask?;
            let address = SocketAddrV4::from(*address.as_sockaddr_in()?);
            let netmask = SocketAddrV4::from(*netmask.as_sockaddr_in()?);
            Some((*address.ip(), *netmask.ip()))
        })
}

#[test]
#[ignore] // Requires CAP_NET_ADMIN
fn attach_assign_up() {
    let kernel = LinuxKernel::new();
    let device = open_tun();
    let name = InterfaceName::new("tun_test").unwrap();

    let bound = attach(&kernel, &device, &name).unwrap();
    assert_eq!(bound, name);

    assign_address(
        &kernel,
        &bound,
        &InterfaceAddress::new("10.0.0.1", 24).unwrap(),
    )
    .unwrap();
    set_admin_state(&kernel, &bound, AdminState::Up).unwrap();

    let flags = interface_flags(&kernel, &bound).unwrap();
    assert!(flags.is_up());
    let address = Ipv4Addr::new(10, 0, 0, 1);
    let netmask = Ipv4Addr::new(255, 255, 255, 0);
    assert_eq!(ipv4_of("tun_test"), Some((address, netmask)));

    // Up again changes nothing.
    set_admin_state(&kernel, &bound, AdminState::Up).unwrap();
    assert_eq!(interface_flags(&kernel, &bound).unwrap(), flags);

    set_admin_state(&kernel, &bound, AdminState::Down).unwrap();
    assert!(!interface_flags(&kernel, &bound).unwrap().is_up());

    // Closing the handle deletes the interface.
    drop(device);
    let err = interface_flags(&kernel, &bound).unwrap_err();
    assert_eq!(err.errno(), Some(Errno::ENODEV));
}

#[test]
#[ignore] // Requires CAP_NET_ADMIN
fn provision_with_template_name() {
    let kernel = LinuxKernel::new();
    let device = open_tun();
    let config = TunConfig::new(
        InterfaceName::new("tunup%d").unwrap(),
        InterfaceAddress::from_cidr("10.77.0.1/30").unwrap(),
    );

    let bound = provision(&kernel, &device, &config).unwrap();
    assert!(bound.as_str().starts_with("tunup"));
    assert_ne!(bound.as_str(), "tunup%d");

    assert!(interface_flags(&kernel, &bound).unwrap().is_up());
    let address = Ipv4Addr::new(10, 77, 0, 1);
    let netmask = Ipv4Addr::new(255, 255, 255, 252);
    assert_eq!(ipv4_of(bound.as_str()), Some((address, netmask)));
}

#[test]
#[ignore] // Requires CAP_NET_ADMIN
fn second_attach_of_same_name_fails() {
    let kernel = LinuxKernel::new();
    let first = open_tun();
    let second = open_tun();
    let name = InterfaceName::new("tun_busy").unwrap();

    attach(&kernel, &first, &name).unwrap();
    let err = attach(&kernel, &second, &name).unwrap_err();
    assert_eq!(err.errno(), Some(Errno::EBUSY));
}
