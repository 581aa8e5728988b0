//! IPv4 address assignment (SIOCSIFADDR + SIOCSIFNETMASK).

use tracing::{debug, info};

use crate::addr::InterfaceAddress;
use crate::error::IfConfError;
use crate::kernel::{ControlSocket, Kernel};
use crate::name::InterfaceName;
use crate::socket::with_control_socket;

/// Assign an IPv4 address and netmask to an attached interface.
///
/// Two control calls are made on one throwaway socket: the address first,
/// then the mask derived from the prefix. If the mask call fails, the address
/// stays applied and [`IfConfError::NetmaskAfterAddress`] is returned; the
/// caller decides whether to unwind.
pub fn assign_address<K: Kernel>(
    kernel: &K,
    name: &InterfaceName,
    address: &InterfaceAddress,
) -> Result<(), IfConfError> {
    let netmask = address.netmask();
    debug!(
        interface = %name,
        address = %address.address,
        netmask = %netmask,
        "assigning address"
    );

    with_control_socket(kernel, name, |socket| {
        socket
            .set_address(name, address.address)
            .map_err(|errno| IfConfError::SetAddress {
                interface: name.clone(),
                errno,
            })?;

        socket
            .set_netmask(name, netmask)
            .map_err(|errno| IfConfError::NetmaskAfterAddress {
                interface: name.clone(),
                errno,
            })
    })?;

    info!(interface = %name, address = %address, "address assigned");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{KernelCall, MockKernel, Operation};
    use nix::errno::Errno;
    use std::net::Ipv4Addr;

    fn setup() -> (MockKernel, InterfaceName) {
        let name = InterfaceName::new("tun0").unwrap();
        (MockKernel::with_interface(&name), name)
    }

    #[test]
    fn test_assign_address() {
        let (kernel, name) = setup();
        let address = InterfaceAddress::new("10.0.0.1", 24).unwrap();

        assign_address(&kernel, &name, &address).unwrap();

        let iface = kernel.interface("tun0").unwrap();
        assert_eq!(iface.address, Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(iface.netmask, Some(Ipv4Addr::new(255, 255, 255, 0)));
        assert_eq!(
            kernel.calls(),
            vec![
                KernelCall::OpenSocket,
                KernelCall::SetAddress {
                    name: "tun0".into(),
                    address: Ipv4Addr::new(10, 0, 0, 1),
                },
                KernelCall::SetNetmask {
                    name: "tun0".into(),
                    netmask: Ipv4Addr::new(255, 255, 255, 0),
                },
                KernelCall::CloseSocket,
            ]
        );
        assert_eq!(kernel.open_sockets(), 0);
    }

    #[test]
    fn test_set_address_failure_closes_socket() {
        let (kernel, name) = setup();
        kernel.fail(Operation::SetAddress, Errno::EPERM);
        let address = InterfaceAddress::new("10.0.0.1", 24).unwrap();

        let err = assign_address(&kernel, &name, &address).unwrap_err();
        assert!(matches!(err, IfConfError::SetAddress { .. }));
        assert!(!err.is_partial());
        assert_eq!(kernel.count(Operation::SetNetmask), 0);
        assert_eq!(kernel.count(Operation::CloseSocket), 1);
        assert_eq!(kernel.open_sockets(), 0);
    }

    #[test]
    fn test_netmask_failure_is_partial() {
        let (kernel, name) = setup();
        kernel.fail(Operation::SetNetmask, Errno::EINVAL);
        let address = InterfaceAddress::new("10.0.0.1", 24).unwrap();

        let err = assign_address(&kernel, &name, &address).unwrap_err();
        assert!(err.is_partial());

        // No rollback: the address is left in place.
        let iface = kernel.interface("tun0").unwrap();
        assert_eq!(iface.address, Some(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(iface.netmask, None);
        assert_eq!(kernel.count(Operation::CloseSocket), 1);
    }

    #[test]
    fn test_socket_create_failure() {
        let (kernel, name) = setup();
        kernel.fail(Operation::OpenSocket, Errno::EMFILE);
        let address = InterfaceAddress::new("10.0.0.1", 24).unwrap();

        let err = assign_address(&kernel, &name, &address).unwrap_err();
        assert_eq!(err, IfConfError::SocketCreate(Errno::EMFILE));
        assert_eq!(kernel.count(Operation::CloseSocket), 0);
    }

    #[test]
    fn test_close_failure_after_success() {
        let (kernel, name) = setup();
        kernel.fail(Operation::CloseSocket, Errno::EIO);
        let address = InterfaceAddress::new("10.0.0.1", 24).unwrap();

        let err = assign_address(&kernel, &name, &address).unwrap_err();
        assert_eq!(err, IfConfError::SocketClose(Errno::EIO));
        assert_eq!(kernel.open_sockets(), 0);
    }

    #[test]
    fn test_double_fault_keeps_first_error() {
        let (kernel, name) = setup();
        kernel.fail(Operation::SetAddress, Errno::EPERM);
        kernel.fail(Operation::CloseSocket, Errno::EIO);
        let address = InterfaceAddress::new("10.0.0.1", 24).unwrap();

        let err = assign_address(&kernel, &name, &address).unwrap_err();
        assert_eq!(err.errno(), Some(Errno::EPERM));
        assert_eq!(kernel.count(Operation::CloseSocket), 1);
    }

    #[test]
    fn test_unknown_interface() {
        let kernel = MockKernel::new();
        let name = InterfaceName::new("tun9").unwrap();
        let address = InterfaceAddress::new("10.0.0.1", 24).unwrap();

        let err = assign_address(&kernel, &name, &address).unwrap_err();
        assert_eq!(err.errno(), Some(Errno::ENODEV));
        assert_eq!(kernel.open_sockets(), 0);
    }
}
