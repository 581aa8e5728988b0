//! Device attach (TUNSETIFF).

use std::os::fd::AsFd;

use tracing::{debug, info};

use crate::error::IfConfError;
use crate::kernel::Kernel;
use crate::name::InterfaceName;

/// Bind the TUN device behind `device` to the interface `name`.
///
/// The device is configured as a pure IP tunnel (`IFF_TUN`) without the
/// packet-information header (`IFF_NO_PI`). `device` must be an open handle
/// on the TUN driver node; it is borrowed, never closed. The interface exists
/// for as long as the caller keeps that handle open.
///
/// Returns the name the kernel bound, which differs from `name` only when
/// `name` is a template such as `tun%d`.
pub fn attach<K, D>(
    kernel: &K,
    device: &D,
    name: &InterfaceName,
) -> Result<InterfaceName, IfConfError>
where
    K: Kernel,
    D: AsFd,
{
    debug!(interface = %name, "attaching TUN device");

    let bound = kernel
        .attach_tun(device.as_fd(), name)
        .map_err(|errno| IfConfError::Attach {
            interface: name.clone(),
            errno,
        })?;

    info!(interface = %bound, "TUN device attached");
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{MockKernel, Operation};
    use nix::errno::Errno;
    use std::fs::File;

    #[test]
    fn test_attach() {
        let kernel = MockKernel::new();
        let device = File::open("/dev/null").unwrap();
        let name = InterfaceName::new("tun_test").unwrap();

        let bound = attach(&kernel, &device, &name).unwrap();
        assert_eq!(bound, name);
        assert!(kernel.interface("tun_test").unwrap().attached);
        // Attach never needs a control socket.
        assert_eq!(kernel.count(Operation::OpenSocket), 0);
    }

    #[test]
    fn test_attach_permission_denied() {
        let kernel = MockKernel::new();
        kernel.fail(Operation::Attach, Errno::EPERM);
        let device = File::open("/dev/null").unwrap();
        let name = InterfaceName::new("tun0").unwrap();

        let err = attach(&kernel, &device, &name).unwrap_err();
        assert!(err.is_permission_denied());
        assert!(matches!(err, IfConfError::Attach { .. }));
        assert!(kernel.interface("tun0").is_none());
    }

    #[test]
    fn test_attach_template_returns_bound_name() {
        let kernel = MockKernel::new();
        let device = File::open("/dev/null").unwrap();
        let template = InterfaceName::new("tun%d").unwrap();

        let bound = attach(&kernel, &device, &template).unwrap();
        assert_eq!(bound.as_str(), "tun0");
        assert!(kernel.interface("tun0").unwrap().attached);
    }

    #[test]
    fn test_attach_error_names_requested_interface() {
        let kernel = MockKernel::new();
        let device = File::open("/dev/null").unwrap();
        let template = InterfaceName::new("tun%x").unwrap();

        let err = attach(&kernel, &device, &template).unwrap_err();
        assert_eq!(
            err,
            IfConfError::Attach {
                interface: template,
                errno: Errno::EINVAL,
            }
        );
    }
}
