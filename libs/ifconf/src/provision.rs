//! The full attach → address → state sequence.

use std::os::fd::AsFd;

use tracing::info;

use crate::addr::InterfaceAddress;
use crate::address::assign_address;
use crate::attach::attach;
use crate::error::IfConfError;
use crate::flags::AdminState;
use crate::kernel::Kernel;
use crate::link::set_admin_state;
use crate::name::InterfaceName;

/// TUN interface configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunConfig {
    /// Interface name (or template such as `tun%d`).
    pub name: InterfaceName,
    /// Address and prefix to assign.
    pub address: InterfaceAddress,
    /// Admin state to leave the interface in (default up).
    pub state: AdminState,
}

impl TunConfig {
    /// Create a new configuration that ends with the interface up.
    pub fn new(name: InterfaceName, address: InterfaceAddress) -> Self {
        Self {
            name,
            address,
            state: AdminState::Up,
        }
    }

    /// Set the final admin state.
    pub fn with_state(mut self, state: AdminState) -> Self {
        self.state = state;
        self
    }
}

/// Attach `device`, assign the address, then apply the admin state.
///
/// Stops at the first failing step and returns its error unchanged. Later
/// steps use the name the kernel actually bound, which is returned on
/// success.
pub fn provision<K, D>(
    kernel: &K,
    device: &D,
    config: &TunConfig,
) -> Result<InterfaceName, IfConfError>
where
    K: Kernel,
    D: AsFd,
{
    let name = attach(kernel, device, &config.name)?;
    assign_address(kernel, &name, &config.address)?;
    set_admin_state(kernel, &name, config.state)?;

    info!(
        interface = %name,
        address = %config.address,
        state = %config.state,
        "TUN interface provisioned"
    );
    Ok(name)
}
