//! Administrative state (SIOCGIFFLAGS / SIOCSIFFLAGS).

use tracing::{debug, info};

use crate::error::IfConfError;
use crate::flags::{AdminState, InterfaceFlags};
use crate::kernel::{ControlSocket, Kernel};
use crate::name::InterfaceName;
use crate::socket::with_control_socket;

/// Bring an interface up or down.
///
/// Reads the current flags, sets or clears `IFF_UP` and writes the whole
/// word back, so bits this crate does not know about survive. Re-applying the
/// current state is a no-op as far as the kernel is concerned.
///
/// Returns the flag word that was written.
pub fn set_admin_state<K: Kernel>(
    kernel: &K,
    name: &InterfaceName,
    state: AdminState,
) -> Result<InterfaceFlags, IfConfError> {
    let written = with_control_socket(kernel, name, |socket| {
        let current = read_flags(socket, name)?;
        let next = current.with_admin_state(state);
        debug!(interface = %name, current = %current, next = %next, "writing flags");

        socket
            .set_flags(name, next)
            .map_err(|errno| IfConfError::WriteFlags {
                interface: name.clone(),
                errno,
            })?;
        Ok(next)
    })?;

    info!(interface = %name, state = %state, "admin state set");
    Ok(written)
}

/// Read the current flag word of an interface.
pub fn interface_flags<K: Kernel>(
    kernel: &K,
    name: &InterfaceName,
) -> Result<InterfaceFlags, IfConfError> {
    with_control_socket(kernel, name, |socket| read_flags(socket, name))
}

fn read_flags<S: ControlSocket>(
    socket: &mut S,
    name: &InterfaceName,
) -> Result<InterfaceFlags, IfConfError> {
    socket.flags(name).map_err(|errno| IfConfError::ReadFlags {
        interface: name.clone(),
        errno,
    })
}
