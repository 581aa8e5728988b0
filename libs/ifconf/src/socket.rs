//! Scoped control-socket usage.

use tracing::{trace, warn};

use crate::error::IfConfError;
use crate::kernel::{ControlSocket, Kernel};
use crate::name::InterfaceName;

/// Open a control socket, run `op` with it, and close it on every path.
///
/// If `op` fails, its error is returned even when the close fails as well;
/// the close error is only logged. If `op` succeeds, a close failure is
/// returned as [`IfConfError::SocketClose`].
pub(crate) fn with_control_socket<K, T, F>(
    kernel: &K,
    interface: &InterfaceName,
    op: F,
) -> Result<T, IfConfError>
where
    K: Kernel,
    F: FnOnce(&mut K::Socket) -> Result<T, IfConfError>,
{
    let mut socket = kernel
        .open_control_socket()
        .map_err(IfConfError::SocketCreate)?;
    trace!(interface = %interface, "control socket open");

    match op(&mut socket) {
        Ok(value) => {
            socket.close().map_err(IfConfError::SocketClose)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(close_err) = socket.close() {
                warn!(
                    interface = %interface,
                    error = %err,
                    close_error = %close_err,
                    "control socket close failed after error"
                );
            }
            Err(err)
        }
    }
}
