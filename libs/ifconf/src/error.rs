//! Error types for interface provisioning.

use nix::errno::Errno;
use thiserror::Error;

use crate::name::InterfaceName;

/// Broad classification of a provisioning failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller input was rejected before any kernel call was made.
    Validation,

    /// The kernel rejected a control call (privilege, name collision, busy device).
    PrivilegeOrState,

    /// The transient control socket could not be created or closed.
    Resource,
}

/// Errors returned by the provisioning operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IfConfError {
    /// Interface name does not fit the kernel's naming rules.
    #[error("invalid interface name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// Address text is not a dotted-decimal IPv4 address.
    #[error("invalid IPv4 address: {0}")]
    InvalidAddress(String),

    /// Address parsed, but as IPv6.
    #[error("IPv6 address {0} is not supported on a TUN interface")]
    UnsupportedFamily(String),

    /// Prefix length outside 1..=31.
    #[error("invalid prefix length: {0} (must be between 1 and 31)")]
    InvalidPrefix(String),

    /// CIDR text without a `/prefix` part.
    #[error("missing prefix length in '{0}' (expected ADDRESS/PREFIX)")]
    MissingPrefix(String),

    /// TUNSETIFF on the device handle failed.
    #[error("TUNSETIFF failed for {interface}: {errno}")]
    Attach { interface: InterfaceName, errno: Errno },

    /// SIOCSIFADDR failed. Nothing was changed on the interface.
    #[error("SIOCSIFADDR failed for {interface}: {errno}")]
    SetAddress { interface: InterfaceName, errno: Errno },

    /// SIOCSIFNETMASK failed after SIOCSIFADDR succeeded.
    ///
    /// The address stays applied without the requested mask; no rollback is
    /// attempted.
    #[error("SIOCSIFNETMASK failed for {interface} (address already applied): {errno}")]
    NetmaskAfterAddress { interface: InterfaceName, errno: Errno },

    /// SIOCGIFFLAGS failed.
    #[error("SIOCGIFFLAGS failed for {interface}: {errno}")]
    ReadFlags { interface: InterfaceName, errno: Errno },

    /// SIOCSIFFLAGS failed.
    #[error("SIOCSIFFLAGS failed for {interface}: {errno}")]
    WriteFlags { interface: InterfaceName, errno: Errno },

    /// socket(AF_INET, SOCK_DGRAM) failed.
    #[error("failed to create control socket: {0}")]
    SocketCreate(Errno),

    /// close() on the control socket failed.
    #[error("failed to close control socket: {0}")]
    SocketClose(Errno),
}

impl IfConfError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            IfConfError::InvalidName { .. }
            | IfConfError::InvalidAddress(_)
            | IfConfError::UnsupportedFamily(_)
            | IfConfError::InvalidPrefix(_)
            | IfConfError::MissingPrefix(_) => ErrorKind::Validation,
            IfConfError::Attach { .. }
            | IfConfError::SetAddress { .. }
            | IfConfError::NetmaskAfterAddress { .. }
            | IfConfError::ReadFlags { .. }
            | IfConfError::WriteFlags { .. } => ErrorKind::PrivilegeOrState,
            IfConfError::SocketCreate(_) | IfConfError::SocketClose(_) => ErrorKind::Resource,
        }
    }

    /// Get the standardized reason code for this error.
    pub fn reason_code(&self) -> &'static str {
        match self {
            IfConfError::InvalidName { .. } => "invalid_name",
            IfConfError::InvalidAddress(_) => "invalid_address",
            IfConfError::UnsupportedFamily(_) => "unsupported_family",
            IfConfError::InvalidPrefix(_) => "invalid_prefix",
            IfConfError::MissingPrefix(_) => "missing_prefix",
            IfConfError::Attach { .. } => "attach_failed",
            IfConfError::SetAddress { .. } => "set_address_failed",
            IfConfError::NetmaskAfterAddress { .. } => "set_netmask_failed",
            IfConfError::ReadFlags { .. } => "read_flags_failed",
            IfConfError::WriteFlags { .. } => "write_flags_failed",
            IfConfError::SocketCreate(_) => "socket_create_failed",
            IfConfError::SocketClose(_) => "socket_close_failed",
        }
    }

    /// The OS error behind this failure, if a system call was involved.
    pub fn errno(&self) -> Option<Errno> {
        match self {
            IfConfError::Attach { errno, .. }
            | IfConfError::SetAddress { errno, .. }
            | IfConfError::NetmaskAfterAddress { errno, .. }
            | IfConfError::ReadFlags { errno, .. }
            | IfConfError::WriteFlags { errno, .. } => Some(*errno),
            IfConfError::SocketCreate(errno) | IfConfError::SocketClose(errno) => Some(*errno),
            _ => None,
        }
    }

    /// Returns true if the interface was left partially configured.
    pub fn is_partial(&self) -> bool {
        matches!(self, IfConfError::NetmaskAfterAddress { .. })
    }

    /// Returns true if the kernel refused the call for lack of privilege.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.errno(), Some(Errno::EPERM | Errno::EACCES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tun0() -> InterfaceName {
        "tun0".parse().unwrap()
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            IfConfError::InvalidPrefix("32".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            IfConfError::Attach {
                interface: tun0(),
                errno: Errno::EPERM,
            }
            .kind(),
            ErrorKind::PrivilegeOrState
        );
        assert_eq!(
            IfConfError::MissingPrefix("10.0.0.1".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            IfConfError::SocketClose(Errno::EBADF).kind(),
            ErrorKind::Resource
        );
    }

    #[test]
    fn test_partial_only_for_netmask_after_address() {
        let partial = IfConfError::NetmaskAfterAddress {
            interface: tun0(),
            errno: Errno::EINVAL,
        };
        let whole = IfConfError::SetAddress {
            interface: tun0(),
            errno: Errno::EINVAL,
        };
        assert!(partial.is_partial());
        assert!(!whole.is_partial());
    }

    #[test]
    fn test_message_names_call_and_os_error() {
        let err = IfConfError::ReadFlags {
            interface: tun0(),
            errno: Errno::ENODEV,
        };
        let msg = err.to_string();
        assert!(msg.contains("SIOCGIFFLAGS"));
        assert!(msg.contains("tun0"));
        assert!(msg.contains("ENODEV"));
    }

    #[test]
    fn test_permission_denied() {
        let err = IfConfError::Attach {
            interface: tun0(),
            errno: Errno::EPERM,
        };
        assert!(err.is_permission_denied());
        assert_eq!(err.reason_code(), "attach_failed");
        assert!(!IfConfError::InvalidAddress("x".into()).is_permission_denied());
    }
}
