//! Interface flag words and administrative state.

use std::fmt;
use std::str::FromStr;

/// Flag word as read from and written to `ifr_flags`.
///
/// Only `UP` is ever changed by this crate. Every other bit, named here or
/// not, is carried through a read-modify-write unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct InterfaceFlags(u16);

impl InterfaceFlags {
    pub const UP: u16 = 0x0001;
    pub const BROADCAST: u16 = 0x0002;
    pub const DEBUG: u16 = 0x0004;
    pub const LOOPBACK: u16 = 0x0008;
    pub const POINTOPOINT: u16 = 0x0010;
    pub const NOTRAILERS: u16 = 0x0020;
    pub const RUNNING: u16 = 0x0040;
    pub const NOARP: u16 = 0x0080;
    pub const PROMISC: u16 = 0x0100;
    pub const ALLMULTI: u16 = 0x0200;
    pub const MASTER: u16 = 0x0400;
    pub const SLAVE: u16 = 0x0800;
    pub const MULTICAST: u16 = 0x1000;
    pub const PORTSEL: u16 = 0x2000;
    pub const AUTOMEDIA: u16 = 0x4000;
    pub const DYNAMIC: u16 = 0x8000;

    const NAMES: [(u16, &'static str); 16] = [
        (Self::UP, "UP"),
        (Self::BROADCAST, "BROADCAST"),
        (Self::DEBUG, "DEBUG"),
        (Self::LOOPBACK, "LOOPBACK"),
        (Self::POINTOPOINT, "POINTOPOINT"),
        (Self::NOTRAILERS, "NOTRAILERS"),
        (Self::RUNNING, "RUNNING"),
        (Self::NOARP, "NOARP"),
        (Self::PROMISC, "PROMISC"),
        (Self::ALLMULTI, "ALLMULTI"),
        (Self::MASTER, "MASTER"),
        (Self::SLAVE, "SLAVE"),
        (Self::MULTICAST, "MULTICAST"),
        (Self::PORTSEL, "PORTSEL"),
        (Self::AUTOMEDIA, "AUTOMEDIA"),
        (Self::DYNAMIC, "DYNAMIC"),
    ];

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, bit: u16) -> bool {
        self.0 & bit == bit
    }

    pub const fn is_up(self) -> bool {
        self.contains(Self::UP)
    }

    pub const fn is_running(self) -> bool {
        self.contains(Self::RUNNING)
    }

    pub fn admin_state(self) -> AdminState {
        if self.is_up() {
            AdminState::Up
        } else {
            AdminState::Down
        }
    }

    /// Set or clear `UP`, leaving all other bits alone.
    pub const fn with_admin_state(self, state: AdminState) -> Self {
        match state {
            AdminState::Up => Self(self.0 | Self::UP),
            AdminState::Down => Self(self.0 & !Self::UP),
        }
    }
}

impl fmt::Display for InterfaceFlags {
    /// Formats like `ip link`: `0x1091<UP,POINTOPOINT,NOARP,MULTICAST>`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}<", self.0)?;
        let mut first = true;
        for (bit, name) in Self::NAMES {
            if self.contains(bit) {
                if !first {
                    f.write_str(",")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        f.write_str(">")
    }
}

/// Administrative (operator-intended) state of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminState {
    Up,
    Down,
}

impl AdminState {
    pub fn as_str(self) -> &'static str {
        match self {
            AdminState::Up => "up",
            AdminState::Down => "down",
        }
    }
}

impl fmt::Display for AdminState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an admin state string is neither `up` nor `down`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid admin state '{0}': expected 'up' or 'down'")]
pub struct ParseAdminStateError(String);

impl FromStr for AdminState {
    type Err = ParseAdminStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(AdminState::Up),
            "down" => Ok(AdminState::Down),
            _ => Err(ParseAdminStateError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_up_preserves_other_bits() {
        let fresh = InterfaceFlags::from_bits(
            InterfaceFlags::POINTOPOINT | InterfaceFlags::NOARP | InterfaceFlags::MULTICAST,
        );
        let up = fresh.with_admin_state(AdminState::Up);
        assert!(up.is_up());
        assert_eq!(up.bits() & !InterfaceFlags::UP, fresh.bits());
    }

    #[test]
    fn test_up_is_idempotent() {
        let once = InterfaceFlags::from_bits(0x1090).with_admin_state(AdminState::Up);
        let twice = once.with_admin_state(AdminState::Up);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_display() {
        let flags = InterfaceFlags::from_bits(0x1091);
        assert_eq!(flags.to_string(), "0x1091<UP,POINTOPOINT,NOARP,MULTICAST>");
        assert_eq!(InterfaceFlags::default().to_string(), "0x0000<>");
    }

    #[test]
    fn test_admin_state_parse() {
        assert_eq!("up".parse::<AdminState>().unwrap(), AdminState::Up);
        assert_eq!("DOWN".parse::<AdminState>().unwrap(), AdminState::Down);
        assert!("sideways".parse::<AdminState>().is_err());
    }

    proptest! {
        #[test]
        fn toggle_only_touches_up(bits in any::<u16>(), up in any::<bool>()) {
            let state = if up { AdminState::Up } else { AdminState::Down };
            let next = InterfaceFlags::from_bits(bits).with_admin_state(state);
            prop_assert_eq!(next.bits() & !InterfaceFlags::UP, bits & !InterfaceFlags::UP);
            prop_assert_eq!(next.admin_state(), state);
        }
    }
}
