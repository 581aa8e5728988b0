//! IPv4 address and prefix handling.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::error::IfConfError;

/// Network prefix length, restricted to 1..=31.
///
/// Both endpoints are excluded so the mask always keeps at least one network
/// bit and one host bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrefixLength(u8);

impl PrefixLength {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 31;

    /// Create a prefix length.
    pub fn new(len: u8) -> Result<Self, IfConfError> {
        if !(Self::MIN..=Self::MAX).contains(&len) {
            return Err(IfConfError::InvalidPrefix(len.to_string()));
        }
        Ok(Self(len))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Derive the netmask: the top `len` bits set, the rest clear.
    pub fn netmask(self) -> Ipv4Addr {
        Ipv4Addr::from(u32::MAX << (32 - u32::from(self.0)))
    }
}

impl TryFrom<i32> for PrefixLength {
    type Error = IfConfError;

    fn try_from(len: i32) -> Result<Self, Self::Error> {
        u8::try_from(len)
            .map_err(|_| IfConfError::InvalidPrefix(len.to_string()))
            .and_then(Self::new)
    }
}

impl FromStr for PrefixLength {
    type Err = IfConfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let len: i32 = s
            .trim()
            .parse()
            .map_err(|_| IfConfError::InvalidPrefix(s.to_string()))?;
        Self::try_from(len)
    }
}

impl fmt::Display for PrefixLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse dotted-decimal IPv4 text.
///
/// IPv6 literals are rejected with their own error so callers can tell a
/// typo from an unsupported family.
pub fn parse_ipv4(text: &str) -> Result<Ipv4Addr, IfConfError> {
    match IpAddr::from_str(text) {
        Ok(IpAddr::V4(addr)) => Ok(addr),
        Ok(IpAddr::V6(addr)) => Err(IfConfError::UnsupportedFamily(addr.to_string())),
        Err(_) => Err(IfConfError::InvalidAddress(text.to_string())),
    }
}

/// The `s_addr` value for an address: its octets in memory order, which is
/// network byte order.
pub fn network_order(addr: Ipv4Addr) -> u32 {
    u32::from_ne_bytes(addr.octets())
}

/// An IPv4 address together with its prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceAddress {
    /// Address assigned to the interface.
    pub address: Ipv4Addr,

    /// Prefix length used to derive the netmask.
    pub prefix: PrefixLength,
}

impl InterfaceAddress {
    /// Validate a textual address and an integer prefix.
    ///
    /// The prefix is checked first, then the address.
    pub fn new(address: &str, prefix: i32) -> Result<Self, IfConfError> {
        let prefix = PrefixLength::try_from(prefix)?;
        let address = parse_ipv4(address)?;
        Ok(Self { address, prefix })
    }

    /// Parse from CIDR notation (e.g., "10.0.0.1/24").
    pub fn from_cidr(s: &str) -> Result<Self, IfConfError> {
        let Some((addr_str, prefix_str)) = s.split_once('/') else {
            return Err(IfConfError::MissingPrefix(s.to_string()));
        };

        let prefix = prefix_str.parse::<PrefixLength>()?;
        let address = parse_ipv4(addr_str)?;
        Ok(Self { address, prefix })
    }

    pub fn netmask(&self) -> Ipv4Addr {
        self.prefix.netmask()
    }
}

impl FromStr for InterfaceAddress {
    type Err = IfConfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_cidr(s)
    }
}

impl fmt::Display for InterfaceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix)
    }
}
