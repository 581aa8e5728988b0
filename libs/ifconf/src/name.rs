//! Bounded interface names.

use std::fmt;
use std::str::FromStr;

use crate::error::IfConfError;

/// Size of the kernel's name buffer, terminator included.
pub const IFNAMSIZ: usize = 16;

/// Longest name the kernel accepts.
pub const MAX_NAME_LEN: usize = IFNAMSIZ - 1;

/// A network interface name the kernel will accept as-is.
///
/// Construction enforces the same rules as the kernel's `dev_valid_name`,
/// so a name is never truncated on its way into an `ifreq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceName(String);

impl InterfaceName {
    /// Validate and wrap a name.
    pub fn new(name: impl Into<String>) -> Result<Self, IfConfError> {
        let name = name.into();
        match validate(&name) {
            Ok(()) => Ok(Self(name)),
            Err(reason) => Err(IfConfError::InvalidName { name, reason }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

fn validate(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("name is empty");
    }
    if name.len() > MAX_NAME_LEN {
        return Err("longer than 15 bytes");
    }
    if name == "." || name == ".." {
        return Err("reserved name");
    }
    if name
        .bytes()
        .any(|b| b == 0 || b == b'/' || b == b':' || b.is_ascii_whitespace())
    {
        return Err("contains NUL, '/', ':' or whitespace");
    }
    Ok(())
}

impl FromStr for InterfaceName {
    type Err = IfConfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for InterfaceName {
    type Error = IfConfError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl AsRef<str> for InterfaceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("tun0")]
    #[case("tun_test")]
    #[case("tun%d")]
    #[case("abcdefghijklmno")]
    fn test_valid_names(#[case] name: &str) {
        let parsed: InterfaceName = name.parse().unwrap();
        assert_eq!(parsed.as_str(), name);
    }

    #[rstest]
    #[case("", "name is empty")]
    #[case("abcdefghijklmnop", "longer than 15 bytes")]
    #[case(".", "reserved name")]
    #[case("..", "reserved name")]
    #[case("tun/0", "contains NUL, '/', ':' or whitespace")]
    #[case("tun:0", "contains NUL, '/', ':' or whitespace")]
    #[case("tun 0", "contains NUL, '/', ':' or whitespace")]
    #[case("tun\00", "contains NUL, '/', ':' or whitespace")]
    fn test_invalid_names(#[case] name: &str, #[case] expected: &str) {
        match InterfaceName::new(name) {
            Err(IfConfError::InvalidName { reason, .. }) => assert_eq!(reason, expected),
            other => panic!("expected InvalidName, got {:?}", other),
        }
    }

    #[test]
    fn test_multibyte_counts_bytes() {
        // 8 chars, 16 bytes
        assert!(InterfaceName::new("éééééééé").is_err());
        assert!(InterfaceName::new("ééééééé").is_ok());
    }

    proptest! {
        #[test]
        fn overlong_names_never_accepted(name in "[a-z0-9_]{16,40}") {
            prop_assert!(InterfaceName::new(name).is_err());
        }

        #[test]
        fn short_names_roundtrip(name in "[a-z][a-z0-9_]{0,14}") {
            let parsed = InterfaceName::new(name.clone()).unwrap();
            prop_assert_eq!(parsed.to_string(), name);
        }
    }
}
