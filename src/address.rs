use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub(crate) const DEVICE_PREFIX: &str = "utun";

/// The identity of a TUN interface: the name the kernel assigned to it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TunAddress {
    if_name: Option<String>,
}

impl TunAddress {
    pub fn new<S: Into<String>>(if_name: S) -> Self {
        TunAddress {
            if_name: Some(if_name.into()),
        }
    }

    /// Build an address from the NUL-terminated name buffer filled in by the kernel.
    pub fn from_c_buf(buf: &[u8]) -> Self {
        let end = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
        TunAddress::new(String::from_utf8_lossy(&buf[..end]))
    }

    pub fn if_name(&self) -> Option<&str> {
        self.if_name.as_deref()
    }

    /// Kernel control unit for this name: `utunN` is unit `N + 1`.
    pub fn unit(&self) -> Result<u32> {
        let name = self.if_name.as_deref().ok_or(Error::InvalidName)?;
        parse_unit(name)
    }
}

pub(crate) fn parse_unit(name: &str) -> Result<u32> {
    if name.len() >= libc::IFNAMSIZ {
        return Err(Error::NameTooLong);
    }
    let index = name
        .strip_prefix(DEVICE_PREFIX)
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .ok_or(Error::InvalidName)?;
    index
        .parse::<u32>()
        .ok()
        .and_then(|v| v.checked_add(1))
        .ok_or(Error::InvalidName)
}

impl fmt::Display for TunAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.if_name.as_deref().unwrap_or(""))
    }
}

impl FromStr for TunAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_unit(s)?;
        Ok(TunAddress::new(s))
    }
}
