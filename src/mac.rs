//! 48-bit MAC address with offset arithmetic.
//!
//! Provisioning hands out consecutive addresses starting at the one printed
//! on the device label, so the type is stored as a plain integer and
//! formatted on demand.

use core::fmt;
use core::str::FromStr;

use crate::error::MacAddressError;

/// Largest representable address (`ff:ff:ff:ff:ff:ff`).
const MAX: u64 = (1 << 48) - 1;

/// An immutable 48-bit MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacAddress(u64);

impl MacAddress {
    /// Parse a MAC address. `:` and `-` separators are stripped anywhere in
    /// the input; the remainder must be exactly 12 hex digits (any case).
    pub fn parse(input: &str) -> Result<Self, MacAddressError> {
        let digits: String = input.chars().filter(|c| !matches!(c, ':' | '-')).collect();

        if digits.len() != 12 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(MacAddressError::InvalidFormat(input.to_owned()));
        }

        u64::from_str_radix(&digits, 16)
            .map(Self)
            .map_err(|_| MacAddressError::InvalidFormat(input.to_owned()))
    }

    /// Build from the integer value; `None` if it does not fit in 48 bits.
    pub const fn from_u64(value: u64) -> Option<Self> {
        if value > MAX { None } else { Some(Self(value)) }
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Address `n` positions above this one. Fails instead of wrapping past
    /// `ff:ff:ff:ff:ff:ff`.
    pub fn increment(self, n: u64) -> Result<Self, MacAddressError> {
        self.0
            .checked_add(n)
            .and_then(Self::from_u64)
            .ok_or_else(|| MacAddressError::OutOfRange {
                base: self.to_string(),
                op: '+',
                offset: n,
            })
    }

    /// Address `n` positions below this one. Fails instead of wrapping below
    /// `00:00:00:00:00:00`.
    pub fn decrement(self, n: u64) -> Result<Self, MacAddressError> {
        self.0
            .checked_sub(n)
            .map(Self)
            .ok_or_else(|| MacAddressError::OutOfRange {
                base: self.to_string(),
                op: '-',
                offset: n,
            })
    }

    /// `aa:bb:cc:dd:ee:ff`
    pub fn format_colon(self) -> String {
        self.delimited(':')
    }

    /// `aa-bb-cc-dd-ee-ff`
    pub fn format_dash(self) -> String {
        self.delimited('-')
    }

    /// Organisationally unique identifier: first 3 bytes as 6 hex digits.
    pub fn oui(self) -> String {
        format!("{:06x}", self.0 >> 24)
    }

    /// Device specific part: last 3 bytes as 6 hex digits.
    pub fn nic(self) -> String {
        format!("{:06x}", self.0 & 0x00ff_ffff)
    }

    pub fn octets(self) -> [u8; 6] {
        let b = self.0.to_be_bytes();
        [b[2], b[3], b[4], b[5], b[6], b[7]]
    }

    fn delimited(self, delimiter: char) -> String {
        let mut out = String::with_capacity(17);
        for (i, octet) in self.octets().iter().enumerate() {
            if i > 0 {
                out.push(delimiter);
            }
            out.push_str(&format!("{octet:02x}"));
        }
        out
    }
}

/// Canonical form: 12 lower-case hex digits without separators. This is
/// also the form handed to the MAC programming helpers.
impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:012x}", self.0)
    }
}

impl FromStr for MacAddress {
    type Err = MacAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
