use std::fmt;
use std::str::FromStr;

/// Broadcast 64-bit address.
pub const BROADCAST_ADDRESS64: Address64 = Address64(0x0000_0000_0000_FFFF);
/// 64-bit address of the network coordinator.
pub const COORDINATOR_ADDRESS64: Address64 = Address64(0);
/// 16-bit broadcast address (legacy point-to-multipoint).
pub const BROADCAST_ADDRESS16: u16 = 0xFFFF;
/// 16-bit "address unknown" value for mesh sends.
pub const UNKNOWN_ADDRESS16: u16 = 0xFFFE;

/// A radio's 64-bit hardware address.
///
/// Renders as 16 uppercase hex digits, which is also the form used in
/// message-bus topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address64(u64);

impl Address64 {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Build from the high and low 32-bit halves.
    pub const fn from_halves(msb: u32, lsb: u32) -> Self {
        Self(((msb as u64) << 32) | lsb as u64)
    }

    /// Read eight big-endian bytes.
    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn msb(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub const fn lsb(self) -> u32 {
        self.0 as u32
    }

    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl From<u64> for Address64 {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Address64> for u64 {
    fn from(addr: Address64) -> Self {
        addr.0
    }
}

impl fmt::Display for Address64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

/// Error returned when a string is not a hex 64-bit address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid 64-bit address {0:?}: expected 1-16 hex digits")]
pub struct AddressParseError(pub String);

impl FromStr for Address64 {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty()
            || digits.len() > 16
            || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(AddressParseError(s.to_string()));
        }
        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| AddressParseError(s.to_string()))
    }
}
