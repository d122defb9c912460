//! Status codes carried by delivery-status, modem-status and
//! configuration-response frames.

use std::fmt;

/// Outcome of an extended send, reported by a delivery-status frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryStatus {
    Success,
    CcaFailure,
    InvalidDestinationEndpoint,
    NetworkAckFailure,
    NotJoinedToNetwork,
    SelfAddressed,
    AddressNotFound,
    RouteNotFound,
    PayloadTooLarge,
    Other(u8),
}

impl DeliveryStatus {
    /// Raw status byte.
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0x00,
            Self::CcaFailure => 0x02,
            Self::InvalidDestinationEndpoint => 0x15,
            Self::NetworkAckFailure => 0x21,
            Self::NotJoinedToNetwork => 0x22,
            Self::SelfAddressed => 0x23,
            Self::AddressNotFound => 0x24,
            Self::RouteNotFound => 0x25,
            Self::PayloadTooLarge => 0x74,
            Self::Other(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl From<u8> for DeliveryStatus {
    fn from(code: u8) -> Self {
        match code {
            0x00 => Self::Success,
            0x02 => Self::CcaFailure,
            0x15 => Self::InvalidDestinationEndpoint,
            0x21 => Self::NetworkAckFailure,
            0x22 => Self::NotJoinedToNetwork,
            0x23 => Self::SelfAddressed,
            0x24 => Self::AddressNotFound,
            0x25 => Self::RouteNotFound,
            0x74 => Self::PayloadTooLarge,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::CcaFailure => "cca failure",
            Self::InvalidDestinationEndpoint => "invalid destination endpoint",
            Self::NetworkAckFailure => "network ack failure",
            Self::NotJoinedToNetwork => "not joined to network",
            Self::SelfAddressed => "self addressed",
            Self::AddressNotFound => "address not found",
            Self::RouteNotFound => "route not found",
            Self::PayloadTooLarge => "payload too large",
            Self::Other(code) => return write!(f, "status 0x{code:02X}"),
        };
        f.write_str(name)
    }
}

/// Radio state change reported by a modem-status frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModemStatus {
    HardwareReset,
    WatchdogTimerReset,
    Associated,
    Disassociated,
    SynchronizationLost,
    CoordinatorRealignment,
    CoordinatorStarted,
    Other(u8),
}

impl ModemStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::HardwareReset => 0,
            Self::WatchdogTimerReset => 1,
            Self::Associated => 2,
            Self::Disassociated => 3,
            Self::SynchronizationLost => 4,
            Self::CoordinatorRealignment => 5,
            Self::CoordinatorStarted => 6,
            Self::Other(code) => code,
        }
    }
}

impl From<u8> for ModemStatus {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::HardwareReset,
            1 => Self::WatchdogTimerReset,
            2 => Self::Associated,
            3 => Self::Disassociated,
            4 => Self::SynchronizationLost,
            5 => Self::CoordinatorRealignment,
            6 => Self::CoordinatorStarted,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for ModemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HardwareReset => "hardware reset",
            Self::WatchdogTimerReset => "watchdog timer reset",
            Self::Associated => "associated",
            Self::Disassociated => "disassociated",
            Self::SynchronizationLost => "synchronization lost",
            Self::CoordinatorRealignment => "coordinator realignment",
            Self::CoordinatorStarted => "coordinator started",
            Self::Other(code) => return write!(f, "modem status 0x{code:02X}"),
        };
        f.write_str(name)
    }
}

/// Result of a local or remote configuration command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtStatus {
    Ok,
    Error,
    InvalidCommand,
    InvalidParameter,
    NoResponse,
    Other(u8),
}

impl AtStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Error => 1,
            Self::InvalidCommand => 2,
            Self::InvalidParameter => 3,
            Self::NoResponse => 4,
            Self::Other(code) => code,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl From<u8> for AtStatus {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::Error,
            2 => Self::InvalidCommand,
            3 => Self::InvalidParameter,
            4 => Self::NoResponse,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for AtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::InvalidCommand => "invalid command",
            Self::InvalidParameter => "invalid parameter",
            Self::NoResponse => "no response",
            Self::Other(code) => return write!(f, "at status 0x{code:02X}"),
        };
        f.write_str(name)
    }
}
