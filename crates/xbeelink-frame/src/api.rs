//! API identifiers and wire control bytes.
//!
//! Identifiers below 0x80 are requests sent to the radio; 0x80 and above are
//! responses the radio sends back.

/// Frame delimiter.
pub const START_BYTE: u8 = 0x7E;
/// Escape marker; the next byte is XOR-ed with [`ESCAPE_XOR`].
pub const ESCAPE: u8 = 0x7D;
/// Software flow control: resume.
pub const XON: u8 = 0x11;
/// Software flow control: pause.
pub const XOFF: u8 = 0x13;
/// Mask applied to an escaped byte.
pub const ESCAPE_XOR: u8 = 0x20;

pub const TX_64_REQUEST: u8 = 0x00;
pub const TX_16_REQUEST: u8 = 0x01;
pub const AT_COMMAND_REQUEST: u8 = 0x08;
pub const AT_COMMAND_QUEUE_REQUEST: u8 = 0x09;
pub const ZB_TX_REQUEST: u8 = 0x10;
pub const ZB_EXPLICIT_TX_REQUEST: u8 = 0x11;
pub const REMOTE_AT_REQUEST: u8 = 0x17;

pub const RX_64_RESPONSE: u8 = 0x80;
pub const RX_16_RESPONSE: u8 = 0x81;
pub const RX_64_IO_RESPONSE: u8 = 0x82;
pub const RX_16_IO_RESPONSE: u8 = 0x83;
pub const AT_COMMAND_RESPONSE: u8 = 0x88;
pub const TX_STATUS_RESPONSE: u8 = 0x89;
pub const MODEM_STATUS_RESPONSE: u8 = 0x8A;
pub const ZB_TX_STATUS_RESPONSE: u8 = 0x8B;
pub const ZB_RX_RESPONSE: u8 = 0x90;
pub const ZB_EXPLICIT_RX_RESPONSE: u8 = 0x91;
pub const ZB_IO_SAMPLE_RESPONSE: u8 = 0x92;
pub const REMOTE_AT_COMMAND_RESPONSE: u8 = 0x97;

/// Returns true if `byte` must travel escaped on the wire.
pub fn needs_escape(byte: u8) -> bool {
    matches!(byte, START_BYTE | ESCAPE | XON | XOFF)
}

/// Returns a human-readable name for an API identifier.
pub fn api_name(id: u8) -> &'static str {
    match id {
        TX_64_REQUEST => "TX_64",
        TX_16_REQUEST => "TX_16",
        AT_COMMAND_REQUEST => "AT_COMMAND",
        AT_COMMAND_QUEUE_REQUEST => "AT_COMMAND_QUEUE",
        ZB_TX_REQUEST => "ZB_TX",
        ZB_EXPLICIT_TX_REQUEST => "ZB_EXPLICIT_TX",
        REMOTE_AT_REQUEST => "REMOTE_AT",
        RX_64_RESPONSE => "RX_64",
        RX_16_RESPONSE => "RX_16",
        RX_64_IO_RESPONSE => "RX_64_IO",
        RX_16_IO_RESPONSE => "RX_16_IO",
        AT_COMMAND_RESPONSE => "AT_RESPONSE",
        TX_STATUS_RESPONSE => "TX_STATUS",
        MODEM_STATUS_RESPONSE => "MODEM_STATUS",
        ZB_TX_STATUS_RESPONSE => "ZB_TX_STATUS",
        ZB_RX_RESPONSE => "ZB_RX",
        ZB_EXPLICIT_RX_RESPONSE => "ZB_EXPLICIT_RX",
        ZB_IO_SAMPLE_RESPONSE => "ZB_IO_SAMPLE",
        REMOTE_AT_COMMAND_RESPONSE => "REMOTE_AT_RESPONSE",
        _ => "UNKNOWN",
    }
}

/// Returns true if the identifier is one the radio sends to the host.
pub fn is_response(id: u8) -> bool {
    id >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_bytes_need_escape() {
        for b in [START_BYTE, ESCAPE, XON, XOFF] {
            assert!(needs_escape(b), "0x{b:02X}");
        }
        assert!(!needs_escape(0x00));
        assert!(!needs_escape(0x5E));
        assert!(!needs_escape(0xFF));
    }

    #[test]
    fn names() {
        assert_eq!(api_name(ZB_RX_RESPONSE), "ZB_RX");
        assert_eq!(api_name(REMOTE_AT_REQUEST), "REMOTE_AT");
        assert_eq!(api_name(0x42), "UNKNOWN");
    }

    #[test]
    fn direction() {
        assert!(is_response(MODEM_STATUS_RESPONSE));
        assert!(!is_response(ZB_TX_REQUEST));
    }
}
