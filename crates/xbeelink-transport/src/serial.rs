use std::time::Duration;

use tracing::info;

use crate::error::{Result, TransportError};
use crate::link::RadioLink;

/// Factory default baud rate of an XBee module.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default per-read timeout. Short, so that a bounded frame read can poll.
pub const DEFAULT_SERIAL_TIMEOUT: Duration = Duration::from_millis(100);

/// Serial port settings for a radio in API mode.
///
/// Data bits, parity and stop bits are fixed at 8N1, which is the only
/// framing the radio firmware supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path (e.g. `/dev/ttyUSB0`, `COM22`).
    pub path: String,
    /// Line speed in baud.
    pub baud_rate: u32,
    /// Timeout applied to each blocking read and write.
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: "/dev/ttyUSB0".to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_SERIAL_TIMEOUT,
        }
    }
}

impl SerialConfig {
    /// Settings for `path` with default speed and timeout.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Builder-style baud rate override.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Builder-style timeout override.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject settings that could never open a port.
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(TransportError::InvalidConfig(
                "serial port path must not be empty".to_string(),
            ));
        }
        if self.baud_rate == 0 {
            return Err(TransportError::InvalidConfig(
                "baud rate must be greater than zero".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(TransportError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Open the port described by this configuration.
    pub fn open(&self) -> Result<RadioLink> {
        self.validate()?;
        let port = serialport::new(&self.path, self.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(self.timeout)
            .open()
            .map_err(|source| TransportError::OpenSerial {
                path: self.path.clone(),
                source,
            })?;

        info!(path = %self.path, baud = self.baud_rate, "serial port opened");
        Ok(RadioLink::from_serial(port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = SerialConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.baud_rate, 9600);
    }

    #[test]
    fn builder_overrides() {
        let cfg = SerialConfig::new("/dev/ttyAMA0")
            .with_baud_rate(115_200)
            .with_timeout(Duration::from_millis(20));
        assert_eq!(cfg.path, "/dev/ttyAMA0");
        assert_eq!(cfg.baud_rate, 115_200);
        assert_eq!(cfg.timeout, Duration::from_millis(20));
    }

    #[test]
    fn rejects_empty_path() {
        let err = SerialConfig::new("  ").validate().unwrap_err();
        assert!(matches!(err, TransportError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_zero_baud_and_timeout() {
        let cfg = SerialConfig::new("/dev/ttyUSB0").with_baud_rate(0);
        assert!(cfg.validate().is_err());

        let cfg = SerialConfig::new("/dev/ttyUSB0").with_timeout(Duration::ZERO);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn open_missing_device_fails() {
        let cfg = SerialConfig::new("/dev/xbeelink-does-not-exist");
        let err = cfg.open().unwrap_err();
        assert!(matches!(err, TransportError::OpenSerial { .. }));
    }
}
