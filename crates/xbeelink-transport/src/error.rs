use std::path::PathBuf;

/// Errors that can occur while opening or using a radio link.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial device.
    #[error("failed to open serial port {path}: {source}")]
    OpenSerial {
        path: String,
        source: serialport::Error,
    },

    /// Failed to open a capture file.
    #[error("failed to open capture {path}: {source}")]
    OpenCapture {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to reconfigure an open serial port.
    #[error("serial configuration failed: {0}")]
    Configure(#[from] serialport::Error),

    /// An I/O error occurred on the link.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration cannot be used to open a link.
    #[error("invalid serial configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
