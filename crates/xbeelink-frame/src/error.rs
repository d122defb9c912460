use std::time::Duration;

/// Frame-boundary parse failures.
///
/// Every variant is recoverable: the parser has already reset and the next
/// call begins a new frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A start byte arrived while a frame was still in progress.
    #[error("unexpected start byte inside a frame")]
    UnexpectedStartByte,

    /// The frame carried more data than the receive buffer holds.
    #[error("frame data exceeds maximum size ({max} bytes)")]
    PacketExceedsMaxSize { max: usize },

    /// The checksum byte did not bring the frame-data sum to 0xFF.
    #[error("checksum failure on api id 0x{api_id:02X} ({frame_data_len} data bytes, sum 0x{sum:02X})")]
    ChecksumFailure {
        api_id: u8,
        frame_data_len: usize,
        sum: u8,
    },

    /// The length field declared zero bytes of frame data.
    #[error("frame declares zero length")]
    EmptyFrame,
}

/// Errors that can occur while reading, writing or classifying frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The byte stream did not form a valid frame.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A recognized response type is shorter than its fixed layout.
    #[error("api id 0x{api_id:02X} needs at least {expected} data bytes, got {actual}")]
    TooShort {
        api_id: u8,
        expected: usize,
        actual: usize,
    },

    /// Frame-data too long for the 16-bit length field.
    #[error("frame data of {len} bytes does not fit the length field")]
    LengthOverflow { len: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte source reached end of stream.
    #[error("link closed")]
    ConnectionClosed,

    /// No frame completed within the allowed time.
    #[error("no frame within {0:?}")]
    Timeout(Duration),

    /// The read was cancelled by its token.
    #[error("read cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, FrameError>;
