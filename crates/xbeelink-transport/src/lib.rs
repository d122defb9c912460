//! Byte links to an XBee radio.
//!
//! Provides a single [`RadioLink`] type over the two byte sources the bridge
//! knows how to talk to:
//! - a serial port with the radio in API mode 2 (escaped)
//! - a recorded capture file, replayed read-only
//!
//! This is the lowest layer of xbeelink. The frame codec reads from and
//! writes to a [`RadioLink`] through `std::io::Read`/`Write`.

pub mod error;
pub mod link;
pub mod serial;

pub use error::{Result, TransportError};
pub use link::RadioLink;
pub use serial::{SerialConfig, DEFAULT_BAUD_RATE, DEFAULT_SERIAL_TIMEOUT};
