//! XBee API-mode framing and a radio-to-message-bus bridge.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial and capture-file byte links
//! - [`frame`]: the frame parser, encoder and typed request/response model
//! - [`bridge`]: sensor telemetry and command mapping (behind `bridge` feature)

/// Re-export transport types.
pub mod transport {
    pub use xbeelink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use xbeelink_frame::*;
}

/// Re-export bridge types (requires `bridge` feature).
#[cfg(feature = "bridge")]
pub mod bridge {
    pub use xbeelink_bridge::*;
}
