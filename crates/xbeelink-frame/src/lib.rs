//! XBee API-mode frame engine.
//!
//! Every frame on the wire is:
//! - a start byte (0x7E)
//! - a 2-byte big-endian length of the frame data
//! - the frame data: an api id byte followed by type-specific fields
//! - a checksum that brings the frame-data sum to 0xFF
//!
//! Control bytes inside a frame travel escaped as `0x7D, byte ^ 0x20`.
//! [`FrameParser`] turns an arbitrarily chunked byte stream into validated
//! [`ApiFrame`]s, [`Response::from_frame`] classifies them, and
//! [`Request::encode`] renders outbound frames.

pub mod address;
pub mod api;
#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod frame_id;
pub mod reader;
pub mod request;
pub mod response;
pub mod status;
pub mod writer;

pub use address::{
    Address64, AddressParseError, BROADCAST_ADDRESS16, BROADCAST_ADDRESS64,
    COORDINATOR_ADDRESS64, UNKNOWN_ADDRESS16,
};
#[cfg(feature = "async")]
pub use async_codec::XBeeCodec;
pub use codec::{
    checksum, encode_frame, escape_frame, verify_checksum, ApiFrame, FrameConfig, FrameParser,
    Outcomes, ParseState, MAX_FRAME_DATA_SIZE, PACKET_OVERHEAD,
};
pub use error::{FrameError, ParseError, Result};
pub use frame_id::{FrameIdAllocator, NO_RESPONSE_FRAME_ID};
pub use reader::{FrameReader, ReadOutcome};
pub use request::{
    AtCommandRequest, RemoteAtCommandRequest, Request, Tx16Request, Tx64Request,
    ZbExplicitTxRequest, ZbTxRequest,
};
pub use response::{
    AtCommandResponse, LegacyAddressing, LegacyIoSample, LegacyRx, LegacySource,
    RemoteAtCommandResponse, Response, TxStatus, ZbExplicitRx, ZbIoSample, ZbRx, ZbTxStatus,
};
pub use status::{AtStatus, DeliveryStatus, ModemStatus};
pub use writer::FrameWriter;
pub use tokio_util::sync::CancellationToken;
