use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::api::{needs_escape, ESCAPE, ESCAPE_XOR, START_BYTE};
use crate::error::{FrameError, ParseError, Result};

/// Default receive capacity: data bytes after the api id, before the checksum.
pub const MAX_FRAME_DATA_SIZE: usize = 110;

/// Start byte + length (2) + checksum.
pub const PACKET_OVERHEAD: usize = 4;

/// Largest frame-data block (api id included) the length field can describe.
pub const MAX_ENCODED_FRAME_DATA: usize = u16::MAX as usize;

/// Sum a checksum is expected to reach, taken over frame-data plus checksum.
const CHECKSUM_TARGET: u8 = 0xFF;

/// One validated API frame.
///
/// `data` holds every byte after the api id and before the checksum, so for
/// frames that carry a frame id it starts with that id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFrame {
    /// The type identifier.
    pub api_id: u8,
    /// Type-specific bytes.
    pub data: Bytes,
}

impl ApiFrame {
    /// Create a new frame.
    pub fn new(api_id: u8, data: impl Into<Bytes>) -> Self {
        Self {
            api_id,
            data: data.into(),
        }
    }

    /// Length of `data` (frame-data minus the api id).
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Value of the length field: api id plus `data`.
    pub fn frame_data_len(&self) -> usize {
        1 + self.data.len()
    }

    /// First data byte, which is the frame id for request and status frames.
    pub fn frame_id(&self) -> Option<u8> {
        self.data.first().copied()
    }

    /// Unescaped wire size of this frame.
    pub fn wire_size(&self) -> usize {
        PACKET_OVERHEAD + self.frame_data_len()
    }

    /// Serialize back to unescaped wire bytes.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        encode_frame(self.api_id, &self.data, dst)
    }
}

/// Checksum for a frame-data block (api id first).
pub fn checksum(frame_data: &[u8]) -> u8 {
    let sum = frame_data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    CHECKSUM_TARGET.wrapping_sub(sum)
}

/// Returns true when `frame_data` plus `checksum` sums to 0xFF.
pub fn verify_checksum(frame_data: &[u8], checksum: u8) -> bool {
    frame_data
        .iter()
        .fold(checksum, |acc, b| acc.wrapping_add(*b))
        == CHECKSUM_TARGET
}

/// Write the header (start byte and length) for `frame_data_len` bytes.
pub(crate) fn put_header(frame_data_len: usize, dst: &mut BytesMut) -> Result<()> {
    let len = u16::try_from(frame_data_len).map_err(|_| FrameError::LengthOverflow {
        len: frame_data_len,
    })?;
    dst.put_u8(START_BYTE);
    dst.put_u16(len);
    Ok(())
}

/// Encode a frame into unescaped wire format.
///
/// Wire format:
/// ```text
/// ┌───────┬────────────┬────────┬──────────────┬──────────┐
/// │ 0x7E  │ Length     │ Api id │ Data         │ Checksum │
/// │       │ (2B BE)    │ (1B)   │ (Length - 1) │ (1B)     │
/// └───────┴────────────┴────────┴──────────────┴──────────┘
/// ```
///
/// Control bytes inside the frame are not escaped; see [`escape_frame`].
pub fn encode_frame(api_id: u8, data: &[u8], dst: &mut BytesMut) -> Result<()> {
    dst.reserve(PACKET_OVERHEAD + 1 + data.len());
    put_header(1 + data.len(), dst)?;
    let body_start = dst.len();
    dst.put_u8(api_id);
    dst.put_slice(data);
    let sum = checksum(&dst[body_start..]);
    dst.put_u8(sum);
    Ok(())
}

/// Escape every control byte after the leading start byte.
///
/// Each of 0x7E, 0x7D, 0x11 and 0x13 becomes `0x7D, byte ^ 0x20`.
pub fn escape_frame(raw: &[u8]) -> BytesMut {
    let mut out = BytesMut::with_capacity(raw.len() + raw.len() / 8 + 1);
    if let Some((first, rest)) = raw.split_first() {
        out.put_u8(*first);
        for &b in rest {
            if needs_escape(b) {
                out.put_u8(ESCAPE);
                out.put_u8(b ^ ESCAPE_XOR);
            } else {
                out.put_u8(b);
            }
        }
    }
    out
}

/// Configuration for frame reading and writing.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Receive capacity in data bytes. Default: 110.
    pub max_frame_data: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
    /// Escape control bytes in outgoing frames. Default: false.
    pub escape_outgoing: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_data: MAX_FRAME_DATA_SIZE,
            read_timeout: None,
            write_timeout: None,
            escape_outgoing: false,
        }
    }
}

/// Position of the parser inside the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Discarding bytes until a start byte.
    WaitStart,
    /// Next byte is the length MSB.
    LengthHigh,
    /// Next byte is the length LSB.
    LengthLow,
    /// Next byte is the api id.
    ApiId,
    /// Collecting data bytes; the last one is the checksum.
    Payload,
}

/// Incremental, resumable API frame parser.
///
/// Bytes may be supplied in any chunking; scan position, escape state and the
/// running checksum persist between calls, so a frame split across many
/// reads parses exactly like one delivered at once. One frame's state is held
/// at a time and each completed frame gets its own buffer.
///
/// The parser is not reentrant: exactly one owner feeds it.
#[derive(Debug)]
pub struct FrameParser {
    state: ParseState,
    escaped: bool,
    length: u16,
    api_id: u8,
    sum: u8,
    data: BytesMut,
    max_frame_data: usize,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a parser with the default capacity.
    pub fn new() -> Self {
        Self::with_max_frame_data(MAX_FRAME_DATA_SIZE)
    }

    /// Create a parser that rejects frames with more than `max_frame_data` data bytes.
    pub fn with_max_frame_data(max_frame_data: usize) -> Self {
        Self {
            state: ParseState::WaitStart,
            escaped: false,
            length: 0,
            api_id: 0,
            sum: 0,
            data: BytesMut::with_capacity(max_frame_data),
            max_frame_data,
        }
    }

    /// Current scan state.
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Returns true between frames.
    pub fn is_idle(&self) -> bool {
        self.state == ParseState::WaitStart
    }

    /// Returns true while an escape marker waits for its byte.
    pub fn escape_pending(&self) -> bool {
        self.escaped
    }

    /// Receive capacity in data bytes.
    pub fn max_frame_data(&self) -> usize {
        self.max_frame_data
    }

    /// Update the receive capacity. Takes effect for the next data byte.
    pub fn set_max_frame_data(&mut self, max_frame_data: usize) {
        self.max_frame_data = max_frame_data;
    }

    /// Drop any partial frame and wait for the next start byte.
    pub fn reset(&mut self) {
        self.state = ParseState::WaitStart;
        self.escaped = false;
        self.length = 0;
        self.api_id = 0;
        self.sum = 0;
        self.data.clear();
    }

    /// Consume bytes from `src` until one frame completes, one error occurs,
    /// or `src` runs dry.
    ///
    /// Returns `Ok(None)` when more data is needed. Bytes after the outcome
    /// stay in `src`. A start byte that interrupts a frame is left in `src`
    /// so the next call begins a new frame with it.
    pub fn decode(&mut self, src: &mut BytesMut) -> std::result::Result<Option<ApiFrame>, ParseError> {
        while let Some(&raw) = src.first() {
            if raw == START_BYTE && !self.is_idle() {
                trace!(state = ?self.state, "start byte inside frame");
                self.reset();
                return Err(ParseError::UnexpectedStartByte);
            }
            src.advance(1);
            if let Some(outcome) = self.push(raw) {
                return outcome.map(Some);
            }
        }
        Ok(None)
    }

    /// Iterate over every outcome available from `src`.
    ///
    /// Ends when `src` holds no further complete outcome; call again after
    /// appending more bytes.
    pub fn outcomes<'a>(&'a mut self, src: &'a mut BytesMut) -> Outcomes<'a> {
        Outcomes { parser: self, src }
    }

    fn push(&mut self, raw: u8) -> Option<std::result::Result<ApiFrame, ParseError>> {
        if self.state == ParseState::WaitStart {
            if raw == START_BYTE {
                self.state = ParseState::LengthHigh;
            }
            return None;
        }

        if raw == ESCAPE && !self.escaped {
            self.escaped = true;
            return None;
        }
        let b = if self.escaped {
            self.escaped = false;
            raw ^ ESCAPE_XOR
        } else {
            raw
        };

        match self.state {
            ParseState::WaitStart => None,
            ParseState::LengthHigh => {
                self.length = u16::from(b) << 8;
                self.state = ParseState::LengthLow;
                None
            }
            ParseState::LengthLow => {
                self.length |= u16::from(b);
                if self.length == 0 {
                    self.reset();
                    return Some(Err(ParseError::EmptyFrame));
                }
                self.state = ParseState::ApiId;
                None
            }
            ParseState::ApiId => {
                self.api_id = b;
                self.sum = b;
                self.state = ParseState::Payload;
                None
            }
            ParseState::Payload => {
                self.sum = self.sum.wrapping_add(b);
                if self.data.len() == usize::from(self.length) - 1 {
                    return Some(self.finish());
                }
                if self.data.len() >= self.max_frame_data {
                    let max = self.max_frame_data;
                    self.reset();
                    return Some(Err(ParseError::PacketExceedsMaxSize { max }));
                }
                self.data.put_u8(b);
                None
            }
        }
    }

    fn finish(&mut self) -> std::result::Result<ApiFrame, ParseError> {
        let api_id = self.api_id;
        let sum = self.sum;
        let data = self.data.split().freeze();
        self.reset();

        if sum == CHECKSUM_TARGET {
            trace!(api_id, len = data.len(), "frame complete");
            Ok(ApiFrame { api_id, data })
        } else {
            Err(ParseError::ChecksumFailure {
                api_id,
                frame_data_len: data.len(),
                sum,
            })
        }
    }
}

/// Outcomes drawn from a byte buffer; see [`FrameParser::outcomes`].
pub struct Outcomes<'a> {
    parser: &'a mut FrameParser,
    src: &'a mut BytesMut,
}

impl Iterator for Outcomes<'_> {
    type Item = std::result::Result<ApiFrame, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.parser.decode(self.src).transpose()
    }
}
