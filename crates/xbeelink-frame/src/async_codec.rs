//! `tokio_util` codec for use with `FramedRead` / `FramedWrite`.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{escape_frame, ApiFrame, FrameParser, MAX_FRAME_DATA_SIZE};
use crate::error::{FrameError, ParseError, Result};
use crate::request::Request;

/// Frame codec for async byte streams.
///
/// Each decoded item is itself a `Result` so a bad frame is reported and the
/// stream keeps going. Only I/O failures end the stream.
#[derive(Debug)]
pub struct XBeeCodec {
    parser: FrameParser,
    escape_outgoing: bool,
}

impl Default for XBeeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl XBeeCodec {
    pub fn new() -> Self {
        Self::with_max_frame_data(MAX_FRAME_DATA_SIZE)
    }

    pub fn with_max_frame_data(max_frame_data: usize) -> Self {
        Self {
            parser: FrameParser::with_max_frame_data(max_frame_data),
            escape_outgoing: false,
        }
    }

    /// Escape control bytes in encoded requests.
    pub fn escape_outgoing(mut self, escape: bool) -> Self {
        self.escape_outgoing = escape;
        self
    }
}

impl Decoder for XBeeCodec {
    type Item = std::result::Result<ApiFrame, ParseError>;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        Ok(self.parser.decode(src).transpose())
    }
}

impl<'a> Encoder<&'a Request> for XBeeCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &'a Request, dst: &mut BytesMut) -> Result<()> {
        if self.escape_outgoing {
            let mut raw = BytesMut::with_capacity(item.frame_data_len() + 4);
            item.encode(&mut raw)?;
            dst.extend_from_slice(&escape_frame(&raw));
            Ok(())
        } else {
            item.encode(dst)
        }
    }
}
