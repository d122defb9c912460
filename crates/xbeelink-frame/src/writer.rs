use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::debug;
use xbeelink_transport::RadioLink;

use crate::api::api_name;
use crate::codec::{escape_frame, ApiFrame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;
use crate::request::Request;

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Writes API frames to any `Write` sink.
///
/// Rendering is stateless per call. Outgoing control bytes are escaped only
/// when [`FrameConfig::escape_outgoing`] is set.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Serialize and send one request (blocking).
    pub fn send(&mut self, request: &Request) -> Result<()> {
        self.buf.clear();
        request.encode(&mut self.buf)?;
        debug!(
            api = api_name(request.api_id()),
            frame_id = request.frame_id(),
            len = request.frame_data_len(),
            "sending request"
        );
        self.write_buffered()
    }

    /// Send an already-built frame (blocking).
    pub fn write_frame(&mut self, frame: &ApiFrame) -> Result<()> {
        self.buf.clear();
        frame.encode(&mut self.buf)?;
        self.write_buffered()
    }

    fn write_buffered(&mut self) -> Result<()> {
        if self.config.escape_outgoing {
            self.buf = escape_frame(&self.buf);
        }

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Turn outgoing escaping on or off.
    pub fn set_escape_outgoing(&mut self, escape: bool) {
        self.config.escape_outgoing = escape;
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<RadioLink> {
    /// Create a frame writer for a `RadioLink` and apply the write timeout from config.
    pub fn with_config_link(mut inner: RadioLink, config: FrameConfig) -> Result<Self> {
        if let Some(timeout) = config.write_timeout {
            inner.set_timeout(timeout).map_err(transport_to_frame_error)?;
        }
        Ok(Self::with_config(inner, config))
    }
}
