use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

use bytes::BytesMut;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use xbeelink_transport::RadioLink;

use crate::codec::{ApiFrame, FrameConfig, FrameParser};
use crate::error::{FrameError, Result};
use crate::response::Response;

const INITIAL_BUFFER_CAPACITY: usize = 512;
const READ_CHUNK_SIZE: usize = 256;
/// Back-off between polls of a source that reported `WouldBlock`.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Result of one poll of the byte source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete, checksum-verified frame.
    Frame(ApiFrame),
    /// No complete frame yet. Partial state is kept for the next poll.
    Pending,
}

/// Reads API frames from any `Read` source.
///
/// Partial reads, escapes and resynchronization are handled internally; a
/// frame split across many reads is assembled exactly as if it arrived at
/// once. Parse errors surface as [`FrameError::Parse`] and leave the reader
/// ready for the next frame.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    parser: FrameParser,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            parser: FrameParser::with_max_frame_data(config.max_frame_data),
            config,
        }
    }

    /// Parse what is buffered, reading from the source at most once.
    ///
    /// Never waits beyond a single `read` call. A source that times out or
    /// would block yields [`ReadOutcome::Pending`].
    pub fn poll_frame(&mut self) -> Result<ReadOutcome> {
        if let Some(frame) = self.parser.decode(&mut self.buf)? {
            return Ok(ReadOutcome::Frame(frame));
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let read = match self.inner.read(&mut chunk) {
            Ok(n) => n,
            Err(err) if is_transient(err.kind()) => return Ok(ReadOutcome::Pending),
            Err(err) => return Err(FrameError::Io(err)),
        };

        if read == 0 {
            if !self.parser.is_idle() {
                debug!(state = ?self.parser.state(), "link closed mid-frame");
            }
            return Err(FrameError::ConnectionClosed);
        }
        trace!(read, "bytes received");
        self.buf.extend_from_slice(&chunk[..read]);

        match self.parser.decode(&mut self.buf)? {
            Some(frame) => Ok(ReadOutcome::Frame(frame)),
            None => Ok(ReadOutcome::Pending),
        }
    }

    /// Read the next frame, waiting as long as it takes.
    ///
    /// There is no progress guarantee if the source stalls; prefer
    /// [`read_frame_timeout`](Self::read_frame_timeout).
    pub fn read_frame(&mut self) -> Result<ApiFrame> {
        loop {
            match self.poll_frame()? {
                ReadOutcome::Frame(frame) => return Ok(frame),
                ReadOutcome::Pending => continue,
            }
        }
    }

    /// Read the next frame, giving up after `timeout` or when `cancel` fires.
    ///
    /// Expiry returns [`FrameError::Timeout`] without dropping a partially
    /// received frame; the next call resumes it. The token is checked before
    /// every poll.
    pub fn read_frame_timeout(
        &mut self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ApiFrame> {
        let deadline = Instant::now() + timeout;
        loop {
            if cancel.is_cancelled() {
                return Err(FrameError::Cancelled);
            }
            match self.poll_frame()? {
                ReadOutcome::Frame(frame) => return Ok(frame),
                ReadOutcome::Pending => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(FrameError::Timeout(timeout));
                    }
                    if self.buf.is_empty() {
                        std::thread::sleep(IDLE_POLL_INTERVAL.min(deadline - now));
                    }
                }
            }
        }
    }

    /// Read and classify the next frame.
    pub fn read_response(&mut self) -> Result<Response> {
        Response::from_frame(self.read_frame()?)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// The frame parser, for inspecting scan state.
    pub fn parser(&self) -> &FrameParser {
        &self.parser
    }

    /// Update the receive capacity for subsequent frames.
    pub fn set_max_frame_data(&mut self, max_frame_data: usize) {
        self.config.max_frame_data = max_frame_data;
        self.parser.set_max_frame_data(max_frame_data);
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<RadioLink> {
    /// Create a frame reader for a `RadioLink` and apply the read timeout from config.
    pub fn with_config_link(mut inner: RadioLink, config: FrameConfig) -> Result<Self> {
        if let Some(timeout) = config.read_timeout {
            inner.set_timeout(timeout).map_err(transport_to_frame_error)?;
        }
        Ok(Self::with_config(inner, config))
    }
}

fn is_transient(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
    )
}

pub(crate) fn transport_to_frame_error(err: xbeelink_transport::TransportError) -> FrameError {
    match err {
        xbeelink_transport::TransportError::Io(io) => FrameError::Io(io),
        xbeelink_transport::TransportError::OpenCapture { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::codec::tests::{wire, SCENARIO_A_DATA};
    use crate::error::ParseError;
    use crate::request::{Request, ZbTxRequest};
    use crate::Address64;

    #[test]
    fn read_single_frame() {
        let mut reader = FrameReader::new(Cursor::new(wire(0x90, &SCENARIO_A_DATA)));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.api_id, 0x90);
        assert_eq!(frame.data.as_ref(), &SCENARIO_A_DATA);
    }

    #[test]
    fn read_multiple_frames() {
        let mut bytes = wire(0x8A, &[0x00]);
        bytes.extend(wire(0x8A, &[0x02]));
        bytes.extend(wire(0x8B, &[0x01, 0xFF, 0xFE, 0x00, 0x00, 0x00]));

        let mut reader = FrameReader::new(Cursor::new(bytes));

        let f1 = reader.read_frame().unwrap();
        let f2 = reader.read_frame().unwrap();
        let f3 = reader.read_response().unwrap();

        assert_eq!(f1.data.as_ref(), &[0x00]);
        assert_eq!(f2.data.as_ref(), &[0x02]);
        assert_eq!(f3.frame_id(), Some(1));
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: wire(0x90, &SCENARIO_A_DATA),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.data.as_ref(), &SCENARIO_A_DATA);
    }

    #[test]
    fn poll_reports_pending_until_complete() {
        let bytes = wire(0x8A, &[0x06]);
        let mut reader = FrameReader::new(ByteByByteReader { bytes, pos: 0 });

        let mut pending = 0;
        let frame = loop {
            match reader.poll_frame().unwrap() {
                ReadOutcome::Frame(frame) => break frame,
                ReadOutcome::Pending => pending += 1,
            }
        };
        assert_eq!(pending, 5);
        assert_eq!(frame.data.as_ref(), &[0x06]);
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let bytes = wire(0x90, &SCENARIO_A_DATA);
        let mut reader = FrameReader::new(Cursor::new(bytes[..8].to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
        assert!(!reader.parser().is_idle());
    }

    #[test]
    fn checksum_failure_then_recovery() {
        let mut bad = wire(0x8A, &[0x00]);
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;
        bad.extend(wire(0x8A, &[0x01]));

        let mut reader = FrameReader::new(Cursor::new(bad));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Parse(ParseError::ChecksumFailure { api_id: 0x8A, .. })
        ));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.data.as_ref(), &[0x01]);
    }

    #[test]
    fn oversized_frame_in_stream() {
        let cfg = FrameConfig {
            max_frame_data: 4,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(Cursor::new(wire(0x90, &[0; 8])), cfg);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Parse(ParseError::PacketExceedsMaxSize { max: 4 })
        ));
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            if buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    fn escaping_writer<W: std::io::Write>(inner: W) -> crate::writer::FrameWriter<W> {
        let cfg = FrameConfig {
            escape_outgoing: true,
            ..FrameConfig::default()
        };
        crate::writer::FrameWriter::with_config(inner, cfg)
    }

    #[test]
    fn roundtrip_over_pipe() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = escaping_writer(left);
        let mut reader = FrameReader::new(right);

        let req: Request = ZbTxRequest::new(Address64::new(0x0013_A200_4127_CE89), b"ping".to_vec())
            .with_frame_id(3)
            .into();
        writer.send(&req).unwrap();
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.api_id, 0x10);
        assert_eq!(frame.frame_id(), Some(3));
        assert!(frame.data.ends_with(b"ping"));
    }

    #[test]
    fn concurrent_reader_writer_threads() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = escaping_writer(left);
        let reader = FrameReader::new(right);
        let reader = Arc::new(Mutex::new(reader));

        let reader_thread = {
            let reader = Arc::clone(&reader);
            std::thread::spawn(move || {
                for expected in 1..=64u8 {
                    let frame = reader.lock().unwrap().read_frame().unwrap();
                    assert_eq!(frame.frame_id(), Some(expected));
                    assert_eq!(&frame.data[13..], format!("msg-{expected}").as_bytes());
                }
            })
        };

        for i in 1..=64u8 {
            let req: Request = ZbTxRequest::new(Address64::new(u64::from(i)), format!("msg-{i}").into_bytes())
                .with_frame_id(i)
                .into();
            writer.send(&req).unwrap();
        }

        reader_thread.join().unwrap();
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = FrameReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        reader.set_max_frame_data(32);
        assert_eq!(reader.config().max_frame_data, 32);
        assert_eq!(reader.parser().max_frame_data(), 32);
        let _inner = reader.into_inner();
    }

    #[test]
    fn would_block_is_pending() {
        let reader = WouldBlockThenData {
            state: 0,
            bytes: wire(0x8A, &[0x01]),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        assert_eq!(framed.poll_frame().unwrap(), ReadOutcome::Pending);
        let frame = framed.read_frame().unwrap();
        assert_eq!(frame.data.as_ref(), &[0x01]);
    }

    struct WouldBlockThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for WouldBlockThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            state: 0,
            bytes: wire(0x8A, &[0x03]),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let frame = framed.read_frame().unwrap();

        assert_eq!(frame.api_id, 0x8A);
        assert_eq!(frame.data.as_ref(), &[0x03]);
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    /// Feeds `bytes` in the order given, then reports `WouldBlock` forever.
    struct StallingReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for StallingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn timeout_keeps_partial_frame() {
        let bytes = wire(0x90, &SCENARIO_A_DATA);
        let (head, tail) = bytes.split_at(7);
        let mut reader = FrameReader::new(StallingReader {
            bytes: head.to_vec(),
            pos: 0,
        });
        let token = CancellationToken::new();

        let err = reader
            .read_frame_timeout(Duration::from_millis(20), &token)
            .unwrap_err();
        assert!(matches!(err, FrameError::Timeout(_)));
        assert!(!reader.parser().is_idle());

        reader.get_mut().bytes.extend_from_slice(tail);
        let frame = reader
            .read_frame_timeout(Duration::from_millis(200), &token)
            .unwrap();
        assert_eq!(frame.data.as_ref(), &SCENARIO_A_DATA);
    }

    #[test]
    fn cancelled_token_stops_read() {
        let mut reader = FrameReader::new(StallingReader {
            bytes: Vec::new(),
            pos: 0,
        });
        let token = CancellationToken::new();
        token.cancel();

        let err = reader
            .read_frame_timeout(Duration::from_secs(5), &token)
            .unwrap_err();
        assert!(matches!(err, FrameError::Cancelled));
    }

    #[test]
    fn cancel_from_another_thread() {
        let mut reader = FrameReader::new(StallingReader {
            bytes: Vec::new(),
            pos: 0,
        });
        let token = CancellationToken::new();
        let remote = token.clone();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });

        let err = reader
            .read_frame_timeout(Duration::from_secs(10), &token)
            .unwrap_err();
        assert!(matches!(err, FrameError::Cancelled));
        canceller.join().unwrap();
    }

    #[test]
    fn capture_link_replays_frames() {
        let path = std::env::temp_dir().join(format!(
            "xbeelink-frame-capture-{}.bin",
            std::process::id()
        ));
        std::fs::write(&path, wire(0x90, &SCENARIO_A_DATA)).unwrap();

        let link = RadioLink::open_capture(&path).unwrap();
        let cfg = FrameConfig {
            read_timeout: Some(Duration::from_millis(10)),
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config_link(link, cfg).unwrap();
        let response = reader.read_response().unwrap();
        assert!(matches!(response, Response::ZbRx(_)));
        assert!(matches!(
            reader.read_frame().unwrap_err(),
            FrameError::ConnectionClosed
        ));
        let _ = std::fs::remove_file(&path);
    }
}
