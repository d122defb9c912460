use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};

/// A connected byte link to a radio. Implements `Read` and `Write`.
///
/// This is the fundamental I/O type handed to the frame reader and writer.
/// A serial link carries live traffic in both directions. A capture link
/// replays a recorded receive stream and refuses writes.
pub struct RadioLink {
    inner: RadioLinkInner,
}

enum RadioLinkInner {
    Serial(Box<dyn serialport::SerialPort>),
    Capture(File),
}

impl Read for RadioLink {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            RadioLinkInner::Serial(port) => port.read(buf),
            RadioLinkInner::Capture(file) => file.read(buf),
        }
    }
}

impl Write for RadioLink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            RadioLinkInner::Serial(port) => port.write(buf),
            RadioLinkInner::Capture(_) => Err(std::io::Error::new(
                ErrorKind::Unsupported,
                "capture links are read-only",
            )),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            RadioLinkInner::Serial(port) => port.flush(),
            RadioLinkInner::Capture(_) => Ok(()),
        }
    }
}

impl RadioLink {
    pub(crate) fn from_serial(port: Box<dyn serialport::SerialPort>) -> Self {
        Self {
            inner: RadioLinkInner::Serial(port),
        }
    }

    /// Open a recorded byte stream for replay.
    pub fn open_capture(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TransportError::OpenCapture {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "capture opened");
        Ok(Self {
            inner: RadioLinkInner::Capture(file),
        })
    }

    /// Returns true for a live serial link.
    pub fn is_serial(&self) -> bool {
        matches!(self.inner, RadioLinkInner::Serial(_))
    }

    /// Set the timeout of each blocking read/write on a serial link.
    ///
    /// Capture files never block, so this is a no-op for them.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        match &mut self.inner {
            RadioLinkInner::Serial(port) => port.set_timeout(timeout).map_err(Into::into),
            RadioLinkInner::Capture(_) => Ok(()),
        }
    }

    /// Try to clone this link so reading and writing can live on different owners.
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            RadioLinkInner::Serial(port) => Ok(Self::from_serial(port.try_clone()?)),
            RadioLinkInner::Capture(file) => Ok(Self {
                inner: RadioLinkInner::Capture(file.try_clone()?),
            }),
        }
    }
}

impl std::fmt::Debug for RadioLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            RadioLinkInner::Serial(port) => f
                .debug_struct("RadioLink")
                .field("type", &"serial")
                .field("name", &port.name())
                .finish(),
            RadioLinkInner::Capture(_) => f
                .debug_struct("RadioLink")
                .field("type", &"capture")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture_with(tag: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "xbeelink-capture-{tag}-{}.bin",
            std::process::id()
        ));
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn capture_replays_bytes() {
        let path = capture_with("replay", &[0x7E, 0x00, 0x02, 0x8A, 0x00, 0x75]);
        let mut link = RadioLink::open_capture(&path).unwrap();
        assert!(!link.is_serial());

        let mut out = Vec::new();
        link.read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![0x7E, 0x00, 0x02, 0x8A, 0x00, 0x75]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn capture_rejects_writes() {
        let path = capture_with("readonly", &[]);
        let mut link = RadioLink::open_capture(&path).unwrap();
        let err = link.write(&[0x7E]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(link.flush().is_ok());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn capture_clone_and_timeout() {
        let path = capture_with("clone", &[1, 2, 3]);
        let mut link = RadioLink::open_capture(&path).unwrap();
        assert!(link.set_timeout(Duration::from_millis(5)).is_ok());
        let clone = link.try_clone().unwrap();
        assert!(format!("{clone:?}").contains("capture"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_capture_reports_path() {
        let err = RadioLink::open_capture("/nonexistent/xbeelink.bin").unwrap_err();
        match err {
            TransportError::OpenCapture { path, .. } => {
                assert!(path.ends_with("xbeelink.bin"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
