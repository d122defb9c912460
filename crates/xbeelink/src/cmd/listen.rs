use std::io::Read;
use std::time::Duration;

use tracing::{info, warn};
use xbeelink_bridge::{Bridge, BridgeEvent};
use xbeelink_frame::{CancellationToken, FrameError, FrameReader, Response};
use xbeelink_transport::RadioLink;

use crate::cmd::{frame_config, parse_duration, ListenArgs};
use crate::exit::{frame_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_event, OutputFormat};

/// How long one bounded read waits before checking for Ctrl-C again.
const POLL_WINDOW: Duration = Duration::from_millis(500);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = args.timeout.as_deref().map(parse_duration).transpose()?;
    let link = match &args.capture {
        Some(path) => {
            RadioLink::open_capture(path).map_err(|err| transport_error("open failed", err))?
        }
        None => args.serial.open()?,
    };
    let replay = !link.is_serial();
    let mut reader = FrameReader::with_config_link(link, frame_config(args.max_frame_data, false))
        .map_err(|err| frame_error("link setup failed", err))?;

    let cancel = CancellationToken::new();
    install_ctrlc_handler(cancel.clone())?;

    let bridge = Bridge::new(args.bridge.config());
    let mut listener = Listener {
        bridge: &bridge,
        count: args.count,
        timeout,
        printed: 0,
    };
    match listener.run(&mut reader, &cancel, |event| print_event(event, format)) {
        Err(FrameError::ConnectionClosed) if replay => {
            info!(events = listener.printed, "capture replayed");
            Ok(SUCCESS)
        }
        Err(FrameError::Cancelled) => Ok(SUCCESS),
        Err(err) => Err(frame_error("receive failed", err)),
        Ok(()) => Ok(SUCCESS),
    }
}

struct Listener<'a> {
    bridge: &'a Bridge,
    count: Option<usize>,
    timeout: Option<Duration>,
    printed: usize,
}

impl Listener<'_> {
    /// Map frames through the bridge until the count is reached or reading fails.
    fn run<R: Read>(
        &mut self,
        reader: &mut FrameReader<R>,
        cancel: &CancellationToken,
        mut emit: impl FnMut(&BridgeEvent),
    ) -> Result<(), FrameError> {
        let window = self.timeout.unwrap_or(POLL_WINDOW);
        while self.count.is_none_or(|count| self.printed < count) {
            let frame = match reader.read_frame_timeout(window, cancel) {
                Ok(frame) => frame,
                Err(FrameError::Parse(err)) => {
                    warn!(error = %err, "discarding frame");
                    continue;
                }
                Err(FrameError::Timeout(_)) if self.timeout.is_none() => continue,
                Err(err) => return Err(err),
            };
            let response = match Response::from_frame(frame) {
                Ok(response) => response,
                Err(err) => {
                    warn!(error = %err, "discarding frame");
                    continue;
                }
            };
            emit(&self.bridge.handle_response(&response));
            self.printed += 1;
        }
        Ok(())
    }
}

fn install_ctrlc_handler(cancel: CancellationToken) -> CliResult<()> {
    ctrlc::set_handler(move || cancel.cancel())
        .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use xbeelink_frame::{encode_frame, escape_frame};

    use super::*;

    fn wire(api_id: u8, data: &[u8]) -> Vec<u8> {
        let mut raw = bytes::BytesMut::new();
        encode_frame(api_id, data, &mut raw).unwrap();
        escape_frame(&raw).to_vec()
    }

    fn manual_record() -> Vec<u8> {
        let mut data = 0x0013_A200_4127_CE89u64.to_be_bytes().to_vec();
        data.extend_from_slice(&[0xFF, 0xFE, 0x01, 2, 1]);
        data
    }

    #[test]
    fn maps_frames_and_skips_bad_ones() {
        let mut bytes = wire(0x90, &manual_record());
        bytes.extend(wire(0x90, &[0x00; 3])); // too short for a data frame
        bytes.extend([0x7E, 0x00, 0x02, 0x8A, 0x02, 0x00]); // bad checksum
        bytes.extend(wire(0x8A, &[0x02]));

        let bridge = Bridge::default();
        let mut listener = Listener {
            bridge: &bridge,
            count: None,
            timeout: Some(Duration::from_millis(50)),
            printed: 0,
        };
        let mut reader = FrameReader::new(Cursor::new(bytes));
        let mut events = Vec::new();
        let result = listener.run(&mut reader, &CancellationToken::new(), |event| {
            events.push(event.clone())
        });

        assert!(matches!(result, Err(FrameError::ConnectionClosed)));
        assert_eq!(events.len(), 2);
        let BridgeEvent::Publish(publication) = &events[0] else {
            panic!("expected a publication");
        };
        assert_eq!(publication.topic, "/tele/TankWaterer/0013A2004127CE89/manual");
        assert!(matches!(events[1], BridgeEvent::Modem(_)));
    }

    #[test]
    fn stops_after_count() {
        let mut bytes = wire(0x8A, &[0x00]);
        bytes.extend(wire(0x8A, &[0x01]));
        let bridge = Bridge::default();
        let mut listener = Listener {
            bridge: &bridge,
            count: Some(1),
            timeout: None,
            printed: 0,
        };
        let mut reader = FrameReader::new(Cursor::new(bytes));
        let mut seen = 0;
        listener
            .run(&mut reader, &CancellationToken::new(), |_| seen += 1)
            .unwrap();
        assert_eq!(seen, 1);
    }

    #[test]
    fn cancelled_before_first_frame() {
        let bridge = Bridge::default();
        let mut listener = Listener {
            bridge: &bridge,
            count: None,
            timeout: None,
            printed: 0,
        };
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut reader = FrameReader::new(Cursor::new(wire(0x8A, &[0x00])));
        let result = listener.run(&mut reader, &cancel, |_| {});
        assert!(matches!(result, Err(FrameError::Cancelled)));
    }
}
