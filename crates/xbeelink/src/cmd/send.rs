use std::io::Read;
use std::time::{Duration, Instant};

use tracing::{debug, info};
use xbeelink_bridge::{Bridge, BridgeEvent};
use xbeelink_frame::{
    CancellationToken, DeliveryStatus, FrameError, FrameReader, FrameWriter, Response,
    MAX_FRAME_DATA_SIZE,
};

use crate::cmd::{frame_config, parse_duration, SendArgs};
use crate::exit::{bridge_error, frame_error, transport_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_event, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let mut bridge = Bridge::new(args.bridge.config());
    let request = bridge
        .command_request(&args.topic, &args.json)
        .map_err(|err| bridge_error("invalid command", err))?;

    let link = args.serial.open()?;
    let read_half = link
        .try_clone()
        .map_err(|err| transport_error("link clone failed", err))?;
    let config = frame_config(MAX_FRAME_DATA_SIZE, args.escape);

    let mut writer = FrameWriter::with_config_link(link, config.clone())
        .map_err(|err| frame_error("link setup failed", err))?;
    writer
        .send(&request)
        .map_err(|err| frame_error("send failed", err))?;
    info!(topic = %args.topic, frame_id = request.frame_id(), "command sent");

    if !args.wait {
        return Ok(SUCCESS);
    }

    let mut reader = FrameReader::with_config_link(read_half, config)
        .map_err(|err| frame_error("link setup failed", err))?;
    let status = wait_for_delivery(
        &mut reader,
        request.frame_id(),
        wait_timeout,
        &CancellationToken::new(),
    )
    .map_err(|err| frame_error("waiting for delivery status", err))?;

    print_event(
        &BridgeEvent::Delivery {
            frame_id: request.frame_id(),
            status,
        },
        format,
    );
    Ok(if status.is_success() { SUCCESS } else { FAILURE })
}

/// Read until the delivery status for `frame_id` arrives.
///
/// Unrelated and malformed frames are skipped. The timeout covers the whole wait.
fn wait_for_delivery<R: Read>(
    reader: &mut FrameReader<R>,
    frame_id: u8,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<DeliveryStatus, FrameError> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(FrameError::Timeout(timeout));
        }
        let frame = match reader.read_frame_timeout(remaining, cancel) {
            Ok(frame) => frame,
            Err(FrameError::Parse(err)) => {
                debug!(error = %err, "skipping frame");
                continue;
            }
            Err(FrameError::Timeout(_)) => return Err(FrameError::Timeout(timeout)),
            Err(err) => return Err(err),
        };
        match Response::from_frame(frame) {
            Ok(Response::ZbTxStatus(status)) if status.frame_id() == frame_id => {
                return Ok(status.delivery_status());
            }
            Ok(other) => debug!(api_id = other.api_id(), "skipping unrelated response"),
            Err(err) => debug!(error = %err, "skipping frame"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;
    use xbeelink_frame::encode_frame;

    use super::*;

    fn wire(api_id: u8, data: &[u8]) -> Vec<u8> {
        let mut raw = BytesMut::new();
        encode_frame(api_id, data, &mut raw).unwrap();
        raw.to_vec()
    }

    #[test]
    fn waits_for_matching_frame_id() {
        let mut bytes = wire(0x8A, &[0x02]);
        bytes.extend(wire(0x8B, &[0x04, 0xFF, 0xFE, 0x00, 0x00, 0x00]));
        bytes.extend([0x7E, 0x00, 0x01, 0x8B, 0x00]); // bad checksum
        bytes.extend(wire(0x8B, &[0x05, 0x12, 0x34, 0x02, 0x21, 0x00]));

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let status = wait_for_delivery(
            &mut reader,
            5,
            Duration::from_secs(1),
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(status, DeliveryStatus::NetworkAckFailure);
        assert!(!status.is_success());
    }

    #[test]
    fn missing_status_ends_with_closed_link() {
        let mut reader = FrameReader::new(Cursor::new(wire(0x8A, &[0x00])));
        let err = wait_for_delivery(
            &mut reader,
            1,
            Duration::from_secs(1),
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn written_command_reads_back() {
        let request = Bridge::default()
            .command_request(
                "/cmd/TankWaterer/0013A2004127CE89/SetValve",
                r#"{"ValveOpen":true}"#,
            )
            .unwrap();
        let mut writer = FrameWriter::new(Vec::new());
        writer.send(&request).unwrap();

        let mut reader = FrameReader::new(Cursor::new(writer.into_inner()));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.api_id, request.api_id());
        assert_eq!(frame.data[0], request.frame_id());
        assert!(frame.data.ends_with(request.payload()));
    }

    struct Silent;

    impl Read for Silent {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::WouldBlock.into())
        }
    }

    #[test]
    fn silent_link_times_out() {
        let mut reader = FrameReader::new(Silent);
        let err = wait_for_delivery(
            &mut reader,
            1,
            Duration::from_millis(30),
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, FrameError::Timeout(d) if d == Duration::from_millis(30)));
    }
}
