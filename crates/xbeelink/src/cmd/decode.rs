use std::io::Read;

use bytes::BytesMut;
use tracing::warn;
use xbeelink_bridge::Bridge;
use xbeelink_frame::{ApiFrame, FrameParser, ParseError, Response};

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{io_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_event, print_outcome, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let text = match args.hex {
        Some(text) => text,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| io_error("failed reading stdin", err))?;
            text
        }
    };
    let bytes = parse_hex(&text)?;

    let bridge = args.bridge.then(Bridge::default);
    let summary = decode_stream(&bytes, args.max_frame_data, |outcome| {
        print_outcome(outcome, format);
        if let (Some(bridge), Ok(frame)) = (&bridge, outcome) {
            match Response::from_frame(frame.clone()) {
                Ok(response) => print_event(&bridge.handle_response(&response), format),
                Err(err) => warn!(error = %err, "frame not classified"),
            }
        }
    });

    if summary.truncated {
        warn!("input ends inside a frame");
    }
    Ok(if summary.errors == 0 && !summary.truncated {
        SUCCESS
    } else {
        DATA_INVALID
    })
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    frames: usize,
    errors: usize,
    /// The input stopped partway through a frame.
    truncated: bool,
}

fn decode_stream(
    bytes: &[u8],
    max_frame_data: usize,
    mut emit: impl FnMut(&Result<ApiFrame, ParseError>),
) -> Summary {
    let mut parser = FrameParser::with_max_frame_data(max_frame_data);
    let mut buf = BytesMut::from(bytes);
    let mut summary = Summary::default();
    for outcome in parser.outcomes(&mut buf) {
        match &outcome {
            Ok(_) => summary.frames += 1,
            Err(_) => summary.errors += 1,
        }
        emit(&outcome);
    }
    summary.truncated = !parser.is_idle();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_every_outcome() {
        // modem status, garbage, bad checksum, then a local AT response
        let input = parse_hex(
            "7E 00 02 8A 02 73  55 AA  7E 00 02 8A 02 00  7E 00 05 88 01 4E 49 00 DF",
        )
        .unwrap();
        let mut seen = Vec::new();
        let summary = decode_stream(&input, 110, |outcome| seen.push(outcome.clone()));

        assert_eq!(
            summary,
            Summary {
                frames: 2,
                errors: 1,
                truncated: false
            }
        );
        assert_eq!(seen[0], Ok(ApiFrame::new(0x8A, vec![0x02])));
        assert!(matches!(seen[1], Err(ParseError::ChecksumFailure { .. })));
        assert_eq!(seen[2].as_ref().map(|f| f.api_id), Ok(0x88));
    }

    #[test]
    fn flags_truncated_input() {
        let input = parse_hex("7E 00 05 88 01").unwrap();
        let summary = decode_stream(&input, 110, |_| {});
        assert_eq!(summary.frames, 0);
        assert!(summary.truncated);
    }

    #[test]
    fn capacity_limit_is_an_error() {
        let input = parse_hex("7E 00 04 90 01 02 03 00").unwrap();
        let mut seen = Vec::new();
        decode_stream(&input, 2, |outcome| seen.push(outcome.clone()));
        assert_eq!(seen[0], Err(ParseError::PacketExceedsMaxSize { max: 2 }));
    }
}
