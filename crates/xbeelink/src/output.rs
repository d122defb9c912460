use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use xbeelink_bridge::BridgeEvent;
use xbeelink_frame::{api::api_name, ApiFrame, ParseError, Request, Response};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// `7E 00 02` style rendering.
pub fn spaced_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{byte:02X}"));
    }
    out
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn print_table(header: &[&str], row: Vec<String>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec())
        .add_row(row);
    println!("{table}");
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    kind: &'static str,
    api_id: u8,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame_id: Option<u8>,
    frame_data_len: usize,
    data: String,
}

#[derive(Serialize)]
struct ParseErrorOutput {
    kind: &'static str,
    error: String,
}

/// Print one outcome of an offline decode.
pub fn print_outcome(outcome: &Result<ApiFrame, ParseError>, format: OutputFormat) {
    let frame = match outcome {
        Ok(frame) => frame,
        Err(err) => {
            match format {
                OutputFormat::Json => print_json(&ParseErrorOutput {
                    kind: "parse_error",
                    error: err.to_string(),
                }),
                OutputFormat::Table => print_table(&["ERROR"], vec![err.to_string()]),
                OutputFormat::Pretty => println!("error: {err}"),
                // raw output carries frame data only
                OutputFormat::Raw => {}
            }
            return;
        }
    };

    let name = api_name(frame.api_id);
    match format {
        OutputFormat::Json => print_json(&FrameOutput {
            kind: "frame",
            api_id: frame.api_id,
            name,
            frame_id: Response::from_frame(frame.clone())
                .ok()
                .and_then(|response| response.frame_id()),
            frame_data_len: frame.frame_data_len(),
            data: hex::encode_upper(&frame.data),
        }),
        OutputFormat::Table => print_table(
            &["API ID", "NAME", "LEN", "DATA"],
            vec![
                format!("0x{:02X}", frame.api_id),
                name.to_string(),
                frame.frame_data_len().to_string(),
                spaced_hex(&frame.data),
            ],
        ),
        OutputFormat::Pretty => println!(
            "api_id=0x{:02X} ({}) len={} data={}",
            frame.api_id,
            name,
            frame.frame_data_len(),
            spaced_hex(&frame.data)
        ),
        OutputFormat::Raw => print_raw(&frame.data),
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EventOutput<'a> {
    Publish {
        topic: &'a str,
        payload: serde_json::Value,
        timestamp: String,
    },
    Delivery {
        frame_id: u8,
        status: u8,
        description: String,
        success: bool,
    },
    Modem {
        status: u8,
        description: String,
    },
    Ignored {
        api_id: u8,
        name: &'static str,
    },
    Rejected {
        reason: &'a str,
    },
}

impl<'a> From<&'a BridgeEvent> for EventOutput<'a> {
    fn from(event: &'a BridgeEvent) -> Self {
        match event {
            BridgeEvent::Publish(publication) => Self::Publish {
                topic: &publication.topic,
                payload: serde_json::from_str(&publication.payload)
                    .unwrap_or_else(|_| serde_json::Value::String(publication.payload.clone())),
                timestamp: now_unix_seconds(),
            },
            BridgeEvent::Delivery { frame_id, status } => Self::Delivery {
                frame_id: *frame_id,
                status: status.code(),
                description: status.to_string(),
                success: status.is_success(),
            },
            BridgeEvent::Modem(status) => Self::Modem {
                status: status.code(),
                description: status.to_string(),
            },
            BridgeEvent::Ignored { api_id } => Self::Ignored {
                api_id: *api_id,
                name: api_name(*api_id),
            },
            BridgeEvent::Rejected { reason } => Self::Rejected { reason },
        }
    }
}

/// Print what the bridge made of a received response.
pub fn print_event(event: &BridgeEvent, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&EventOutput::from(event)),
        OutputFormat::Table => {
            let (kind, detail) = match event {
                BridgeEvent::Publish(p) => ("publish", format!("{} {}", p.topic, p.payload)),
                BridgeEvent::Delivery { frame_id, status } => {
                    ("delivery", format!("frame {frame_id}: {status}"))
                }
                BridgeEvent::Modem(status) => ("modem", status.to_string()),
                BridgeEvent::Ignored { api_id } => {
                    ("ignored", format!("0x{api_id:02X} {}", api_name(*api_id)))
                }
                BridgeEvent::Rejected { reason } => ("rejected", reason.clone()),
            };
            print_table(&["EVENT", "DETAIL"], vec![kind.to_string(), detail]);
        }
        OutputFormat::Pretty => println!("{event}"),
        OutputFormat::Raw => {
            if let BridgeEvent::Publish(publication) = event {
                println!("{}", publication.payload);
            }
        }
    }
}

#[derive(Serialize)]
struct EncodedOutput {
    api_id: u8,
    name: &'static str,
    frame_id: u8,
    wire_len: usize,
    bytes: String,
}

/// Print the wire form of a request.
pub fn print_encoded(request: &Request, wire: &[u8], format: OutputFormat) {
    let name = api_name(request.api_id());
    match format {
        OutputFormat::Json => print_json(&EncodedOutput {
            api_id: request.api_id(),
            name,
            frame_id: request.frame_id(),
            wire_len: wire.len(),
            bytes: hex::encode_upper(wire),
        }),
        OutputFormat::Table => print_table(
            &["API ID", "NAME", "FRAME ID", "BYTES"],
            vec![
                format!("0x{:02X}", request.api_id()),
                name.to_string(),
                request.frame_id().to_string(),
                spaced_hex(wire),
            ],
        ),
        OutputFormat::Pretty => println!("{}", spaced_hex(wire)),
        OutputFormat::Raw => print_raw(wire),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
