use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use xbeelink_bridge::BridgeConfig;
use xbeelink_frame::{FrameConfig, MAX_FRAME_DATA_SIZE};
use xbeelink_transport::{RadioLink, SerialConfig, DEFAULT_BAUD_RATE};

use crate::exit::{transport_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read frames from the radio and print what the bridge makes of them.
    Listen(ListenArgs),
    /// Send a bus command to a device.
    Send(SendArgs),
    /// Parse a hex byte stream offline.
    Decode(DecodeArgs),
    /// Print the wire bytes of a request.
    #[command(subcommand)]
    Encode(EncodeCommand),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(command) => encode::run(command, format),
        Command::Version(args) => version::run(args),
    }
}

/// Serial port selection shared by commands that talk to a radio.
#[derive(Args, Debug)]
pub struct SerialArgs {
    /// Serial device of the radio.
    #[arg(long, env = "XBEELINK_PORT")]
    pub port: Option<String>,
    /// Line speed.
    #[arg(long, env = "XBEELINK_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
}

impl SerialArgs {
    pub fn open(&self) -> CliResult<RadioLink> {
        let path = self
            .port
            .as_deref()
            .ok_or_else(|| CliError::usage("--port (or XBEELINK_PORT) is required"))?;
        SerialConfig::new(path)
            .with_baud_rate(self.baud)
            .open()
            .map_err(|err| transport_error("open failed", err))
    }
}

/// Topic layout used when mapping frames to bus messages.
#[derive(Args, Debug)]
pub struct BridgeArgs {
    /// Prefix of published telemetry topics.
    #[arg(long, env = "XBEELINK_TELEMETRY_PREFIX", default_value = "/tele")]
    pub telemetry_prefix: String,
    /// Prefix of command topics.
    #[arg(long, env = "XBEELINK_COMMAND_PREFIX", default_value = "/cmd")]
    pub command_prefix: String,
    /// Device class accepted in command topics.
    #[arg(long, default_value = "TankWaterer")]
    pub device_class: String,
    /// Hop limit for transmissions.
    #[arg(long, default_value_t = 0)]
    pub radius: u8,
}

impl BridgeArgs {
    pub fn config(&self) -> BridgeConfig {
        BridgeConfig {
            telemetry_prefix: self.telemetry_prefix.clone(),
            command_prefix: self.command_prefix.clone(),
            device_class: self.device_class.clone(),
            default_radius: self.radius,
        }
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub serial: SerialArgs,
    /// Replay a recorded byte stream instead of opening a port.
    #[arg(long, value_name = "FILE", conflicts_with = "port")]
    pub capture: Option<PathBuf>,
    /// Exit after printing N events.
    #[arg(long)]
    pub count: Option<usize>,
    /// Fail if no frame arrives within this long (e.g. 30s, 500ms).
    #[arg(long)]
    pub timeout: Option<String>,
    /// Largest frame data accepted, after the api id.
    #[arg(long, default_value_t = MAX_FRAME_DATA_SIZE)]
    pub max_frame_data: usize,
    #[command(flatten)]
    pub bridge: BridgeArgs,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub serial: SerialArgs,
    /// Command topic, e.g. /cmd/TankWaterer/0013A2004127CE89/SetValve.
    pub topic: String,
    /// JSON command body.
    #[arg(long, default_value = "")]
    pub json: String,
    /// Escape control bytes (radio in API mode 2).
    #[arg(long)]
    pub escape: bool,
    /// Wait for the delivery status of the transmission.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the delivery status (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
    #[command(flatten)]
    pub bridge: BridgeArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Hex bytes; read from stdin when omitted. Whitespace, ':' and ',' are ignored.
    pub hex: Option<String>,
    /// Largest frame data accepted, after the api id.
    #[arg(long, default_value_t = MAX_FRAME_DATA_SIZE)]
    pub max_frame_data: usize,
    /// Also run received data frames through the bridge.
    #[arg(long)]
    pub bridge: bool,
}

#[derive(Subcommand, Debug)]
pub enum EncodeCommand {
    /// Local configuration command.
    At(AtArgs),
    /// Configuration command for a remote radio.
    RemoteAt(RemoteAtArgs),
    /// Extended data transmission.
    Tx(TxArgs),
    /// Bus command, as `send` would transmit it.
    Command(CommandArgs),
}

#[derive(Args, Debug)]
pub struct EncodeOpts {
    /// Frame id; 0 suppresses the response.
    #[arg(long, default_value_t = 1)]
    pub frame_id: u8,
    /// Escape control bytes (radio in API mode 2).
    #[arg(long)]
    pub escape: bool,
}

#[derive(Args, Debug)]
pub struct AtArgs {
    /// Two-character command, e.g. NI.
    pub command: String,
    /// Hex value; the command is a query when omitted.
    pub value: Option<String>,
    #[command(flatten)]
    pub opts: EncodeOpts,
}

#[derive(Args, Debug)]
pub struct RemoteAtArgs {
    /// 64-bit address of the target, in hex.
    pub address: String,
    /// Two-character command, e.g. D0.
    pub command: String,
    /// Hex value; the command is a query when omitted.
    pub value: Option<String>,
    /// Address the target by 16-bit network address instead (hex).
    #[arg(long)]
    pub address16: Option<String>,
    #[command(flatten)]
    pub opts: EncodeOpts,
}

#[derive(Args, Debug)]
pub struct TxArgs {
    /// 64-bit destination address, in hex.
    pub address: String,
    /// Hex payload.
    pub payload: String,
    /// Hop limit.
    #[arg(long, default_value_t = 0)]
    pub radius: u8,
    #[command(flatten)]
    pub opts: EncodeOpts,
}

#[derive(Args, Debug)]
pub struct CommandArgs {
    /// Command topic.
    pub topic: String,
    /// JSON command body.
    #[arg(long, default_value = "")]
    pub json: String,
    /// Escape control bytes (radio in API mode 2).
    #[arg(long)]
    pub escape: bool,
    #[command(flatten)]
    pub bridge: BridgeArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn frame_config(max_frame_data: usize, escape_outgoing: bool) -> FrameConfig {
    FrameConfig {
        max_frame_data,
        escape_outgoing,
        ..FrameConfig::default()
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(num) => (num, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// Parse hex text, ignoring whitespace and `:`/`,` separators.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .split(|c: char| c.is_whitespace() || c == ':' || c == ',')
        .map(|chunk| chunk.trim_start_matches("0x").trim_start_matches("0X"))
        .collect();
    hex::decode(&digits).map_err(|err| CliError::usage(format!("invalid hex {input:?}: {err}")))
}
