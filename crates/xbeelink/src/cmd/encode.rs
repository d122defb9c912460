use xbeelink_bridge::Bridge;
use xbeelink_frame::{
    escape_frame, Address64, AtCommandRequest, RemoteAtCommandRequest, Request, ZbTxRequest,
};

use crate::cmd::{parse_hex, AtArgs, CommandArgs, EncodeCommand, RemoteAtArgs, TxArgs};
use crate::exit::{bridge_error, frame_error, CliError, CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(command: EncodeCommand, format: OutputFormat) -> CliResult<i32> {
    let (request, escape) = build(command)?;
    let raw = request
        .to_bytes()
        .map_err(|err| frame_error("encode failed", err))?;
    let wire = if escape {
        escape_frame(&raw).freeze()
    } else {
        raw
    };
    print_encoded(&request, &wire, format);
    Ok(SUCCESS)
}

fn build(command: EncodeCommand) -> CliResult<(Request, bool)> {
    match command {
        EncodeCommand::At(args) => at_request(args),
        EncodeCommand::RemoteAt(args) => remote_at_request(args),
        EncodeCommand::Tx(args) => tx_request(args),
        EncodeCommand::Command(args) => command_request(args),
    }
}

fn at_request(args: AtArgs) -> CliResult<(Request, bool)> {
    let command = at_command(&args.command)?;
    let mut request = match &args.value {
        Some(value) => AtCommandRequest::set(command, parse_hex(value)?),
        None => AtCommandRequest::query(command),
    };
    request.frame_id = args.opts.frame_id;
    Ok((request.into(), args.opts.escape))
}

fn remote_at_request(args: RemoteAtArgs) -> CliResult<(Request, bool)> {
    let command = at_command(&args.command)?;
    let value = match &args.value {
        Some(value) => parse_hex(value)?,
        None => Vec::new(),
    };
    let mut request = match &args.address16 {
        Some(short) => RemoteAtCommandRequest::by_address16(parse_address16(short)?, command, value),
        None => RemoteAtCommandRequest::new(parse_address(&args.address)?, command, value),
    };
    request.frame_id = args.opts.frame_id;
    Ok((request.into(), args.opts.escape))
}

fn tx_request(args: TxArgs) -> CliResult<(Request, bool)> {
    let request = ZbTxRequest::new(parse_address(&args.address)?, parse_hex(&args.payload)?)
        .with_frame_id(args.opts.frame_id)
        .with_radius(args.radius);
    Ok((request.into(), args.opts.escape))
}

fn command_request(args: CommandArgs) -> CliResult<(Request, bool)> {
    let mut bridge = Bridge::new(args.bridge.config());
    let request = bridge
        .command_request(&args.topic, &args.json)
        .map_err(|err| bridge_error("invalid command", err))?;
    Ok((request, args.escape))
}

fn at_command(text: &str) -> CliResult<[u8; 2]> {
    <[u8; 2]>::try_from(text.as_bytes())
        .ok()
        .filter(|command| command.iter().all(u8::is_ascii_alphanumeric))
        .map(|command| command.map(|b| b.to_ascii_uppercase()))
        .ok_or_else(|| CliError::usage(format!("AT command must be two characters: {text:?}")))
}

fn parse_address(text: &str) -> CliResult<Address64> {
    text.parse()
        .map_err(|err: xbeelink_frame::AddressParseError| CliError::usage(err.to_string()))
}

fn parse_address16(text: &str) -> CliResult<u16> {
    let digits = text.trim_start_matches("0x").trim_start_matches("0X");
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CliError::usage(format!("invalid 16-bit address {text:?}")));
    }
    u16::from_str_radix(digits, 16)
        .map_err(|_| CliError::usage(format!("invalid 16-bit address {text:?}")))
}
