//! Requests sent to the radio.
//!
//! Each variant renders a fixed preamble (addresses, options, endpoints)
//! followed by its payload. Multi-byte fields go out big-endian.

use bytes::{BufMut, Bytes, BytesMut};

use crate::address::{Address64, BROADCAST_ADDRESS16, BROADCAST_ADDRESS64, UNKNOWN_ADDRESS16};
use crate::api;
use crate::codec::{checksum, put_header};
use crate::error::Result;
use crate::frame_id::NO_RESPONSE_FRAME_ID;

/// Default radius: use the network maximum hop count.
pub const DEFAULT_RADIUS: u8 = 0;
/// Default transmit option for extended sends.
pub const UNICAST_OPTION: u8 = 0x00;
/// Legacy transmit options.
pub const ACK_OPTION: u8 = 0x00;
pub const DISABLE_ACK_OPTION: u8 = 0x01;
pub const BROADCAST_OPTION: u8 = 0x04;
/// Endpoint used for both ends of a default explicit send.
pub const DEFAULT_ENDPOINT: u8 = 0xE8;
pub const DEFAULT_CLUSTER_ID: u16 = 0x0011;
pub const DEFAULT_PROFILE_ID: u16 = 0xC105;
/// Remote configuration option: apply changes immediately.
pub const APPLY_CHANGES_OPTION: u8 = 0x02;

const TX_16_BASE_LEN: usize = 3;
const TX_64_BASE_LEN: usize = 9;
const ZB_TX_BASE_LEN: usize = 12;
const ZB_EXPLICIT_TX_BASE_LEN: usize = 18;
const AT_COMMAND_BASE_LEN: usize = 2;
const REMOTE_AT_BASE_LEN: usize = 13;

/// Legacy send to a 16-bit address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tx16Request {
    pub frame_id: u8,
    pub address16: u16,
    pub option: u8,
    pub payload: Bytes,
}

impl Tx16Request {
    /// Acknowledged send to `address16` with no status frame requested.
    pub fn new(address16: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            frame_id: NO_RESPONSE_FRAME_ID,
            address16,
            option: ACK_OPTION,
            payload: payload.into(),
        }
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u16(self.address16);
        dst.put_u8(self.option);
        dst.put_slice(&self.payload);
    }
}

/// Legacy send to a 64-bit address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tx64Request {
    pub frame_id: u8,
    pub address64: Address64,
    pub option: u8,
    pub payload: Bytes,
}

impl Tx64Request {
    /// Acknowledged send to `address64` with no status frame requested.
    pub fn new(address64: Address64, payload: impl Into<Bytes>) -> Self {
        Self {
            frame_id: NO_RESPONSE_FRAME_ID,
            address64,
            option: ACK_OPTION,
            payload: payload.into(),
        }
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u64(self.address64.get());
        dst.put_u8(self.option);
        dst.put_slice(&self.payload);
    }
}

/// Extended (mesh) send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZbTxRequest {
    pub frame_id: u8,
    pub address64: Address64,
    pub address16: u16,
    pub radius: u8,
    pub option: u8,
    pub payload: Bytes,
}

impl ZbTxRequest {
    /// Unicast to `address64` with the 16-bit address left for the radio to discover.
    pub fn new(address64: Address64, payload: impl Into<Bytes>) -> Self {
        Self {
            frame_id: NO_RESPONSE_FRAME_ID,
            address64,
            address16: UNKNOWN_ADDRESS16,
            radius: DEFAULT_RADIUS,
            option: UNICAST_OPTION,
            payload: payload.into(),
        }
    }

    /// Request a delivery status tagged with `frame_id`.
    pub fn with_frame_id(mut self, frame_id: u8) -> Self {
        self.frame_id = frame_id;
        self
    }

    /// Maximum hops; 0 uses the network maximum.
    pub fn with_radius(mut self, radius: u8) -> Self {
        self.radius = radius;
        self
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u64(self.address64.get());
        dst.put_u16(self.address16);
        dst.put_u8(self.radius);
        dst.put_u8(self.option);
        dst.put_slice(&self.payload);
    }
}

/// Extended send with explicit endpoint, cluster and profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZbExplicitTxRequest {
    pub frame_id: u8,
    pub address64: Address64,
    pub address16: u16,
    pub source_endpoint: u8,
    pub destination_endpoint: u8,
    pub cluster_id: u16,
    pub profile_id: u16,
    pub radius: u8,
    pub option: u8,
    pub payload: Bytes,
}

impl ZbExplicitTxRequest {
    /// Unicast on the default endpoint, cluster and profile.
    pub fn new(address64: Address64, payload: impl Into<Bytes>) -> Self {
        Self {
            frame_id: NO_RESPONSE_FRAME_ID,
            address64,
            address16: UNKNOWN_ADDRESS16,
            source_endpoint: DEFAULT_ENDPOINT,
            destination_endpoint: DEFAULT_ENDPOINT,
            cluster_id: DEFAULT_CLUSTER_ID,
            profile_id: DEFAULT_PROFILE_ID,
            radius: DEFAULT_RADIUS,
            option: UNICAST_OPTION,
            payload: payload.into(),
        }
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u64(self.address64.get());
        dst.put_u16(self.address16);
        dst.put_u8(self.source_endpoint);
        dst.put_u8(self.destination_endpoint);
        dst.put_u16(self.cluster_id);
        dst.put_u16(self.profile_id);
        dst.put_u8(self.radius);
        dst.put_u8(self.option);
        dst.put_slice(&self.payload);
    }
}

/// Local configuration command. An empty value is a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtCommandRequest {
    pub frame_id: u8,
    pub command: [u8; 2],
    pub value: Bytes,
}

impl AtCommandRequest {
    /// Read the current value of `command`.
    pub fn query(command: [u8; 2]) -> Self {
        Self {
            frame_id: NO_RESPONSE_FRAME_ID,
            command,
            value: Bytes::new(),
        }
    }

    /// Write `value` to `command`.
    pub fn set(command: [u8; 2], value: impl Into<Bytes>) -> Self {
        Self {
            frame_id: NO_RESPONSE_FRAME_ID,
            command,
            value: value.into(),
        }
    }

    /// True when no value is carried.
    pub fn is_query(&self) -> bool {
        self.value.is_empty()
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_slice(&self.command);
        dst.put_slice(&self.value);
    }
}

/// Configuration command executed by another radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAtCommandRequest {
    pub frame_id: u8,
    pub address64: Address64,
    pub address16: u16,
    pub apply_changes: bool,
    pub command: [u8; 2],
    pub value: Bytes,
}

impl RemoteAtCommandRequest {
    /// Address the target by its 64-bit address.
    ///
    /// Changes are applied immediately when a value is supplied.
    pub fn new(address64: Address64, command: [u8; 2], value: impl Into<Bytes>) -> Self {
        let value = value.into();
        Self {
            frame_id: NO_RESPONSE_FRAME_ID,
            address64,
            address16: UNKNOWN_ADDRESS16,
            apply_changes: !value.is_empty(),
            command,
            value,
        }
    }

    /// Address the target by its 16-bit address.
    pub fn by_address16(address16: u16, command: [u8; 2], value: impl Into<Bytes>) -> Self {
        Self {
            address16,
            ..Self::new(BROADCAST_ADDRESS64, command, value)
        }
    }

    /// Option byte sent on the wire.
    pub fn option(&self) -> u8 {
        if self.apply_changes {
            APPLY_CHANGES_OPTION
        } else {
            0
        }
    }

    fn write_body(&self, dst: &mut BytesMut) {
        dst.put_u64(self.address64.get());
        dst.put_u16(self.address16);
        dst.put_u8(self.option());
        dst.put_slice(&self.command);
        dst.put_slice(&self.value);
    }
}

/// Every request the writer knows how to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Tx16(Tx16Request),
    Tx64(Tx64Request),
    ZbTx(ZbTxRequest),
    ZbExplicitTx(ZbExplicitTxRequest),
    AtCommand(AtCommandRequest),
    RemoteAtCommand(RemoteAtCommandRequest),
}

impl Request {
    /// Type identifier placed after the length field.
    pub fn api_id(&self) -> u8 {
        match self {
            Self::Tx16(_) => api::TX_16_REQUEST,
            Self::Tx64(_) => api::TX_64_REQUEST,
            Self::ZbTx(_) => api::ZB_TX_REQUEST,
            Self::ZbExplicitTx(_) => api::ZB_EXPLICIT_TX_REQUEST,
            Self::AtCommand(_) => api::AT_COMMAND_REQUEST,
            Self::RemoteAtCommand(_) => api::REMOTE_AT_REQUEST,
        }
    }

    /// Correlation id echoed by the status frame; 0 requests none.
    pub fn frame_id(&self) -> u8 {
        match self {
            Self::Tx16(r) => r.frame_id,
            Self::Tx64(r) => r.frame_id,
            Self::ZbTx(r) => r.frame_id,
            Self::ZbExplicitTx(r) => r.frame_id,
            Self::AtCommand(r) => r.frame_id,
            Self::RemoteAtCommand(r) => r.frame_id,
        }
    }

    /// Replace the correlation id on any variant.
    pub fn set_frame_id(&mut self, frame_id: u8) {
        match self {
            Self::Tx16(r) => r.frame_id = frame_id,
            Self::Tx64(r) => r.frame_id = frame_id,
            Self::ZbTx(r) => r.frame_id = frame_id,
            Self::ZbExplicitTx(r) => r.frame_id = frame_id,
            Self::AtCommand(r) => r.frame_id = frame_id,
            Self::RemoteAtCommand(r) => r.frame_id = frame_id,
        }
    }

    /// Payload or command value following the fixed preamble.
    pub fn payload(&self) -> &Bytes {
        match self {
            Self::Tx16(r) => &r.payload,
            Self::Tx64(r) => &r.payload,
            Self::ZbTx(r) => &r.payload,
            Self::ZbExplicitTx(r) => &r.payload,
            Self::AtCommand(r) => &r.value,
            Self::RemoteAtCommand(r) => &r.value,
        }
    }

    /// Fixed preamble length, not counting api id or frame id.
    pub fn base_len(&self) -> usize {
        match self {
            Self::Tx16(_) => TX_16_BASE_LEN,
            Self::Tx64(_) => TX_64_BASE_LEN,
            Self::ZbTx(_) => ZB_TX_BASE_LEN,
            Self::ZbExplicitTx(_) => ZB_EXPLICIT_TX_BASE_LEN,
            Self::AtCommand(_) => AT_COMMAND_BASE_LEN,
            Self::RemoteAtCommand(_) => REMOTE_AT_BASE_LEN,
        }
    }

    /// Value of the length field: api id, frame id, preamble and payload.
    pub fn frame_data_len(&self) -> usize {
        2 + self.base_len() + self.payload().len()
    }

    /// Render everything after the api id: frame id, preamble, payload.
    pub fn encode_body(&self, dst: &mut BytesMut) {
        dst.put_u8(self.frame_id());
        match self {
            Self::Tx16(r) => r.write_body(dst),
            Self::Tx64(r) => r.write_body(dst),
            Self::ZbTx(r) => r.write_body(dst),
            Self::ZbExplicitTx(r) => r.write_body(dst),
            Self::AtCommand(r) => r.write_body(dst),
            Self::RemoteAtCommand(r) => r.write_body(dst),
        }
    }

    /// Render the complete unescaped frame.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        let frame_data_len = self.frame_data_len();
        dst.reserve(frame_data_len + crate::codec::PACKET_OVERHEAD);
        put_header(frame_data_len, dst)?;
        let body_start = dst.len();
        dst.put_u8(self.api_id());
        self.encode_body(dst);
        let sum = checksum(&dst[body_start..]);
        dst.put_u8(sum);
        Ok(())
    }

    /// Render to a fresh buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.frame_data_len() + crate::codec::PACKET_OVERHEAD);
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }
}

impl From<Tx16Request> for Request {
    fn from(r: Tx16Request) -> Self {
        Self::Tx16(r)
    }
}

impl From<Tx64Request> for Request {
    fn from(r: Tx64Request) -> Self {
        Self::Tx64(r)
    }
}

impl From<ZbTxRequest> for Request {
    fn from(r: ZbTxRequest) -> Self {
        Self::ZbTx(r)
    }
}

impl From<ZbExplicitTxRequest> for Request {
    fn from(r: ZbExplicitTxRequest) -> Self {
        Self::ZbExplicitTx(r)
    }
}

impl From<AtCommandRequest> for Request {
    fn from(r: AtCommandRequest) -> Self {
        Self::AtCommand(r)
    }
}

impl From<RemoteAtCommandRequest> for Request {
    fn from(r: RemoteAtCommandRequest) -> Self {
        Self::RemoteAtCommand(r)
    }
}

/// Broadcast helper: extended send to every node.
pub fn broadcast(payload: impl Into<Bytes>) -> ZbTxRequest {
    ZbTxRequest::new(BROADCAST_ADDRESS64, payload)
}

/// Legacy broadcast to every node on the PAN.
pub fn broadcast16(payload: impl Into<Bytes>) -> Tx16Request {
    let mut req = Tx16Request::new(BROADCAST_ADDRESS16, payload);
    req.option = BROADCAST_OPTION;
    req
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{verify_checksum, FrameParser};

    fn addr() -> Address64 {
        Address64::from_halves(0x0013_A200, 0x4127_CE89)
    }

    fn all_variants() -> Vec<Request> {
        vec![
            Tx16Request::new(0x1234, vec![1, 2, 3]).into(),
            Tx64Request::new(addr(), vec![0x7E, 0x7D]).into(),
            ZbTxRequest::new(addr(), vec![0x11, 0x13, 0x00]).with_frame_id(9).into(),
            ZbExplicitTxRequest::new(addr(), vec![0xAA]).into(),
            AtCommandRequest::query(*b"NI").into(),
            AtCommandRequest::set(*b"D0", vec![0x04]).into(),
            RemoteAtCommandRequest::new(addr(), *b"D1", vec![0x05]).into(),
            RemoteAtCommandRequest::by_address16(0x0001, *b"SL", Bytes::new()).into(),
        ]
    }

    #[test]
    fn zb_tx_layout() {
        let req: Request = ZbTxRequest::new(addr(), vec![0x0A]).with_frame_id(1).into();
        let bytes = req.to_bytes().unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[
                0x7E, 0x00, 0x0F, 0x10, 0x01, 0x00, 0x13, 0xA2, 0x00, 0x41, 0x27, 0xCE, 0x89,
                0xFF, 0xFE, 0x00, 0x00, 0x0A, 0x73,
            ][..]
        );
        assert_eq!(req.frame_data_len(), 15);
    }

    #[test]
    fn at_query_layout() {
        let mut req: Request = AtCommandRequest::query(*b"NI").into();
        req.set_frame_id(0x52);
        let bytes = req.to_bytes().unwrap();
        // checksum: 0xFF - (0x08 + 0x52 + 'N' + 'I')
        assert_eq!(bytes.as_ref(), &[0x7E, 0x00, 0x04, 0x08, 0x52, 0x4E, 0x49, 0x0E]);
    }

    #[test]
    fn explicit_defaults() {
        let req = ZbExplicitTxRequest::new(addr(), Bytes::new());
        let mut body = BytesMut::new();
        Request::from(req).encode_body(&mut body);
        assert_eq!(body.len(), 1 + ZB_EXPLICIT_TX_BASE_LEN);
        assert_eq!(&body[9..17], &[0xFF, 0xFE, 0xE8, 0xE8, 0x00, 0x11, 0xC1, 0x05][..]);
    }

    #[test]
    fn remote_at_option_follows_value() {
        let set = RemoteAtCommandRequest::new(addr(), *b"D1", vec![5]);
        assert_eq!(set.option(), APPLY_CHANGES_OPTION);
        let query = RemoteAtCommandRequest::new(addr(), *b"D1", Bytes::new());
        assert_eq!(query.option(), 0);

        let by16 = RemoteAtCommandRequest::by_address16(0x0001, *b"D1", Bytes::new());
        assert_eq!(by16.address64, BROADCAST_ADDRESS64);
        assert_eq!(by16.address16, 0x0001);
    }

    #[test]
    fn checksum_holds_for_every_variant() {
        for req in all_variants() {
            let bytes = req.to_bytes().unwrap();
            let len = usize::from(u16::from_be_bytes([bytes[1], bytes[2]]));
            assert_eq!(len, req.frame_data_len());
            assert_eq!(bytes.len(), len + 4);
            assert!(verify_checksum(&bytes[3..bytes.len() - 1], bytes[bytes.len() - 1]));
        }
    }

    #[test]
    fn serialized_requests_parse_back() {
        for req in all_variants() {
            let bytes = crate::codec::escape_frame(&req.to_bytes().unwrap());
            let mut buf = BytesMut::from(bytes.as_ref());
            let frame = FrameParser::new().decode(&mut buf).unwrap().unwrap();
            assert_eq!(frame.api_id, req.api_id());
            assert_eq!(frame.frame_id(), Some(req.frame_id()));
            assert!(frame.data.ends_with(req.payload()));
            assert_eq!(frame.data.len(), 1 + req.base_len() + req.payload().len());
        }
    }

    #[test]
    fn broadcast_helpers() {
        let zb = broadcast(vec![1]);
        assert_eq!(zb.address64, BROADCAST_ADDRESS64);
        assert_eq!(zb.address16, UNKNOWN_ADDRESS16);
        let legacy = broadcast16(vec![1]);
        assert_eq!(legacy.address16, BROADCAST_ADDRESS16);
        assert_eq!(legacy.option, BROADCAST_OPTION);
    }
}
