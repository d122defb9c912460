//! Responses received from the radio and the dispatcher that classifies them.
//!
//! Every typed response owns the frame's data bytes (everything after the
//! api id) and computes its fields from fixed offsets into them. Offsets in
//! this module are relative to the first byte after the api id.
//!
//! Lengths are checked once in [`Response::from_frame`]; a recognized type
//! that is shorter than its fixed layout fails with [`FrameError::TooShort`].
//! Unknown api ids never fail and come back as [`Response::Unclassified`].

use bytes::Bytes;

use crate::address::Address64;
use crate::api;
use crate::codec::ApiFrame;
use crate::error::{FrameError, Result};
use crate::status::{AtStatus, DeliveryStatus, ModemStatus};

/// Receive option bit: the packet was acknowledged.
pub const PACKET_ACKNOWLEDGED: u8 = 0x01;
/// Receive option bit: the packet was a broadcast.
pub const BROADCAST_PACKET: u8 = 0x02;
/// Legacy receive option bit: address broadcast.
pub const ADDRESS_BROADCAST: u8 = 0x02;
/// Legacy receive option bit: PAN broadcast.
pub const PAN_BROADCAST: u8 = 0x04;

fn be16(data: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([data[at], data[at + 1]])
}

fn address64_at(data: &[u8], at: usize) -> Address64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&data[at..at + 8]);
    Address64::from_be_bytes(raw)
}

fn ensure_len(api_id: u8, data: &Bytes, expected: usize) -> Result<()> {
    if data.len() < expected {
        return Err(FrameError::TooShort {
            api_id,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Delivery status for an extended send (0x8B).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZbTxStatus {
    data: Bytes,
}

impl ZbTxStatus {
    const MIN_LEN: usize = 6;

    /// Id of the request this status answers.
    pub fn frame_id(&self) -> u8 {
        self.data[0]
    }

    /// 16-bit address the packet was delivered to.
    pub fn address16(&self) -> u16 {
        be16(&self.data, 1)
    }

    /// Transmit retries spent.
    pub fn retry_count(&self) -> u8 {
        self.data[3]
    }

    /// Outcome of the send.
    pub fn delivery_status(&self) -> DeliveryStatus {
        DeliveryStatus::from(self.data[4])
    }

    /// Route and address discovery overhead.
    pub fn discovery_status(&self) -> u8 {
        self.data[5]
    }

    /// True when the packet was delivered.
    pub fn is_success(&self) -> bool {
        self.delivery_status().is_success()
    }
}

/// Extended data received (0x90).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZbRx {
    data: Bytes,
}

impl ZbRx {
    const MIN_LEN: usize = 11;
    const PAYLOAD_OFFSET: usize = 11;

    /// Sender's 64-bit address.
    pub fn address64(&self) -> Address64 {
        address64_at(&self.data, 0)
    }

    /// Sender's 16-bit network address.
    pub fn address16(&self) -> u16 {
        be16(&self.data, 8)
    }

    /// Receive option bit field.
    pub fn option(&self) -> u8 {
        self.data[10]
    }

    /// The sender got a MAC acknowledgement.
    pub fn is_acknowledged(&self) -> bool {
        self.option() & PACKET_ACKNOWLEDGED != 0
    }

    /// The packet was broadcast.
    pub fn is_broadcast(&self) -> bool {
        self.option() & BROADCAST_PACKET != 0
    }

    /// Application payload, from offset 11 to the end of frame data.
    pub fn payload(&self) -> Bytes {
        self.data.slice(Self::PAYLOAD_OFFSET..)
    }
}

/// Extended data received with explicit addressing (0x91).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZbExplicitRx {
    data: Bytes,
}

impl ZbExplicitRx {
    const MIN_LEN: usize = 17;
    const PAYLOAD_OFFSET: usize = 17;

    /// Sender's 64-bit address.
    pub fn address64(&self) -> Address64 {
        address64_at(&self.data, 0)
    }

    /// Sender's 16-bit network address.
    pub fn address16(&self) -> u16 {
        be16(&self.data, 8)
    }

    /// Endpoint the packet was sent from.
    pub fn source_endpoint(&self) -> u8 {
        self.data[10]
    }

    /// Endpoint the packet was sent to.
    pub fn destination_endpoint(&self) -> u8 {
        self.data[11]
    }

    /// Cluster the packet was sent on.
    pub fn cluster_id(&self) -> u16 {
        be16(&self.data, 12)
    }

    /// Profile the packet was sent on.
    pub fn profile_id(&self) -> u16 {
        be16(&self.data, 14)
    }

    /// Receive option bit field.
    pub fn option(&self) -> u8 {
        self.data[16]
    }

    /// Application payload, from offset 17 to the end of frame data.
    pub fn payload(&self) -> Bytes {
        self.data.slice(Self::PAYLOAD_OFFSET..)
    }
}

/// Extended I/O sample (0x92).
///
/// Layout after the address fields: option (10), sample count (11), digital
/// mask high (12), digital mask low (13), analog mask (14). When any digital
/// channel is enabled the digital sample follows as two bytes (high at 15,
/// low at 16); analog words follow in ascending channel order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZbIoSample {
    data: Bytes,
}

impl ZbIoSample {
    const MIN_LEN: usize = 15;
    const ANALOG_OFFSET: usize = 15;
    const DIGITAL_SAMPLE_LEN: usize = 2;

    /// Sampling radio's 64-bit address.
    pub fn address64(&self) -> Address64 {
        address64_at(&self.data, 0)
    }

    /// Sampling radio's 16-bit network address.
    pub fn address16(&self) -> u16 {
        be16(&self.data, 8)
    }

    /// Receive option bit field.
    pub fn option(&self) -> u8 {
        self.data[10]
    }

    /// Number of sample sets in the frame.
    pub fn sample_count(&self) -> u8 {
        self.data[11]
    }

    /// Enabled digital channels 8..=12 (bits 2..=4).
    pub fn digital_mask_high(&self) -> u8 {
        self.data[12] & 0x1C
    }

    /// Enabled digital channels 0..=7.
    pub fn digital_mask_low(&self) -> u8 {
        self.data[13]
    }

    /// Enabled analog channels 0..=3 plus supply voltage (bit 7).
    pub fn analog_mask(&self) -> u8 {
        self.data[14] & 0x8F
    }

    /// At least one analog channel or supply voltage is sampled.
    pub fn contains_analog(&self) -> bool {
        self.analog_mask() > 0
    }

    /// At least one digital channel is sampled.
    pub fn contains_digital(&self) -> bool {
        self.digital_mask_high() > 0 || self.digital_mask_low() > 0
    }

    /// Analog channel `channel` is in the mask.
    pub fn is_analog_enabled(&self, channel: u8) -> bool {
        channel < 8 && (self.analog_mask() >> channel) & 1 == 1
    }

    /// Digital channel `channel` is in the mask.
    pub fn is_digital_enabled(&self, channel: u8) -> bool {
        match channel {
            0..=7 => (self.digital_mask_low() >> channel) & 1 == 1,
            8..=15 => (self.digital_mask_high() >> (channel - 8)) & 1 == 1,
            _ => false,
        }
    }

    /// Analog reading for `channel`, or `None` if the channel is not enabled
    /// or the frame ends before its word.
    pub fn analog(&self, channel: u8) -> Option<u16> {
        if !self.is_analog_enabled(channel) {
            return None;
        }
        let mut start = Self::ANALOG_OFFSET;
        if self.contains_digital() {
            start += Self::DIGITAL_SAMPLE_LEN;
        }
        start += 2 * (0..channel).filter(|c| self.is_analog_enabled(*c)).count();
        let word = self.data.get(start..start + 2)?;
        Some(u16::from_be_bytes([word[0], word[1]]))
    }

    /// Digital state for `channel`, or `None` if the frame has no digital sample.
    pub fn is_digital_on(&self, channel: u8) -> Option<bool> {
        if !self.contains_digital() {
            return None;
        }
        let (at, bit) = match channel {
            0..=7 => (16, channel),
            8..=15 => (15, channel - 8),
            _ => return None,
        };
        self.data.get(at).map(|b| (b >> bit) & 1 == 1)
    }
}

/// Addressing width of a legacy receive frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyAddressing {
    Short,
    Long,
}

impl LegacyAddressing {
    fn rssi_offset(self) -> usize {
        match self {
            Self::Short => 2,
            Self::Long => 8,
        }
    }
}

/// Sender of a legacy receive frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacySource {
    Short(u16),
    Long(Address64),
}

fn legacy_source(addressing: LegacyAddressing, data: &[u8]) -> LegacySource {
    match addressing {
        LegacyAddressing::Short => LegacySource::Short(be16(data, 0)),
        LegacyAddressing::Long => LegacySource::Long(address64_at(data, 0)),
    }
}

/// Legacy data received (0x80 long, 0x81 short).
///
/// RSSI sits right after the address, then the option byte, then payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRx {
    addressing: LegacyAddressing,
    data: Bytes,
}

impl LegacyRx {
    fn min_len(addressing: LegacyAddressing) -> usize {
        addressing.rssi_offset() + 2
    }

    /// Whether the sender is identified by its 16 or 64-bit address.
    pub fn addressing(&self) -> LegacyAddressing {
        self.addressing
    }

    /// Sender address.
    pub fn source(&self) -> LegacySource {
        legacy_source(self.addressing, &self.data)
    }

    /// Received signal strength, as -dBm.
    pub fn rssi(&self) -> u8 {
        self.data[self.addressing.rssi_offset()]
    }

    /// Receive option bit field.
    pub fn option(&self) -> u8 {
        self.data[self.addressing.rssi_offset() + 1]
    }

    /// Sent to the broadcast address.
    pub fn is_address_broadcast(&self) -> bool {
        self.option() & ADDRESS_BROADCAST != 0
    }

    /// Sent to every PAN.
    pub fn is_pan_broadcast(&self) -> bool {
        self.option() & PAN_BROADCAST != 0
    }

    /// Application payload after the option byte.
    pub fn payload(&self) -> Bytes {
        self.data.slice(self.addressing.rssi_offset() + 2..)
    }
}

/// Legacy I/O sample (0x82 long, 0x83 short).
///
/// After RSSI and option: sample count, then two channel-indicator bytes.
/// The first indicator holds analog channels 0..=5 in bits 1..=6 and digital
/// channel 8 in bit 0; the second holds digital channels 0..=7. Samples
/// follow, each a two-byte digital word (if any digital channel is enabled)
/// then one word per enabled analog channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyIoSample {
    addressing: LegacyAddressing,
    data: Bytes,
}

impl LegacyIoSample {
    const ANALOG_CHANNELS: u8 = 6;

    fn min_len(addressing: LegacyAddressing) -> usize {
        addressing.rssi_offset() + 5
    }

    fn sample_offset(&self) -> usize {
        self.addressing.rssi_offset() + 2
    }

    fn indicator_high(&self) -> u8 {
        self.data[self.sample_offset() + 1]
    }

    fn indicator_low(&self) -> u8 {
        self.data[self.sample_offset() + 2]
    }

    /// Whether the sender is identified by its 16 or 64-bit address.
    pub fn addressing(&self) -> LegacyAddressing {
        self.addressing
    }

    /// Sender address.
    pub fn source(&self) -> LegacySource {
        legacy_source(self.addressing, &self.data)
    }

    /// Received signal strength, as -dBm.
    pub fn rssi(&self) -> u8 {
        self.data[self.addressing.rssi_offset()]
    }

    /// Receive option bit field.
    pub fn option(&self) -> u8 {
        self.data[self.addressing.rssi_offset() + 1]
    }

    /// Number of samples in the frame.
    pub fn sample_count(&self) -> u8 {
        self.data[self.sample_offset()]
    }

    /// At least one analog channel is sampled.
    pub fn contains_analog(&self) -> bool {
        self.indicator_high() & 0x7E > 0
    }

    /// At least one digital channel is sampled.
    pub fn contains_digital(&self) -> bool {
        self.indicator_high() & 0x01 > 0 || self.indicator_low() > 0
    }

    /// Analog channel `channel` (0..=5) is enabled.
    pub fn is_analog_enabled(&self, channel: u8) -> bool {
        channel < Self::ANALOG_CHANNELS && (self.indicator_high() >> (channel + 1)) & 1 == 1
    }

    /// Digital channel `channel` (0..=8) is enabled.
    pub fn is_digital_enabled(&self, channel: u8) -> bool {
        match channel {
            0..=7 => (self.indicator_low() >> channel) & 1 == 1,
            8 => self.indicator_high() & 1 == 1,
            _ => false,
        }
    }

    fn digital_len(&self) -> usize {
        if self.contains_digital() {
            2
        } else {
            0
        }
    }

    fn sample_start(&self, sample: u8) -> usize {
        let analog = (0..Self::ANALOG_CHANNELS)
            .filter(|c| self.is_analog_enabled(*c))
            .count();
        let spacing = self.digital_len() + 2 * analog;
        self.sample_offset() + 3 + usize::from(sample) * spacing
    }

    /// Analog reading for `channel` in sample number `sample`.
    pub fn analog(&self, channel: u8, sample: u8) -> Option<u16> {
        if !self.is_analog_enabled(channel) || sample >= self.sample_count() {
            return None;
        }
        let start = self.sample_start(sample)
            + self.digital_len()
            + 2 * (0..channel).filter(|c| self.is_analog_enabled(*c)).count();
        let word = self.data.get(start..start + 2)?;
        Some(u16::from_be_bytes([word[0], word[1]]))
    }

    /// Digital state for `channel` in sample number `sample`.
    pub fn is_digital_on(&self, channel: u8, sample: u8) -> Option<bool> {
        if !self.contains_digital() || sample >= self.sample_count() {
            return None;
        }
        let start = self.sample_start(sample);
        match channel {
            0..=7 => self.data.get(start + 1).map(|b| (b >> channel) & 1 == 1),
            8 => self.data.get(start).map(|b| b & 1 == 1),
            _ => None,
        }
    }
}

/// Legacy transmit status (0x89).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxStatus {
    data: Bytes,
}

impl TxStatus {
    const MIN_LEN: usize = 2;

    /// Id of the request this status answers.
    pub fn frame_id(&self) -> u8 {
        self.data[0]
    }

    /// 0 success, 1 no ack, 2 CCA failure, 3 purged.
    pub fn status(&self) -> u8 {
        self.data[1]
    }

    /// True when the send succeeded.
    pub fn is_success(&self) -> bool {
        self.status() == 0
    }
}

/// Local configuration response (0x88).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtCommandResponse {
    data: Bytes,
}

impl AtCommandResponse {
    const MIN_LEN: usize = 4;

    /// Id of the request this response answers.
    pub fn frame_id(&self) -> u8 {
        self.data[0]
    }

    /// Two-character command name.
    pub fn command(&self) -> [u8; 2] {
        [self.data[1], self.data[2]]
    }

    /// Outcome reported by the radio.
    pub fn status(&self) -> AtStatus {
        AtStatus::from(self.data[3])
    }

    /// True when the command succeeded.
    pub fn is_ok(&self) -> bool {
        self.status().is_ok()
    }

    /// Returned value; empty for set commands.
    pub fn value(&self) -> Bytes {
        self.data.slice(4..)
    }
}

/// Remote configuration response (0x97).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAtCommandResponse {
    data: Bytes,
}

impl RemoteAtCommandResponse {
    const MIN_LEN: usize = 14;

    /// Id of the request this response answers.
    pub fn frame_id(&self) -> u8 {
        self.data[0]
    }

    /// 64-bit address of the responding radio.
    pub fn address64(&self) -> Address64 {
        address64_at(&self.data, 1)
    }

    /// 16-bit address of the responding radio.
    pub fn address16(&self) -> u16 {
        be16(&self.data, 9)
    }

    /// Two-character command name.
    pub fn command(&self) -> [u8; 2] {
        [self.data[11], self.data[12]]
    }

    /// Outcome reported by the remote radio.
    pub fn status(&self) -> AtStatus {
        AtStatus::from(self.data[13])
    }

    /// True when the command succeeded.
    pub fn is_ok(&self) -> bool {
        self.status().is_ok()
    }

    /// Returned value; empty for set commands.
    pub fn value(&self) -> Bytes {
        self.data.slice(14..)
    }
}

/// A classified response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    ZbTxStatus(ZbTxStatus),
    ZbRx(ZbRx),
    ZbExplicitRx(ZbExplicitRx),
    ZbIoSample(ZbIoSample),
    /// 0x80 and 0x81.
    LegacyRx(LegacyRx),
    /// 0x82 and 0x83.
    LegacyIoSample(LegacyIoSample),
    TxStatus(TxStatus),
    ModemStatus(ModemStatus),
    AtCommand(AtCommandResponse),
    RemoteAtCommand(RemoteAtCommandResponse),
    /// Any api id without a typed layout.
    Unclassified(ApiFrame),
}

impl Response {
    /// Classify a parsed frame by its api id.
    pub fn from_frame(frame: ApiFrame) -> Result<Self> {
        let ApiFrame { api_id, data } = frame;
        let response = match api_id {
            api::ZB_TX_STATUS_RESPONSE => {
                ensure_len(api_id, &data, ZbTxStatus::MIN_LEN)?;
                Self::ZbTxStatus(ZbTxStatus { data })
            }
            api::ZB_RX_RESPONSE => {
                ensure_len(api_id, &data, ZbRx::MIN_LEN)?;
                Self::ZbRx(ZbRx { data })
            }
            api::ZB_EXPLICIT_RX_RESPONSE => {
                ensure_len(api_id, &data, ZbExplicitRx::MIN_LEN)?;
                Self::ZbExplicitRx(ZbExplicitRx { data })
            }
            api::ZB_IO_SAMPLE_RESPONSE => {
                ensure_len(api_id, &data, ZbIoSample::MIN_LEN)?;
                Self::ZbIoSample(ZbIoSample { data })
            }
            api::RX_16_RESPONSE | api::RX_64_RESPONSE => {
                let addressing = if api_id == api::RX_16_RESPONSE {
                    LegacyAddressing::Short
                } else {
                    LegacyAddressing::Long
                };
                ensure_len(api_id, &data, LegacyRx::min_len(addressing))?;
                Self::LegacyRx(LegacyRx { addressing, data })
            }
            api::RX_16_IO_RESPONSE | api::RX_64_IO_RESPONSE => {
                let addressing = if api_id == api::RX_16_IO_RESPONSE {
                    LegacyAddressing::Short
                } else {
                    LegacyAddressing::Long
                };
                ensure_len(api_id, &data, LegacyIoSample::min_len(addressing))?;
                Self::LegacyIoSample(LegacyIoSample { addressing, data })
            }
            api::TX_STATUS_RESPONSE => {
                ensure_len(api_id, &data, TxStatus::MIN_LEN)?;
                Self::TxStatus(TxStatus { data })
            }
            api::MODEM_STATUS_RESPONSE => {
                ensure_len(api_id, &data, 1)?;
                Self::ModemStatus(ModemStatus::from(data[0]))
            }
            api::AT_COMMAND_RESPONSE => {
                ensure_len(api_id, &data, AtCommandResponse::MIN_LEN)?;
                Self::AtCommand(AtCommandResponse { data })
            }
            api::REMOTE_AT_COMMAND_RESPONSE => {
                ensure_len(api_id, &data, RemoteAtCommandResponse::MIN_LEN)?;
                Self::RemoteAtCommand(RemoteAtCommandResponse { data })
            }
            _ => Self::Unclassified(ApiFrame { api_id, data }),
        };
        Ok(response)
    }

    /// Api id this response was classified from.
    pub fn api_id(&self) -> u8 {
        match self {
            Self::ZbTxStatus(_) => api::ZB_TX_STATUS_RESPONSE,
            Self::ZbRx(_) => api::ZB_RX_RESPONSE,
            Self::ZbExplicitRx(_) => api::ZB_EXPLICIT_RX_RESPONSE,
            Self::ZbIoSample(_) => api::ZB_IO_SAMPLE_RESPONSE,
            Self::LegacyRx(r) => match r.addressing {
                LegacyAddressing::Short => api::RX_16_RESPONSE,
                LegacyAddressing::Long => api::RX_64_RESPONSE,
            },
            Self::LegacyIoSample(r) => match r.addressing {
                LegacyAddressing::Short => api::RX_16_IO_RESPONSE,
                LegacyAddressing::Long => api::RX_64_IO_RESPONSE,
            },
            Self::TxStatus(_) => api::TX_STATUS_RESPONSE,
            Self::ModemStatus(_) => api::MODEM_STATUS_RESPONSE,
            Self::AtCommand(_) => api::AT_COMMAND_RESPONSE,
            Self::RemoteAtCommand(_) => api::REMOTE_AT_COMMAND_RESPONSE,
            Self::Unclassified(frame) => frame.api_id,
        }
    }

    /// Frame id, for responses that echo one.
    pub fn frame_id(&self) -> Option<u8> {
        match self {
            Self::ZbTxStatus(r) => Some(r.frame_id()),
            Self::TxStatus(r) => Some(r.frame_id()),
            Self::AtCommand(r) => Some(r.frame_id()),
            Self::RemoteAtCommand(r) => Some(r.frame_id()),
            _ => None,
        }
    }

    /// Short name of the response type.
    pub fn name(&self) -> &'static str {
        api::api_name(self.api_id())
    }
}

impl TryFrom<ApiFrame> for Response {
    type Error = FrameError;

    fn try_from(frame: ApiFrame) -> Result<Self> {
        Self::from_frame(frame)
    }
}
