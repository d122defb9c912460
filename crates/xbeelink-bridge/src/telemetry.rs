//! Sensor records sent by devices inside extended data frames.
//!
//! Every payload starts with a [`MessageType`] byte. The record layouts below
//! are little-endian and offsets count from the byte after the type.

use bytes::{Buf, BufMut, BytesMut};
use serde::Serialize;

use crate::error::TelemetryError;
use crate::message::MessageType;

type Result<T> = std::result::Result<T, TelemetryError>;

fn ensure(kind: &'static str, record: &[u8], expected: usize) -> Result<()> {
    if record.len() < expected {
        return Err(TelemetryError::Truncated {
            kind,
            expected,
            actual: record.len(),
        });
    }
    Ok(())
}

/// Tank-level controller status.
///
/// ```text
/// 0      flags (bit0 high-water mark, bit1 valve open)
/// 1..5   flow, u32, 0.1 units
/// 5..9   overflow, u32, 0.1 units
/// 9..11  daily usage, u16, 0.1 units (later firmware only)
/// N      moisture 1, moisture 2, tank volume, temperature (0.1 °C), u16 each
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TankStats {
    pub high_water_mark: bool,
    pub valve_open: bool,
    pub moisture1: u16,
    pub moisture2: u16,
    pub tank_volume: u16,
    pub tank_flow: f64,
    pub tank_overflow: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_usage: Option<f64>,
    pub temperature: f64,
}

impl TankStats {
    const KIND: &'static str = "tank stats";
    const LEN: usize = 17;
    const LEN_WITH_DAILY_USAGE: usize = 19;

    pub fn decode(record: &[u8]) -> Result<Self> {
        ensure(Self::KIND, record, Self::LEN)?;
        let mut buf = record;
        let flags = buf.get_u8();
        let flow = buf.get_u32_le();
        let overflow = buf.get_u32_le();
        let daily_usage = if record.len() >= Self::LEN_WITH_DAILY_USAGE {
            Some(f64::from(buf.get_u16_le()) / 10.0)
        } else {
            None
        };
        Ok(Self {
            high_water_mark: flags & 0x01 != 0,
            valve_open: flags & 0x02 != 0,
            tank_flow: f64::from(flow) / 10.0,
            tank_overflow: f64::from(overflow) / 10.0,
            daily_usage,
            moisture1: buf.get_u16_le(),
            moisture2: buf.get_u16_le(),
            tank_volume: buf.get_u16_le(),
            temperature: f64::from(buf.get_u16_le()) / 10.0,
        })
    }
}

/// Valve state reported after a manual override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TankManual {
    pub valve_open: bool,
}

impl TankManual {
    pub fn decode(record: &[u8]) -> Result<Self> {
        ensure("tank manual", record, 1)?;
        Ok(Self {
            valve_open: record[0] != 0,
        })
    }
}

/// Tank controller settings. Reported by the device and sent back to change them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TankParameters {
    pub auto_vent: bool,
    pub auto_depth: bool,
    #[serde(rename = "ValveTimeOut")]
    pub valve_timeout: u16,
    pub tank_depth: u16,
    pub surface_area: u16,
    pub sensor_distance: u16,
    pub pulses_per_litre: u16,
    pub auto_vent_time: u16,
    pub max_valve_open_time: u16,
}

impl TankParameters {
    pub const LEN: usize = 16;

    pub fn decode(record: &[u8]) -> Result<Self> {
        ensure("tank parameters", record, Self::LEN)?;
        let mut buf = record;
        Ok(Self {
            auto_vent: buf.get_u8() != 0,
            auto_depth: buf.get_u8() != 0,
            valve_timeout: buf.get_u16_le(),
            tank_depth: buf.get_u16_le(),
            surface_area: buf.get_u16_le(),
            sensor_distance: buf.get_u16_le(),
            pulses_per_litre: buf.get_u16_le(),
            auto_vent_time: buf.get_u16_le(),
            max_valve_open_time: buf.get_u16_le(),
        })
    }

    /// Append the record (without a type byte).
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(u8::from(self.auto_vent));
        dst.put_u8(u8::from(self.auto_depth));
        dst.put_u16_le(self.valve_timeout);
        dst.put_u16_le(self.tank_depth);
        dst.put_u16_le(self.surface_area);
        dst.put_u16_le(self.sensor_distance);
        dst.put_u16_le(self.pulses_per_litre);
        dst.put_u16_le(self.auto_vent_time);
        dst.put_u16_le(self.max_valve_open_time);
    }
}

/// Soil-moisture sensor status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PotPlantStats {
    pub sequence: u8,
    pub moisture: u16,
    #[serde(rename = "VBat")]
    pub battery_voltage: f64,
    pub internal_temperature: f64,
    pub external_temperature: f64,
}

impl PotPlantStats {
    const LEN: usize = 9;

    pub fn decode(record: &[u8]) -> Result<Self> {
        ensure("pot plant stats", record, Self::LEN)?;
        let mut buf = record;
        Ok(Self {
            sequence: buf.get_u8(),
            moisture: buf.get_u16_le(),
            battery_voltage: f64::from(buf.get_u16_le()) / 100.0,
            internal_temperature: f64::from(buf.get_i16_le()) / 10.0,
            external_temperature: f64::from(buf.get_i16_le()) / 10.0,
        })
    }
}

/// Device family a record belongs to, used as a topic segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    TankWaterer,
    PotPlant,
}

impl DeviceClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TankWaterer => "TankWaterer",
            Self::PotPlant => "PotPlant",
        }
    }
}

/// A decoded sensor record. Serializes as the bare record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Telemetry {
    TankStats(TankStats),
    TankManual(TankManual),
    TankParameters(TankParameters),
    PotPlantStats(PotPlantStats),
}

impl Telemetry {
    /// Decode a payload whose first byte is the message type.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let (&code, record) = body.split_first().ok_or(TelemetryError::Empty)?;
        match MessageType::try_from(code) {
            Ok(MessageType::TankWatererStats) => TankStats::decode(record).map(Self::TankStats),
            Ok(MessageType::TankWatererManual) => TankManual::decode(record).map(Self::TankManual),
            Ok(MessageType::TankWatererParameters) => {
                TankParameters::decode(record).map(Self::TankParameters)
            }
            Ok(MessageType::PotPlantStats) => {
                PotPlantStats::decode(record).map(Self::PotPlantStats)
            }
            _ => Err(TelemetryError::UnknownType(code)),
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Self::TankStats(_) => MessageType::TankWatererStats,
            Self::TankManual(_) => MessageType::TankWatererManual,
            Self::TankParameters(_) => MessageType::TankWatererParameters,
            Self::PotPlantStats(_) => MessageType::PotPlantStats,
        }
    }

    pub fn device_class(&self) -> DeviceClass {
        match self {
            Self::PotPlantStats(_) => DeviceClass::PotPlant,
            _ => DeviceClass::TankWaterer,
        }
    }

    /// Last topic segment for this record.
    pub fn topic_suffix(&self) -> &'static str {
        match self {
            Self::TankStats(_) | Self::PotPlantStats(_) => "info",
            Self::TankManual(_) => "manual",
            Self::TankParameters(_) => "parameters",
        }
    }
}
