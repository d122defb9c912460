use bytes::{BufMut, Bytes, BytesMut};
use serde_json::{Map, Value};

use crate::error::CommandError;
use crate::message::MessageType;
use crate::telemetry::TankParameters;

type Result<T> = std::result::Result<T, CommandError>;

/// A command for a device, decoded from a bus message.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetValve { open: bool },
    Water { litres: u16 },
    SetParameters(TankParameters),
    Query,
    QueryParameters,
    ResetCounters,
    /// Target temperature in tenths of a degree.
    SetTemperature { tenths: i16 },
}

impl Command {
    /// Decode a command body for the named command kind.
    ///
    /// `kind` is matched case-insensitively. Commands without fields accept
    /// any object or `null`.
    pub fn decode(kind: &str, body: &Value) -> Result<Self> {
        match kind.to_ascii_lowercase().as_str() {
            "setvalve" => Ok(Self::SetValve {
                open: get_bool(object(body)?, "ValveOpen")?,
            }),
            "water" => Ok(Self::Water {
                litres: get_u16(object(body)?, "Litres")?,
            }),
            "setparameters" => {
                let fields = object(body)?;
                Ok(Self::SetParameters(TankParameters {
                    auto_vent: get_bool(fields, "AutoVent")?,
                    auto_depth: get_bool(fields, "AutoDepth")?,
                    valve_timeout: get_u16(fields, "ValveTimeOut")?,
                    tank_depth: get_u16(fields, "TankDepth")?,
                    surface_area: get_u16(fields, "SurfaceArea")?,
                    sensor_distance: get_u16(fields, "SensorDistance")?,
                    pulses_per_litre: get_u16(fields, "PulsesPerLitre")?,
                    auto_vent_time: get_u16(fields, "AutoVentTime")?,
                    max_valve_open_time: get_u16(fields, "MaxValveOpenTime")?,
                }))
            }
            "query" => no_fields(body).map(|()| Self::Query),
            "queryparameters" => no_fields(body).map(|()| Self::QueryParameters),
            "resetcounters" => no_fields(body).map(|()| Self::ResetCounters),
            "settemperature" => Ok(Self::SetTemperature {
                tenths: get_tenths(object(body)?, "Temperature")?,
            }),
            _ => Err(CommandError::UnknownCommand(kind.to_string())),
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Self::SetValve { .. } => MessageType::SetValve,
            Self::Water { .. } => MessageType::Water,
            Self::SetParameters(_) => MessageType::SetParameters,
            Self::Query => MessageType::QueryStats,
            Self::QueryParameters => MessageType::QueryParameters,
            Self::ResetCounters => MessageType::ResetCounters,
            Self::SetTemperature { .. } => MessageType::SetTemperature,
        }
    }

    /// Render the radio payload: message type byte, then little-endian fields.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(1 + TankParameters::LEN);
        buf.put_u8(self.message_type().code());
        match self {
            Self::SetValve { open } => buf.put_u8(u8::from(*open)),
            Self::Water { litres } => buf.put_u16_le(*litres),
            Self::SetParameters(params) => params.encode(&mut buf),
            Self::SetTemperature { tenths } => buf.put_i16_le(*tenths),
            Self::Query | Self::QueryParameters | Self::ResetCounters => {}
        }
        buf.freeze()
    }
}

fn object(body: &Value) -> Result<&Map<String, Value>> {
    body.as_object().ok_or(CommandError::NotAnObject)
}

fn no_fields(body: &Value) -> Result<()> {
    match body {
        Value::Null | Value::Object(_) => Ok(()),
        _ => Err(CommandError::NotAnObject),
    }
}

fn field<'a>(fields: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value> {
    fields.get(name).ok_or(CommandError::MissingField(name))
}

fn get_bool(fields: &Map<String, Value>, name: &'static str) -> Result<bool> {
    field(fields, name)?
        .as_bool()
        .ok_or(CommandError::WrongType {
            field: name,
            expected: "a boolean",
        })
}

fn get_u16(fields: &Map<String, Value>, name: &'static str) -> Result<u16> {
    let value = field(fields, name)?;
    if let Some(n) = value.as_u64() {
        return u16::try_from(n).map_err(|_| CommandError::OutOfRange {
            field: name,
            value: n.to_string(),
        });
    }
    if value.is_number() {
        return Err(CommandError::OutOfRange {
            field: name,
            value: value.to_string(),
        });
    }
    Err(CommandError::WrongType {
        field: name,
        expected: "an integer",
    })
}

fn get_tenths(fields: &Map<String, Value>, name: &'static str) -> Result<i16> {
    let value = field(fields, name)?;
    let n = value.as_f64().ok_or(CommandError::WrongType {
        field: name,
        expected: "a number",
    })?;
    let tenths = (n * 10.0).round();
    if !(f64::from(i16::MIN)..=f64::from(i16::MAX)).contains(&tenths) {
        return Err(CommandError::OutOfRange {
            field: name,
            value: value.to_string(),
        });
    }
    Ok(tenths as i16)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn valve_and_water() {
        let valve = Command::decode("SetValve", &json!({"ValveOpen": true})).unwrap();
        assert_eq!(valve.encode().as_ref(), &[53, 1]);

        let water = Command::decode("water", &json!({"Litres": 300})).unwrap();
        assert_eq!(water, Command::Water { litres: 300 });
        assert_eq!(water.encode().as_ref(), &[54, 0x2C, 0x01]);
    }

    #[test]
    fn field_less_commands() {
        assert_eq!(
            Command::decode("QUERY", &Value::Null).unwrap().encode().as_ref(),
            &[50]
        );
        assert_eq!(
            Command::decode("queryparameters", &json!({})).unwrap().encode().as_ref(),
            &[51]
        );
        assert_eq!(
            Command::decode("ResetCounters", &json!({"ignored": 1}))
                .unwrap()
                .encode()
                .as_ref(),
            &[52]
        );
        assert_eq!(
            Command::decode("query", &json!([1])),
            Err(CommandError::NotAnObject)
        );
    }

    #[test]
    fn set_temperature_rounds_to_tenths() {
        let cmd = Command::decode("SetTemperature", &json!({"Temperature": 21.46})).unwrap();
        assert_eq!(cmd, Command::SetTemperature { tenths: 215 });
        assert_eq!(cmd.encode().as_ref(), &[56, 0xD7, 0x00]);

        let cold = Command::decode("settemperature", &json!({"Temperature": -1.0})).unwrap();
        assert_eq!(cold.encode().as_ref(), &[56, 0xF6, 0xFF]);

        assert!(matches!(
            Command::decode("settemperature", &json!({"Temperature": 5000.0})),
            Err(CommandError::OutOfRange { field: "Temperature", .. })
        ));
    }

    #[test]
    fn set_parameters_layout() {
        let body = json!({
            "AutoVent": true,
            "AutoDepth": false,
            "ValveTimeOut": 600,
            "TankDepth": 1200,
            "SurfaceArea": 3,
            "SensorDistance": 40,
            "PulsesPerLitre": 450,
            "AutoVentTime": 10,
            "MaxValveOpenTime": 900,
        });
        let bytes = Command::decode("setparameters", &body).unwrap().encode();
        assert_eq!(bytes.len(), 17);
        assert_eq!(&bytes[..5], &[55, 1, 0, 0x58, 0x02]);
        assert_eq!(&bytes[15..], &[0x84, 0x03]);
    }

    #[test]
    fn validation_errors() {
        assert_eq!(
            Command::decode("setvalve", &json!({})),
            Err(CommandError::MissingField("ValveOpen"))
        );
        assert_eq!(
            Command::decode("setvalve", &json!({"ValveOpen": 1})),
            Err(CommandError::WrongType {
                field: "ValveOpen",
                expected: "a boolean"
            })
        );
        assert!(matches!(
            Command::decode("water", &json!({"Litres": 70000})),
            Err(CommandError::OutOfRange { field: "Litres", .. })
        ));
        assert!(matches!(
            Command::decode("water", &json!({"Litres": -1})),
            Err(CommandError::OutOfRange { field: "Litres", .. })
        ));
        assert_eq!(
            Command::decode("water", &json!({"Litres": "10"})),
            Err(CommandError::WrongType {
                field: "Litres",
                expected: "an integer"
            })
        );
        assert_eq!(
            Command::decode("explode", &json!({})),
            Err(CommandError::UnknownCommand("explode".into()))
        );
    }
}
