/// Failures decoding a sensor record received from a device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TelemetryError {
    /// The payload was empty, so it carried no message type.
    #[error("empty telemetry payload")]
    Empty,

    /// The record ended before its fixed layout.
    #[error("{kind} record needs {expected} bytes, got {actual}")]
    Truncated {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The message type byte is not a telemetry record.
    #[error("unknown telemetry message type {0}")]
    UnknownType(u8),
}

/// Failures building a device command from a bus message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    /// The command name in the topic is not known.
    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    /// The body is not a JSON object.
    #[error("command body must be a JSON object")]
    NotAnObject,

    /// A required field is absent.
    #[error("missing field {0:?}")]
    MissingField(&'static str),

    /// A field has the wrong JSON type.
    #[error("field {field:?} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    /// A field's value does not fit the wire encoding.
    #[error("field {field:?} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
}

/// Errors raised by the bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The topic does not have the expected command shape.
    #[error("invalid command topic {topic:?}: {reason}")]
    InvalidTopic { topic: String, reason: String },

    /// The command body failed validation.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// JSON parse or render failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The publisher rejected a publication.
    #[error("publish failed: {0}")]
    Publish(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
