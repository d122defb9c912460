//! Bridge between XBee radios and a topic-based message bus.
//!
//! Devices send small little-endian records inside extended data frames.
//! [`Bridge::handle_response`] turns those into JSON [`Publication`]s on
//! `{prefix}/{class}/{address}/{kind}` topics, and [`Bridge::command_request`]
//! turns a command topic plus JSON body back into a radio request.
//! The bus client itself is not part of this crate; it plugs in through
//! [`Publisher`].

pub mod bridge;
pub mod command;
pub mod config;
pub mod error;
pub mod message;
pub mod telemetry;
pub mod topic;

pub use bridge::{Bridge, BridgeEvent, MemoryPublisher, Publication, Publisher};
pub use command::Command;
pub use config::BridgeConfig;
pub use error::{BridgeError, CommandError, Result, TelemetryError};
pub use message::MessageType;
pub use telemetry::{
    DeviceClass, PotPlantStats, TankManual, TankParameters, TankStats, Telemetry,
};
pub use topic::{telemetry_topic, CommandTopic};
