//! Mapping between bus topics and radio addresses.

use xbeelink_frame::Address64;

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::telemetry::Telemetry;

/// A parsed `{prefix}/{class}/{address}/{command}` topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTopic {
    pub address: Address64,
    pub command: String,
}

impl CommandTopic {
    pub fn parse(topic: &str, config: &BridgeConfig) -> Result<Self> {
        let invalid = |reason: String| BridgeError::InvalidTopic {
            topic: topic.to_string(),
            reason,
        };

        let rest = topic
            .strip_prefix(config.command_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| invalid(format!("expected prefix {}", config.command_prefix)))?;

        let segments: Vec<&str> = rest.split('/').collect();
        let [class, address, command] = segments[..] else {
            return Err(invalid("expected {class}/{address}/{command}".to_string()));
        };
        if class != config.device_class {
            return Err(invalid(format!("unexpected device class {class:?}")));
        }
        if command.is_empty() {
            return Err(invalid("empty command".to_string()));
        }
        let address = address
            .parse::<Address64>()
            .map_err(|err| invalid(err.to_string()))?;

        Ok(Self {
            address,
            command: command.to_string(),
        })
    }
}

/// Topic a decoded record from `source` is published on.
pub fn telemetry_topic(config: &BridgeConfig, source: Address64, telemetry: &Telemetry) -> String {
    format!(
        "{}/{}/{}/{}",
        config.telemetry_prefix,
        telemetry.device_class().as_str(),
        source,
        telemetry.topic_suffix()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TankManual;

    #[test]
    fn parses_command_topic() {
        let config = BridgeConfig::default();
        let topic = CommandTopic::parse("/cmd/TankWaterer/0013A2004127CE89/SetValve", &config).unwrap();
        assert_eq!(topic.address, Address64::new(0x0013_A200_4127_CE89));
        assert_eq!(topic.command, "SetValve");
    }

    #[test]
    fn rejects_malformed_topics() {
        let config = BridgeConfig::default();
        for topic in [
            "/tele/TankWaterer/0013A2004127CE89/SetValve",
            "/cmd/PotPlant/0013A2004127CE89/SetValve",
            "/cmd/TankWaterer/not-hex/SetValve",
            "/cmd/TankWaterer/+FFFF/query",
            "/cmd/TankWaterer/0013A2004127CE89",
            "/cmd/TankWaterer/0013A2004127CE89/",
            "/cmd/TankWaterer/0013A2004127CE89/a/b",
            "/cmdTankWaterer/0013A2004127CE89/SetValve",
        ] {
            assert!(
                matches!(
                    CommandTopic::parse(topic, &config),
                    Err(BridgeError::InvalidTopic { .. })
                ),
                "{topic}"
            );
        }
    }

    #[test]
    fn custom_prefix() {
        let config = BridgeConfig {
            command_prefix: "home/cmd".to_string(),
            device_class: "PotPlant".to_string(),
            ..BridgeConfig::default()
        };
        let topic = CommandTopic::parse("home/cmd/PotPlant/FFFF/query", &config).unwrap();
        assert_eq!(topic.address, Address64::new(0xFFFF));
    }

    #[test]
    fn telemetry_topic_layout() {
        let topic = telemetry_topic(
            &BridgeConfig::default(),
            Address64::new(0x0013_A200_4127_CE89),
            &Telemetry::TankManual(TankManual { valve_open: false }),
        );
        assert_eq!(topic, "/tele/TankWaterer/0013A2004127CE89/manual");
    }
}
