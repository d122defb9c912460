use xbeelink_frame::request::DEFAULT_RADIUS;

/// Topic layout and radio defaults for a [`Bridge`](crate::Bridge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Prefix of outbound telemetry topics.
    pub telemetry_prefix: String,
    /// Prefix of inbound command topics.
    pub command_prefix: String,
    /// Device class accepted in command topics.
    pub device_class: String,
    /// Hop limit for command transmissions.
    pub default_radius: u8,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            telemetry_prefix: "/tele".to_string(),
            command_prefix: "/cmd".to_string(),
            device_class: "TankWaterer".to_string(),
            default_radius: DEFAULT_RADIUS,
        }
    }
}
