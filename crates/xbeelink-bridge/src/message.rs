/// First byte of every device payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    TankWatererStats = 1,
    TankWatererManual = 2,
    TankWatererParameters = 3,
    PotPlantStats = 10,
    QueryStats = 50,
    QueryParameters = 51,
    ResetCounters = 52,
    SetValve = 53,
    Water = 54,
    SetParameters = 55,
    SetTemperature = 56,
}

impl MessageType {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns true for records a device sends to the host.
    pub fn is_telemetry(self) -> bool {
        self.code() < 50
    }
}

impl TryFrom<u8> for MessageType {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, u8> {
        Ok(match code {
            1 => Self::TankWatererStats,
            2 => Self::TankWatererManual,
            3 => Self::TankWatererParameters,
            10 => Self::PotPlantStats,
            50 => Self::QueryStats,
            51 => Self::QueryParameters,
            52 => Self::ResetCounters,
            53 => Self::SetValve,
            54 => Self::Water,
            55 => Self::SetParameters,
            56 => Self::SetTemperature,
            other => return Err(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 0..=u8::MAX {
            if let Ok(kind) = MessageType::try_from(code) {
                assert_eq!(kind.code(), code);
            }
        }
        assert_eq!(MessageType::try_from(4), Err(4));
    }

    #[test]
    fn direction() {
        assert!(MessageType::PotPlantStats.is_telemetry());
        assert!(!MessageType::SetValve.is_telemetry());
    }
}
