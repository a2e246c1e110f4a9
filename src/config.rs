// Serial line and drive defaults, plus the optional config file format
use serde::Deserialize;

use crate::motor::DEFAULT_NODE_ID;
use crate::motor::kinco::DEFAULT_BAUDRATE;
use crate::motor::units::DEFAULT_ENCODER_RESOLUTION;

// Serial port the drive is wired to
pub const MOTOR_PORT: &str = "/dev/ttyS4";

/// Drive parameters loadable from a JSON file (`--config`).
///
/// Every field is optional in the file; missing fields fall back to the
/// built-in defaults, and explicit command-line flags win over both.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub port: String,
    pub baudrate: u32,
    pub node_id: u8,
    pub encoder_resolution: u32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            port: MOTOR_PORT.to_string(),
            baudrate: DEFAULT_BAUDRATE,
            node_id: DEFAULT_NODE_ID,
            encoder_resolution: DEFAULT_ENCODER_RESOLUTION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg: DriveConfig = serde_json::from_str(r#"{"node_id": 3}"#).unwrap();
        assert_eq!(cfg.node_id, 3);
        assert_eq!(cfg.port, MOTOR_PORT);
        assert_eq!(cfg.baudrate, 38_400);
        assert_eq!(cfg.encoder_resolution, 10_000);
    }
}
