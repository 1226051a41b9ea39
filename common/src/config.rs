use serde::{Deserialize, Serialize};

/// MQTT client identifier presented to the broker.
pub const MQTT_CLIENT_ID: &str = "esp-remote-bridge";

/// Network association and broker parameters. Everything here is fixed at
/// compile time; credentials are injected through build-environment
/// variables so they never live in the source tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub wifi_ssid: String,
    pub wifi_pass: String,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_user: String,
    pub mqtt_pass: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: option_env!("WIFI_SSID").unwrap_or("").to_string(),
            wifi_pass: option_env!("WIFI_PASSWORD").unwrap_or("").to_string(),
            mqtt_host: "192.168.0.100".to_string(),
            mqtt_port: 1883,
            mqtt_user: option_env!("MQTT_USER").unwrap_or("").to_string(),
            mqtt_pass: option_env!("MQTT_PASSWORD").unwrap_or("").to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HardwareConfig {
    pub led_pin: i32,
    pub ir_tx_pin: i32,
    pub dht_pin: i32,
    pub rmt_channel: u8,
    pub carrier_khz: u32,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            led_pin: 2,
            ir_tx_pin: 4,
            dht_pin: 5,
            rmt_channel: 0,
            carrier_khz: 38,
        }
    }
}

impl HardwareConfig {
    pub fn sanitize(&mut self) {
        if self.led_pin < 0 {
            self.led_pin = 2;
        }

        if self.ir_tx_pin < 0 {
            self.ir_tx_pin = 4;
        }

        if self.dht_pin < 0 {
            self.dht_pin = 5;
        }

        if self.rmt_channel > 7 {
            self.rmt_channel = 0;
        }

        self.carrier_khz = self.carrier_khz.clamp(10, 100);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub network: NetworkConfig,
    pub hardware: HardwareConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_restores_defaults_for_invalid_pins() {
        let mut hardware = HardwareConfig {
            led_pin: -1,
            ir_tx_pin: -3,
            dht_pin: -2,
            rmt_channel: 9,
            carrier_khz: 500,
        };
        hardware.sanitize();

        assert_eq!(hardware.led_pin, 2);
        assert_eq!(hardware.ir_tx_pin, 4);
        assert_eq!(hardware.dht_pin, 5);
        assert_eq!(hardware.rmt_channel, 0);
        assert_eq!(hardware.carrier_khz, 100);
    }

    #[test]
    fn sanitize_keeps_valid_values() {
        let mut hardware = HardwareConfig::default();
        hardware.sanitize();
        assert_eq!(hardware, HardwareConfig::default());
    }
}
