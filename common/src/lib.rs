pub mod codes;
pub mod config;
pub mod dispatch;
pub mod ports;
pub mod session;
pub mod topics;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use codes::{transmit_order, RemoteCommand, NEC_BIT_LENGTH};
pub use config::{BridgeConfig, HardwareConfig, NetworkConfig, MQTT_CLIENT_ID};
pub use dispatch::{CommandAction, CommandTable};
pub use ports::{BridgeContext, ClimateSensor, CommandPin, IrTransmit, MessageChannel};
pub use session::SessionController;
pub use topics::*;
pub use types::{InboundMessage, PinLevel, SensorReading, SensorStatus};
