use serde::{Deserialize, Serialize};

/// One message pulled off the messaging channel. Constructed and consumed
/// within a single loop iteration, never retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: String,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Logical level of the command output pin. The LED is wired active-low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SensorStatus {
    Ok,
    Error,
    Timeout,
}

impl SensorStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Error => "ERROR",
            Self::Timeout => "TIMEOUT",
        }
    }
}

/// One sample attempt from the climate sensor. Humidity and temperature are
/// only meaningful when `status` is [`SensorStatus::Ok`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorReading {
    pub humidity: i32,
    pub temperature: i32,
    pub status: SensorStatus,
}

impl SensorReading {
    pub fn ok(humidity: i32, temperature: i32) -> Self {
        Self {
            humidity,
            temperature,
            status: SensorStatus::Ok,
        }
    }

    pub fn failed(status: SensorStatus) -> Self {
        Self {
            humidity: 0,
            temperature: 0,
            status,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == SensorStatus::Ok
    }
}
