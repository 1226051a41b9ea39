//! Recording fakes for the collaborator ports, shared by the unit tests.

use std::collections::VecDeque;

use anyhow::Result;

use crate::ports::{BridgeContext, ClimateSensor, CommandPin, IrTransmit, MessageChannel};
use crate::types::{InboundMessage, PinLevel, SensorReading};

#[derive(Default)]
pub struct RecordingChannel {
    pub pending: Vec<InboundMessage>,
    pub published: Vec<(String, String, bool)>,
    pub subscribed: Vec<String>,
}

impl MessageChannel for RecordingChannel {
    fn drain(&mut self) -> Vec<InboundMessage> {
        std::mem::take(&mut self.pending)
    }

    fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> Result<()> {
        self.published
            .push((topic.to_string(), payload.to_string(), retain));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<()> {
        self.subscribed.push(topic.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingIr {
    pub sent: Vec<(u32, u8)>,
}

impl IrTransmit for RecordingIr {
    fn send_nec(&mut self, code: u32, bits: u8) -> Result<()> {
        self.sent.push((code, bits));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPin {
    pub writes: Vec<PinLevel>,
}

impl CommandPin for RecordingPin {
    fn write(&mut self, level: PinLevel) -> Result<()> {
        self.writes.push(level);
        Ok(())
    }
}

/// Replays queued readings in order; falls back to a fixed OK reading once
/// the script runs dry.
pub struct ScriptedSensor {
    pub min_period_ms: u64,
    pub readings: VecDeque<SensorReading>,
    pub polls: u32,
}

impl Default for ScriptedSensor {
    fn default() -> Self {
        Self {
            min_period_ms: 2_000,
            readings: VecDeque::new(),
            polls: 0,
        }
    }
}

impl ClimateSensor for ScriptedSensor {
    fn minimum_sampling_period_ms(&self) -> u64 {
        self.min_period_ms
    }

    fn sample(&mut self) -> SensorReading {
        self.polls += 1;
        self.readings
            .pop_front()
            .unwrap_or_else(|| SensorReading::ok(50, 20))
    }
}

pub fn test_context() -> BridgeContext<RecordingChannel, RecordingIr, RecordingPin, ScriptedSensor> {
    BridgeContext {
        channel: RecordingChannel::default(),
        ir: RecordingIr::default(),
        led: RecordingPin::default(),
        sensor: ScriptedSensor::default(),
    }
}
