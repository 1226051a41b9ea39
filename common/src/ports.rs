//! Collaborator interfaces the session loop drives.
//!
//! Each trait is the boundary to a platform facility (broker connection,
//! RMT transmitter, GPIO, DHT line). The loop never sees the concrete
//! driver, which is what lets the whole core run against recorded fakes.

use anyhow::Result;

use crate::types::{InboundMessage, PinLevel, SensorReading};

/// Publish/subscribe messaging collaborator.
///
/// Delivery is poll-based: `drain` hands back whatever arrived since the
/// previous call, in arrival order, and must return promptly without
/// waiting for the network.
pub trait MessageChannel {
    fn drain(&mut self) -> Vec<InboundMessage>;

    fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> Result<()>;

    fn subscribe(&mut self, topic: &str) -> Result<()>;
}

/// Fire-and-forget infrared transmit primitive.
pub trait IrTransmit {
    fn send_nec(&mut self, code: u32, bits: u8) -> Result<()>;
}

/// Digital output pin driven by LED commands.
pub trait CommandPin {
    fn write(&mut self, level: PinLevel) -> Result<()>;
}

/// Climate sensor collaborator.
///
/// A sample attempt never fails at the call level; acquisition problems are
/// reported through the reading's status so the caller can drop the value
/// without special-casing transport errors.
pub trait ClimateSensor {
    /// Shortest allowed spacing between sample attempts. Queried once at
    /// start-up.
    fn minimum_sampling_period_ms(&self) -> u64;

    fn sample(&mut self) -> SensorReading;
}

/// Owned bundle of every collaborator the bridge talks to.
///
/// There is exactly one of these per process; passing it explicitly keeps
/// the dispatch and session code free of globals.
pub struct BridgeContext<C, I, P, S> {
    pub channel: C,
    pub ir: I,
    pub led: P,
    pub sensor: S,
}
