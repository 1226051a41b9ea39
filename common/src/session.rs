use anyhow::Result;
use log::{debug, info, warn};

use crate::dispatch::CommandTable;
use crate::ports::{BridgeContext, ClimateSensor, CommandPin, IrTransmit, MessageChannel};
use crate::topics::{COMMAND_TOPICS, TOPIC_SENSOR_HUMIDITY, TOPIC_SENSOR_TEMP};

/// Drives one cooperative scheduling turn at a time.
///
/// The controller owns the sampling clock and the command table; every
/// platform (host simulation, device) runs the same `tick` in its own loop
/// with its own notion of "now".
pub struct SessionController {
    table: CommandTable,
    sampling_interval_ms: u64,
    last_sample_ms: u64,
}

impl SessionController {
    /// `sampling_interval_ms` comes from the sensor's minimum sampling
    /// period, queried once at start-up. The clock starts one full interval
    /// in the past so the first tick samples immediately.
    pub fn new(sampling_interval_ms: u64, now_ms: u64) -> Self {
        Self {
            table: CommandTable::new(),
            sampling_interval_ms,
            last_sample_ms: now_ms.saturating_sub(sampling_interval_ms),
        }
    }

    /// Register interest in every command topic, in fixed order.
    pub fn subscribe_all<C: MessageChannel>(channel: &mut C) -> Result<()> {
        for topic in COMMAND_TOPICS {
            channel.subscribe(topic)?;
        }
        Ok(())
    }

    /// One loop iteration: service pending messages, then sample the sensor
    /// if the interval has elapsed. Never blocks beyond what the channel's
    /// own drain takes; failures are logged and the loop moves on.
    pub fn tick<C, I, P, S>(&mut self, ctx: &mut BridgeContext<C, I, P, S>, now_ms: u64)
    where
        C: MessageChannel,
        I: IrTransmit,
        P: CommandPin,
        S: ClimateSensor,
    {
        for message in ctx.channel.drain() {
            info!(
                "message arrived on `{}`: `{}`",
                message.topic, message.payload
            );
            if let Err(err) = self.table.dispatch(ctx, &message) {
                warn!("command on `{}` failed: {err:#}", message.topic);
            }
        }

        if now_ms.saturating_sub(self.last_sample_ms) >= self.sampling_interval_ms {
            self.sample_and_publish(ctx);
            // A failed sample waits out the full interval like any other.
            self.last_sample_ms = now_ms;
        }
    }

    fn sample_and_publish<C, I, P, S>(&mut self, ctx: &mut BridgeContext<C, I, P, S>)
    where
        C: MessageChannel,
        S: ClimateSensor,
    {
        let reading = ctx.sensor.sample();

        if !reading.is_ok() {
            debug!("dropping sensor reading: {}", reading.status.as_str());
            return;
        }

        info!("{}%RH | {}*C", reading.humidity, reading.temperature);

        if let Err(err) =
            ctx.channel
                .publish(TOPIC_SENSOR_HUMIDITY, &reading.humidity.to_string(), true)
        {
            warn!("humidity publish failed: {err:#}");
        }
        if let Err(err) =
            ctx.channel
                .publish(TOPIC_SENSOR_TEMP, &reading.temperature.to_string(), true)
        {
            warn!("temperature publish failed: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::codes::{transmit_order, RemoteCommand, NEC_BIT_LENGTH};
    use crate::testutil::test_context;
    use crate::topics::{TOPIC_CMD_LED, TOPIC_CMD_MUTE, TOPIC_CMD_POWER};
    use crate::types::{InboundMessage, PinLevel, SensorReading, SensorStatus};

    const INTERVAL_MS: u64 = 2_000;

    #[test]
    fn first_tick_samples_and_publishes_two_retained_values() {
        let mut ctx = test_context();
        ctx.sensor.readings.push_back(SensorReading::ok(42, 21));
        let mut session = SessionController::new(INTERVAL_MS, 10_000);

        session.tick(&mut ctx, 10_000);

        assert_eq!(ctx.sensor.polls, 1);
        assert_eq!(
            ctx.channel.published,
            vec![
                (TOPIC_SENSOR_HUMIDITY.to_string(), "42".to_string(), true),
                (TOPIC_SENSOR_TEMP.to_string(), "21".to_string(), true),
            ]
        );
    }

    #[test]
    fn sampling_respects_the_minimum_interval() {
        let mut ctx = test_context();
        for _ in 0..8 {
            ctx.sensor.readings.push_back(SensorReading::ok(40, 20));
        }
        let mut session = SessionController::new(INTERVAL_MS, 10_000);

        // Dense ticks every 500 ms from 10000 to 14000.
        for step in 0..=8 {
            session.tick(&mut ctx, 10_000 + step * 500);
        }

        // Sampled at 10000, 12000 and 14000 only.
        assert_eq!(ctx.sensor.polls, 3);
        assert_eq!(ctx.channel.published.len(), 6);
    }

    #[test]
    fn failed_reading_publishes_nothing_but_advances_the_clock() {
        let mut ctx = test_context();
        ctx.sensor
            .readings
            .push_back(SensorReading::failed(SensorStatus::Error));
        ctx.sensor.readings.push_back(SensorReading::ok(40, 20));
        let mut session = SessionController::new(INTERVAL_MS, 10_000);

        session.tick(&mut ctx, 10_000);
        assert_eq!(ctx.sensor.polls, 1);
        assert!(ctx.channel.published.is_empty());

        // The failed attempt is not retried early.
        session.tick(&mut ctx, 10_000 + INTERVAL_MS - 1);
        assert_eq!(ctx.sensor.polls, 1);

        session.tick(&mut ctx, 10_000 + INTERVAL_MS);
        assert_eq!(ctx.sensor.polls, 2);
        assert_eq!(ctx.channel.published.len(), 2);
    }

    #[test]
    fn timeout_reading_is_dropped_like_an_error() {
        let mut ctx = test_context();
        ctx.sensor
            .readings
            .push_back(SensorReading::failed(SensorStatus::Timeout));
        let mut session = SessionController::new(INTERVAL_MS, 10_000);

        session.tick(&mut ctx, 10_000);

        assert_eq!(ctx.sensor.polls, 1);
        assert!(ctx.channel.published.is_empty());
    }

    #[test]
    fn drained_messages_are_dispatched_in_delivery_order() {
        let mut ctx = test_context();
        ctx.channel
            .pending
            .push(InboundMessage::new(TOPIC_CMD_POWER, ""));
        ctx.channel
            .pending
            .push(InboundMessage::new(TOPIC_CMD_LED, "on"));
        ctx.channel
            .pending
            .push(InboundMessage::new(TOPIC_CMD_MUTE, ""));
        let mut session = SessionController::new(INTERVAL_MS, 10_000);

        // Sampling is not due yet; only the drained commands run.
        session.tick(&mut ctx, 10_000 + INTERVAL_MS / 2);

        assert_eq!(
            ctx.ir.sent,
            vec![
                (
                    transmit_order(RemoteCommand::Power.raw_code()),
                    NEC_BIT_LENGTH
                ),
                (
                    transmit_order(RemoteCommand::Mute.raw_code()),
                    NEC_BIT_LENGTH
                ),
            ]
        );
        assert_eq!(ctx.led.writes, vec![PinLevel::Low]);
    }

    #[test]
    fn messages_and_sampling_share_one_iteration() {
        let mut ctx = test_context();
        ctx.channel
            .pending
            .push(InboundMessage::new(TOPIC_CMD_LED, "off"));
        ctx.sensor.readings.push_back(SensorReading::ok(55, 19));
        let mut session = SessionController::new(INTERVAL_MS, 10_000);

        session.tick(&mut ctx, 10_000 + INTERVAL_MS);

        assert_eq!(ctx.led.writes, vec![PinLevel::High]);
        assert_eq!(ctx.sensor.polls, 1);
        assert_eq!(ctx.channel.published.len(), 2);
    }

    #[test]
    fn subscribe_all_registers_every_command_topic_in_order() {
        let mut ctx = test_context();

        SessionController::subscribe_all(&mut ctx.channel).unwrap();

        assert_eq!(
            ctx.channel.subscribed,
            COMMAND_TOPICS
                .iter()
                .map(|topic| topic.to_string())
                .collect::<Vec<_>>()
        );
    }
}
