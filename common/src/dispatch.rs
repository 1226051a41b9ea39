use anyhow::Result;
use log::{debug, info};

use crate::codes::{RemoteCommand, NEC_BIT_LENGTH};
use crate::ports::{BridgeContext, CommandPin, IrTransmit};
use crate::topics::{
    TOPIC_CMD_EFFECT, TOPIC_CMD_INPUT, TOPIC_CMD_LED, TOPIC_CMD_LEVEL, TOPIC_CMD_MINUS,
    TOPIC_CMD_MUTE, TOPIC_CMD_PLUS, TOPIC_CMD_POWER,
};
use crate::types::{InboundMessage, PinLevel};

/// The single effect a recognized message produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    SetLed(PinLevel),
    SendIr(RemoteCommand),
}

const IR_TOPIC_MAP: &[(&str, RemoteCommand)] = &[
    (TOPIC_CMD_POWER, RemoteCommand::Power),
    (TOPIC_CMD_INPUT, RemoteCommand::Input),
    (TOPIC_CMD_MUTE, RemoteCommand::Mute),
    (TOPIC_CMD_LEVEL, RemoteCommand::Level),
    (TOPIC_CMD_MINUS, RemoteCommand::VolumeDown),
    (TOPIC_CMD_PLUS, RemoteCommand::VolumeUp),
    (TOPIC_CMD_EFFECT, RemoteCommand::Effect),
];

/// Immutable topic → action mapping, fixed at build time.
pub struct CommandTable {
    ir_topics: &'static [(&'static str, RemoteCommand)],
}

impl CommandTable {
    pub fn new() -> Self {
        Self {
            ir_topics: IR_TOPIC_MAP,
        }
    }

    /// Resolve a message to its action, or `None` when the topic is
    /// unrecognized or an LED payload is neither "on" nor "off". Unmatched
    /// messages are dropped without an error.
    pub fn resolve(&self, topic: &str, payload: &str) -> Option<CommandAction> {
        if topic == TOPIC_CMD_LED {
            return match payload {
                "on" => Some(CommandAction::SetLed(PinLevel::Low)),
                "off" => Some(CommandAction::SetLed(PinLevel::High)),
                _ => None,
            };
        }

        // IR topics fire on any payload; the message itself is the trigger.
        self.ir_topics
            .iter()
            .find(|(candidate, _)| *candidate == topic)
            .map(|(_, command)| CommandAction::SendIr(*command))
    }

    /// Execute exactly one pin write or one IR transmission for a
    /// recognized message, nothing for anything else.
    pub fn dispatch<C, I, P, S>(
        &self,
        ctx: &mut BridgeContext<C, I, P, S>,
        message: &InboundMessage,
    ) -> Result<()>
    where
        I: IrTransmit,
        P: CommandPin,
    {
        match self.resolve(&message.topic, &message.payload) {
            Some(CommandAction::SetLed(level)) => ctx.led.write(level),
            Some(CommandAction::SendIr(command)) => {
                info!("sending {} frame", command.as_str());
                ctx.ir.send_nec(command.transmit_code(), NEC_BIT_LENGTH)
            }
            None => {
                debug!(
                    "ignoring message on `{}` with payload `{}`",
                    message.topic, message.payload
                );
                Ok(())
            }
        }
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::codes::transmit_order;
    use crate::testutil::test_context;
    use crate::topics::COMMAND_TOPICS;

    #[test]
    fn led_on_drives_pin_low_without_ir() {
        let table = CommandTable::new();
        let mut ctx = test_context();

        table
            .dispatch(&mut ctx, &InboundMessage::new(TOPIC_CMD_LED, "on"))
            .unwrap();

        assert_eq!(ctx.led.writes, vec![PinLevel::Low]);
        assert!(ctx.ir.sent.is_empty());
    }

    #[test]
    fn led_off_drives_pin_high() {
        let table = CommandTable::new();
        let mut ctx = test_context();

        table
            .dispatch(&mut ctx, &InboundMessage::new(TOPIC_CMD_LED, "off"))
            .unwrap();

        assert_eq!(ctx.led.writes, vec![PinLevel::High]);
        assert!(ctx.ir.sent.is_empty());
    }

    #[test]
    fn led_ignores_unexpected_payloads() {
        let table = CommandTable::new();
        let mut ctx = test_context();

        for payload in ["ON", "toggle", "", "on "] {
            table
                .dispatch(&mut ctx, &InboundMessage::new(TOPIC_CMD_LED, payload))
                .unwrap();
        }

        assert!(ctx.led.writes.is_empty());
        assert!(ctx.ir.sent.is_empty());
    }

    #[test]
    fn power_topic_sends_encoded_code_for_any_payload() {
        let table = CommandTable::new();
        let mut ctx = test_context();

        table
            .dispatch(&mut ctx, &InboundMessage::new(TOPIC_CMD_POWER, "whatever"))
            .unwrap();

        assert_eq!(
            ctx.ir.sent,
            vec![(transmit_order(0x02A0_807F), NEC_BIT_LENGTH)]
        );
        assert!(ctx.led.writes.is_empty());
    }

    #[test]
    fn every_ir_topic_maps_to_its_command() {
        let table = CommandTable::new();
        let expected = [
            (TOPIC_CMD_POWER, RemoteCommand::Power),
            (TOPIC_CMD_INPUT, RemoteCommand::Input),
            (TOPIC_CMD_MUTE, RemoteCommand::Mute),
            (TOPIC_CMD_LEVEL, RemoteCommand::Level),
            (TOPIC_CMD_MINUS, RemoteCommand::VolumeDown),
            (TOPIC_CMD_PLUS, RemoteCommand::VolumeUp),
            (TOPIC_CMD_EFFECT, RemoteCommand::Effect),
        ];

        for (topic, command) in expected {
            assert_eq!(
                table.resolve(topic, ""),
                Some(CommandAction::SendIr(command)),
                "{topic}"
            );
        }
    }

    #[test]
    fn every_subscribed_topic_except_led_resolves_to_ir() {
        let table = CommandTable::new();

        for topic in COMMAND_TOPICS {
            if topic == TOPIC_CMD_LED {
                continue;
            }
            assert!(
                matches!(table.resolve(topic, "x"), Some(CommandAction::SendIr(_))),
                "{topic}"
            );
        }
    }

    #[test]
    fn unknown_topic_is_a_silent_no_op() {
        let table = CommandTable::new();
        let mut ctx = test_context();

        table
            .dispatch(
                &mut ctx,
                &InboundMessage::new("logitech-remote/unknown", "x"),
            )
            .unwrap();
        table
            .dispatch(&mut ctx, &InboundMessage::new("other/topic", "on"))
            .unwrap();

        assert!(ctx.led.writes.is_empty());
        assert!(ctx.ir.sent.is_empty());
    }
}
