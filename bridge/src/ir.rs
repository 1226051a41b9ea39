//! NEC infrared transmitter over the ESP32 RMT peripheral.

use anyhow::Context;
use esp_idf_hal::{
    gpio::OutputPin,
    peripheral::Peripheral,
    rmt::{
        config::{CarrierConfig, DutyPercent, TransmitConfig},
        PinState, Pulse, PulseTicks, RmtChannel, TxRmtDriver, VariableLengthSignal,
    },
    units::FromValueType,
};
use log::warn;

use remote_bridge_common::IrTransmit;

// Divider 80 gives 1 µs ticks from the 80 MHz APB clock.
const IR_TICK_DIVIDER: u8 = 80;

const NEC_HDR_MARK_US: u16 = 9_000;
const NEC_HDR_SPACE_US: u16 = 4_500;
const NEC_BIT_MARK_US: u16 = 560;
const NEC_ONE_SPACE_US: u16 = 1_690;
const NEC_ZERO_SPACE_US: u16 = 560;

enum IrBackend {
    Rmt(TxRmtDriver<'static>),
    Disabled,
}

pub struct IrTransmitter {
    backend: IrBackend,
}

impl IrTransmitter {
    pub fn new<C, P>(
        channel: impl Peripheral<P = C> + 'static,
        pin: impl Peripheral<P = P> + 'static,
        carrier_khz: u32,
    ) -> anyhow::Result<Self>
    where
        C: RmtChannel,
        P: OutputPin,
    {
        let carrier = CarrierConfig::new()
            .frequency(carrier_khz.kHz().into())
            .carrier_level(PinState::High)
            .duty_percent(DutyPercent::new(33)?);

        let config = TransmitConfig::new()
            .clock_divider(IR_TICK_DIVIDER)
            .carrier(Some(carrier))
            .idle(Some(PinState::Low));

        let tx = TxRmtDriver::new(channel, pin, &config).context("failed to init RMT IR driver")?;

        Ok(Self {
            backend: IrBackend::Rmt(tx),
        })
    }

    /// Keeps the bridge serviceable when the RMT driver fails to come up;
    /// frames are dropped with a warning instead of aborting the loop.
    pub fn disabled() -> Self {
        Self {
            backend: IrBackend::Disabled,
        }
    }
}

impl IrTransmit for IrTransmitter {
    fn send_nec(&mut self, code: u32, bits: u8) -> anyhow::Result<()> {
        let tx = match &mut self.backend {
            IrBackend::Rmt(tx) => tx,
            IrBackend::Disabled => {
                warn!("IR disabled, dropping NEC frame {code:#010X}");
                return Ok(());
            }
        };

        // Header, then each bit MSB-first as mark + length-coded space,
        // then the trailing mark that closes the last space.
        let mut pulses = Vec::with_capacity(bits as usize * 2 + 3);
        pulses.push(pulse(PinState::High, NEC_HDR_MARK_US)?);
        pulses.push(pulse(PinState::Low, NEC_HDR_SPACE_US)?);

        for bit in (0..bits).rev() {
            let space = if (code >> bit) & 1 == 1 {
                NEC_ONE_SPACE_US
            } else {
                NEC_ZERO_SPACE_US
            };
            pulses.push(pulse(PinState::High, NEC_BIT_MARK_US)?);
            pulses.push(pulse(PinState::Low, space)?);
        }

        pulses.push(pulse(PinState::High, NEC_BIT_MARK_US)?);

        let pulse_refs: Vec<&Pulse> = pulses.iter().collect();
        let mut signal = VariableLengthSignal::with_capacity(pulses.len());
        signal
            .push(pulse_refs)
            .context("failed to convert NEC frame to RMT signal")?;

        tx.start_blocking(&signal)
            .context("failed to transmit NEC frame over RMT")?;

        Ok(())
    }
}

fn pulse(level: PinState, duration_us: u16) -> anyhow::Result<Pulse> {
    Ok(Pulse::new(
        level,
        PulseTicks::new(duration_us).context("invalid IR pulse duration")?,
    ))
}
