//! ESP32 build: real WiFi, MQTT, RMT infrared, GPIO, and DHT11 wiring
//! around the shared session loop.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, OnceLock,
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Context};
use dht_sensor::dht11;
use embedded_svc::{
    mqtt::client::{Details, EventPayload, QoS},
    wifi::{AuthMethod, ClientConfiguration, Configuration},
};
use esp_idf_hal::{
    delay::Ets,
    gpio::{AnyIOPin, AnyOutputPin, InputOutput, Output, PinDriver, Pull},
};
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::{modem::Modem, prelude::Peripherals, rmt::RMT},
    log::EspLogger,
    mqtt::client::{EspMqttClient, EspMqttConnection, MqttClientConfiguration},
    nvs::EspDefaultNvsPartition,
    wifi::{BlockingWifi, EspWifi},
};
use log::{info, warn};

use remote_bridge_common::{
    BridgeConfig, BridgeContext, ClimateSensor, CommandPin, HardwareConfig, InboundMessage,
    MessageChannel, NetworkConfig, PinLevel, SensorReading, SensorStatus, SessionController,
    MQTT_CLIENT_ID,
};

use crate::ir::IrTransmitter;

const WIFI_RETRY_DELAY_MS: u64 = 500;
const MQTT_RETRY_DELAY_MS: u64 = 2_000;
const LOOP_PAUSE_MS: u64 = 50;
const DHT11_MIN_SAMPLING_MS: u64 = 1_000;
const MAX_MQTT_PAYLOAD_BYTES: usize = 512;

struct EspChannel {
    mqtt: EspMqttClient<'static>,
    inbox: Arc<Mutex<VecDeque<InboundMessage>>>,
}

impl MessageChannel for EspChannel {
    fn drain(&mut self) -> Vec<InboundMessage> {
        let mut inbox = self.inbox.lock().unwrap();
        inbox.drain(..).collect()
    }

    fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> anyhow::Result<()> {
        self.mqtt
            .publish(topic, QoS::AtMostOnce, retain, payload.as_bytes())
            .map(|_| ())
            .context("mqtt publish failed")
    }

    fn subscribe(&mut self, topic: &str) -> anyhow::Result<()> {
        self.mqtt
            .subscribe(topic, QoS::AtMostOnce)
            .map(|_| ())
            .context("mqtt subscribe failed")
    }
}

struct EspLed {
    pin: PinDriver<'static, AnyOutputPin, Output>,
}

impl CommandPin for EspLed {
    fn write(&mut self, level: PinLevel) -> anyhow::Result<()> {
        match level {
            PinLevel::Low => self.pin.set_low(),
            PinLevel::High => self.pin.set_high(),
        }
        .context("failed to drive LED pin")
    }
}

struct DhtSensor {
    pin: PinDriver<'static, AnyIOPin, InputOutput>,
    delay: Ets,
    gpio: i32,
}

impl DhtSensor {
    fn new(gpio: i32) -> anyhow::Result<Self> {
        let mut pin = PinDriver::input_output_od(unsafe { AnyIOPin::new(gpio) })?;
        pin.set_pull(Pull::Up)?;
        pin.set_high()?;

        Ok(Self {
            pin,
            delay: Ets,
            gpio,
        })
    }
}

impl ClimateSensor for DhtSensor {
    fn minimum_sampling_period_ms(&self) -> u64 {
        DHT11_MIN_SAMPLING_MS
    }

    fn sample(&mut self) -> SensorReading {
        if let Err(err) = self.pin.set_high() {
            warn!("failed to set DHT11 line high before read: {err:?}");
            return SensorReading::failed(SensorStatus::Error);
        }

        match dht11::blocking::read(&mut self.delay, &mut self.pin) {
            Ok(reading) => SensorReading::ok(
                reading.relative_humidity as i32,
                reading.temperature as i32,
            ),
            Err(dht_sensor::DhtError::Timeout) => SensorReading::failed(SensorStatus::Timeout),
            Err(err) => {
                warn!("failed to read DHT11 on GPIO{}: {err:?}", self.gpio);
                SensorReading::failed(SensorStatus::Error)
            }
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();

    let mut config = BridgeConfig::default();
    config.hardware.sanitize();

    info!(
        "config: ssid=`{}`, mqtt=`{}:{}`",
        config.network.wifi_ssid, config.network.mqtt_host, config.network.mqtt_port,
    );

    let sys_loop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let Peripherals { modem, rmt, .. } = Peripherals::take()?;

    let mut led = init_led(config.hardware.led_pin)?;
    led.write(PinLevel::High)?;

    let ir = match init_ir_transmitter(rmt, &config.hardware) {
        Ok(transmitter) => {
            info!(
                "IR transmitter initialized on RMT channel{} / GPIO{} @ {}kHz",
                config.hardware.rmt_channel, config.hardware.ir_tx_pin, config.hardware.carrier_khz
            );
            transmitter
        }
        Err(err) => {
            warn!("failed to initialize IR transmitter, running disabled: {err:#}");
            IrTransmitter::disabled()
        }
    };

    let sensor =
        DhtSensor::new(config.hardware.dht_pin).context("failed to initialize DHT11 sensor")?;

    let wifi = connect_wifi(modem, sys_loop, nvs_partition, &config.network)?;

    let (mqtt, conn) = create_mqtt_client(&config.network)?;
    let inbox = Arc::new(Mutex::new(VecDeque::new()));
    let mqtt_connected = Arc::new(AtomicBool::new(false));
    spawn_mqtt_receiver(conn, inbox.clone(), mqtt_connected.clone());

    while !mqtt_connected.load(Ordering::Relaxed) {
        info!("connecting to MQTT...");
        thread::sleep(Duration::from_millis(MQTT_RETRY_DELAY_MS));
    }
    info!("mqtt connected");

    let mut channel = EspChannel { mqtt, inbox };
    SessionController::subscribe_all(&mut channel)?;

    let mut ctx = BridgeContext {
        channel,
        ir,
        led,
        sensor,
    };
    let mut session = SessionController::new(
        ctx.sensor.minimum_sampling_period_ms(),
        monotonic_ms(),
    );

    // Keep the wifi driver alive for the program lifetime.
    let _wifi = wifi;

    info!("bridge running");

    loop {
        session.tick(&mut ctx, monotonic_ms());
        thread::sleep(Duration::from_millis(LOOP_PAUSE_MS));
    }
}

fn init_led(pin: i32) -> anyhow::Result<EspLed> {
    let driver = PinDriver::output(unsafe { AnyOutputPin::new(pin) })
        .with_context(|| format!("failed to configure LED pin GPIO{pin}"))?;
    Ok(EspLed { pin: driver })
}

fn init_ir_transmitter(rmt: RMT, hardware: &HardwareConfig) -> anyhow::Result<IrTransmitter> {
    let pin = hardware.ir_tx_pin;
    let carrier_khz = hardware.carrier_khz;

    match hardware.rmt_channel {
        0 => unsafe { IrTransmitter::new(rmt.channel0, AnyOutputPin::new(pin), carrier_khz) },
        1 => unsafe { IrTransmitter::new(rmt.channel1, AnyOutputPin::new(pin), carrier_khz) },
        2 => unsafe { IrTransmitter::new(rmt.channel2, AnyOutputPin::new(pin), carrier_khz) },
        3 => unsafe { IrTransmitter::new(rmt.channel3, AnyOutputPin::new(pin), carrier_khz) },
        #[cfg(any(esp32, esp32s3))]
        4 => unsafe { IrTransmitter::new(rmt.channel4, AnyOutputPin::new(pin), carrier_khz) },
        #[cfg(any(esp32, esp32s3))]
        5 => unsafe { IrTransmitter::new(rmt.channel5, AnyOutputPin::new(pin), carrier_khz) },
        #[cfg(any(esp32, esp32s3))]
        6 => unsafe { IrTransmitter::new(rmt.channel6, AnyOutputPin::new(pin), carrier_khz) },
        #[cfg(any(esp32, esp32s3))]
        7 => unsafe { IrTransmitter::new(rmt.channel7, AnyOutputPin::new(pin), carrier_khz) },
        _ => Err(anyhow!("unsupported RMT channel: {}", hardware.rmt_channel)),
    }
}

fn connect_wifi(
    modem: Modem,
    sys_loop: EspSystemEventLoop,
    nvs_partition: EspDefaultNvsPartition,
    network: &NetworkConfig,
) -> anyhow::Result<EspWifi<'static>> {
    let mut esp_wifi = EspWifi::new(modem, sys_loop.clone(), Some(nvs_partition))?;
    let mut wifi = BlockingWifi::wrap(&mut esp_wifi, sys_loop)?;

    let auth_method = if network.wifi_pass.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPAWPA2Personal
    };

    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: network
            .wifi_ssid
            .as_str()
            .try_into()
            .map_err(|_| anyhow!("wifi ssid too long"))?,
        password: network
            .wifi_pass
            .as_str()
            .try_into()
            .map_err(|_| anyhow!("wifi password too long"))?,
        auth_method,
        ..Default::default()
    }))?;

    wifi.start()?;
    info!("wifi started, connecting to `{}`", network.wifi_ssid);

    // No fallback mode exists; the bridge is useless without the network,
    // so keep trying until association succeeds.
    loop {
        match wifi.connect() {
            Ok(()) => match wifi.wait_netif_up() {
                Ok(()) => break,
                Err(err) => warn!("wifi netif up failed: {err:#}"),
            },
            Err(err) => warn!("wifi connect failed: {err:#}"),
        }

        let _ = wifi.disconnect();
        thread::sleep(Duration::from_millis(WIFI_RETRY_DELAY_MS));
    }

    info!("wifi connected");
    Ok(esp_wifi)
}

fn create_mqtt_client(
    network: &NetworkConfig,
) -> anyhow::Result<(EspMqttClient<'static>, EspMqttConnection)> {
    let url = format!("mqtt://{}:{}", network.mqtt_host, network.mqtt_port);

    let conf = MqttClientConfiguration {
        client_id: Some(MQTT_CLIENT_ID),
        username: if network.mqtt_user.is_empty() {
            None
        } else {
            Some(network.mqtt_user.as_str())
        },
        password: if network.mqtt_pass.is_empty() {
            None
        } else {
            Some(network.mqtt_pass.as_str())
        },
        ..Default::default()
    };

    Ok(EspMqttClient::new(url.as_str(), &conf)?)
}

fn spawn_mqtt_receiver(
    mut conn: EspMqttConnection,
    inbox: Arc<Mutex<VecDeque<InboundMessage>>>,
    connected: Arc<AtomicBool>,
) {
    thread::Builder::new()
        .name("mqtt-rx".into())
        .stack_size(8 * 1024)
        .spawn(move || {
            loop {
                match conn.next() {
                    Ok(event) => {
                        connected.store(true, Ordering::Relaxed);

                        if let EventPayload::Received {
                            topic: Some(topic),
                            data,
                            details,
                            ..
                        } = event.payload()
                        {
                            // Only whole payloads are worth queueing.
                            if !matches!(details, Details::Complete) {
                                continue;
                            }

                            if data.len() > MAX_MQTT_PAYLOAD_BYTES {
                                warn!(
                                    "dropping oversized MQTT payload on topic {} ({} bytes)",
                                    topic,
                                    data.len()
                                );
                                continue;
                            }

                            if let Ok(payload) = core::str::from_utf8(data) {
                                inbox
                                    .lock()
                                    .unwrap()
                                    .push_back(InboundMessage::new(topic, payload));
                            }
                        }
                    }
                    Err(err) => {
                        connected.store(false, Ordering::Relaxed);
                        warn!("mqtt receive loop error: {err:?}");
                        thread::sleep(Duration::from_millis(MQTT_RETRY_DELAY_MS));
                    }
                }
            }
        })
        .expect("failed to spawn mqtt receiver thread");
}

fn monotonic_ms() -> u64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START
        .get_or_init(Instant::now)
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}
