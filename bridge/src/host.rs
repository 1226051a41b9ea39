//! Host build: runs the bridge loop against a real MQTT broker with the
//! IR transmitter, LED, and DHT replaced by logging/simulated stand-ins.
//! Useful for exercising the command path end-to-end without hardware.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, OnceLock,
    },
    time::{Duration, Instant},
};

use anyhow::Context;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use tracing::{info, warn};

use remote_bridge_common::{
    BridgeConfig, BridgeContext, ClimateSensor, CommandPin, InboundMessage, IrTransmit,
    MessageChannel, PinLevel, SensorReading, SessionController, MQTT_CLIENT_ID,
};

const MQTT_RETRY_DELAY: Duration = Duration::from_secs(2);
const LOOP_PAUSE: Duration = Duration::from_millis(50);
const SIM_SAMPLING_PERIOD_MS: u64 = 2_000;

struct HostChannel {
    mqtt: AsyncClient,
    inbox: Arc<Mutex<VecDeque<InboundMessage>>>,
}

impl MessageChannel for HostChannel {
    fn drain(&mut self) -> Vec<InboundMessage> {
        let mut inbox = self.inbox.lock().unwrap();
        inbox.drain(..).collect()
    }

    fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> anyhow::Result<()> {
        self.mqtt
            .try_publish(topic, QoS::AtMostOnce, retain, payload)
            .context("mqtt publish failed")
    }

    fn subscribe(&mut self, topic: &str) -> anyhow::Result<()> {
        self.mqtt
            .try_subscribe(topic, QoS::AtMostOnce)
            .context("mqtt subscribe failed")
    }
}

/// Stand-in for the RMT transmitter; the ESP32 build wires the real one in.
struct LoggingIr;

impl IrTransmit for LoggingIr {
    fn send_nec(&mut self, code: u32, bits: u8) -> anyhow::Result<()> {
        info!("IR send: code={code:#010X} bits={bits}");
        Ok(())
    }
}

struct LoggingLed;

impl CommandPin for LoggingLed {
    fn write(&mut self, level: PinLevel) -> anyhow::Result<()> {
        info!("LED pin -> {level:?}");
        Ok(())
    }
}

/// Simulated DHT; replace with the hardware driver on the device target.
#[derive(Default)]
struct SimulatedSensor {
    tick: u64,
}

impl ClimateSensor for SimulatedSensor {
    fn minimum_sampling_period_ms(&self) -> u64 {
        SIM_SAMPLING_PERIOD_MS
    }

    fn sample(&mut self) -> SensorReading {
        self.tick = self.tick.saturating_add(1);
        let humidity = 40 + (self.tick % 6) as i32;
        let temperature = 20 + (self.tick % 4) as i32;
        SensorReading::ok(humidity, temperature)
    }
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = BridgeConfig::default();

    let mqtt_host = std::env::var("MQTT_HOST").unwrap_or(config.network.mqtt_host.clone());
    let mqtt_port = std::env::var("MQTT_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(config.network.mqtt_port);

    let mut mqtt_options = MqttOptions::new(MQTT_CLIENT_ID, mqtt_host, mqtt_port);
    let mqtt_user = std::env::var("MQTT_USER").unwrap_or(config.network.mqtt_user.clone());
    let mqtt_pass = std::env::var("MQTT_PASS").unwrap_or(config.network.mqtt_pass.clone());
    if !mqtt_user.is_empty() {
        mqtt_options.set_credentials(mqtt_user, mqtt_pass);
    }

    let (mqtt, mut eventloop) = AsyncClient::new(mqtt_options, 64);

    let inbox = Arc::new(Mutex::new(VecDeque::new()));
    let connected = Arc::new(AtomicBool::new(false));

    {
        let inbox = inbox.clone();
        let connected = connected.clone();
        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Incoming::Publish(message))) => {
                        let payload = String::from_utf8_lossy(&message.payload).into_owned();
                        inbox
                            .lock()
                            .unwrap()
                            .push_back(InboundMessage::new(message.topic, payload));
                    }
                    Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                        connected.store(true, Ordering::Relaxed);
                        info!("mqtt connected");
                    }
                    Ok(_) => {}
                    Err(err) => {
                        connected.store(false, Ordering::Relaxed);
                        warn!("mqtt poll error: {err}");
                        tokio::time::sleep(MQTT_RETRY_DELAY).await;
                    }
                }
            }
        });
    }

    while !connected.load(Ordering::Relaxed) {
        info!("connecting to MQTT...");
        tokio::time::sleep(MQTT_RETRY_DELAY).await;
    }

    let mut channel = HostChannel { mqtt, inbox };
    SessionController::subscribe_all(&mut channel)?;

    let mut ctx = BridgeContext {
        channel,
        ir: LoggingIr,
        led: LoggingLed,
        sensor: SimulatedSensor::default(),
    };
    let mut session = SessionController::new(
        ctx.sensor.minimum_sampling_period_ms(),
        monotonic_ms(),
    );

    info!("bridge running");

    loop {
        session.tick(&mut ctx, monotonic_ms());
        tokio::time::sleep(LOOP_PAUSE).await;
    }
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
