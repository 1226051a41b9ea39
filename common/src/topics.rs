pub const TOPIC_CMD_LED: &str = "logitech-remote/led";
pub const TOPIC_CMD_POWER: &str = "logitech-remote/power";
pub const TOPIC_CMD_INPUT: &str = "logitech-remote/input";
pub const TOPIC_CMD_MUTE: &str = "logitech-remote/mute";
pub const TOPIC_CMD_LEVEL: &str = "logitech-remote/level";
pub const TOPIC_CMD_MINUS: &str = "logitech-remote/minus";
pub const TOPIC_CMD_PLUS: &str = "logitech-remote/plus";
pub const TOPIC_CMD_EFFECT: &str = "logitech-remote/effect";

pub const TOPIC_SENSOR_HUMIDITY: &str = "living-room/humidity";
pub const TOPIC_SENSOR_TEMP: &str = "living-room/temperature";

/// Every inbound command topic, in the order they are subscribed at start-up.
pub const COMMAND_TOPICS: [&str; 8] = [
    TOPIC_CMD_LED,
    TOPIC_CMD_POWER,
    TOPIC_CMD_INPUT,
    TOPIC_CMD_MUTE,
    TOPIC_CMD_LEVEL,
    TOPIC_CMD_MINUS,
    TOPIC_CMD_PLUS,
    TOPIC_CMD_EFFECT,
];
