//! Remote-control commands and their 32-bit NEC codes.
//!
//! The raw values below were captured from the speaker's bundled remote with
//! an IR receiver. The capture tool reports bits LSB-first within each byte,
//! while the transmit path clocks them out MSB-first, so every code goes
//! through [`transmit_order`] on its way out.

/// All transmitted frames use 32-bit NEC framing.
pub const NEC_BIT_LENGTH: u8 = 32;

const RAW_POWER: u32 = 0x02A0_807F;
const RAW_INPUT: u32 = 0x02A0_08F7;
const RAW_MUTE: u32 = 0x02A0_EA15;
const RAW_LEVEL: u32 = 0x02A0_0AF5;
const RAW_VOLUME_DOWN: u32 = 0x02A0_6A95;
const RAW_VOLUME_UP: u32 = 0x02A0_AA55;
const RAW_EFFECT: u32 = 0x02A0_0EF1;

/// A symbolic remote-control intent, fixed at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    Power,
    Input,
    Mute,
    Level,
    VolumeDown,
    VolumeUp,
    Effect,
}

impl RemoteCommand {
    pub const ALL: [RemoteCommand; 7] = [
        RemoteCommand::Power,
        RemoteCommand::Input,
        RemoteCommand::Mute,
        RemoteCommand::Level,
        RemoteCommand::VolumeDown,
        RemoteCommand::VolumeUp,
        RemoteCommand::Effect,
    ];

    /// The code as captured from the original remote, LSB-first per byte.
    pub const fn raw_code(self) -> u32 {
        match self {
            Self::Power => RAW_POWER,
            Self::Input => RAW_INPUT,
            Self::Mute => RAW_MUTE,
            Self::Level => RAW_LEVEL,
            Self::VolumeDown => RAW_VOLUME_DOWN,
            Self::VolumeUp => RAW_VOLUME_UP,
            Self::Effect => RAW_EFFECT,
        }
    }

    /// The code in the bit order the transmit primitive expects.
    ///
    /// Recomputed on every send; the transform is trivial next to the
    /// latency of an actual IR frame.
    pub fn transmit_code(self) -> u32 {
        transmit_order(self.raw_code())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Power => "POWER",
            Self::Input => "INPUT",
            Self::Mute => "MUTE",
            Self::Level => "LEVEL",
            Self::VolumeDown => "VOLUME_DOWN",
            Self::VolumeUp => "VOLUME_UP",
            Self::Effect => "EFFECT",
        }
    }
}

/// Reverse the bit order within each of the four byte lanes.
///
/// Byte order is preserved; only the bits inside each byte flip
/// (0↔7, 1↔6, 2↔5, 3↔4). Applying it twice returns the input.
/// Example: captured `0x02A008F7` becomes `0x400510EF` on the wire.
pub fn transmit_order(raw: u32) -> u32 {
    u32::from_be_bytes(raw.to_be_bytes().map(u8::reverse_bits))
}
