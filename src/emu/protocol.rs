//! Emulator event payloads and their wire bodies.
//!
//! Every event is a small fixed-shape record tagged with the emulator
//! protocol number it is delivered on. Bodies are big-endian. Framing
//! (the QEMU serial envelope or the websocket relay opcode) is added by the
//! transport, not here.

use serde::Serialize;

use crate::error::ToolError;

/// Most accel samples the emulator accepts in one event (the count is a `u8`).
pub const MAX_ACCEL_SAMPLES: usize = 255;

/// Encoded heading when no heading is known.
pub const HEADING_UNKNOWN: u32 = 0xFFFF_FFFF;

/* ---- Emulator protocol numbers ---- */

pub const PROTOCOL_TAP: u16 = 2;
pub const PROTOCOL_BLUETOOTH_CONNECTION: u16 = 3;
pub const PROTOCOL_COMPASS: u16 = 4;
pub const PROTOCOL_BATTERY: u16 = 5;
pub const PROTOCOL_ACCEL: u16 = 6;
pub const PROTOCOL_BUTTON: u16 = 8;

/* ---- Value types ---- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccelSample {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl AccelSample {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }
}

/// Samples guaranteed to fit in one accel event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccelSamples(Vec<AccelSample>);

impl AccelSamples {
    pub fn as_slice(&self) -> &[AccelSample] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl TryFrom<Vec<AccelSample>> for AccelSamples {
    type Error = ToolError;

    fn try_from(samples: Vec<AccelSample>) -> Result<Self, Self::Error> {
        if samples.len() > MAX_ACCEL_SAMPLES {
            return Err(ToolError::TooManySamples {
                count: samples.len(),
                max: MAX_ACCEL_SAMPLES,
            });
        }
        Ok(Self(samples))
    }
}

/// Hardware buttons, encoded as the emulator's button-state bitmask.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    Back,
    Up,
    Select,
    Down,
}

impl Button {
    pub const fn state_bit(self) -> u8 {
        match self {
            Button::Back => 1 << 0,
            Button::Up => 1 << 1,
            Button::Select => 1 << 2,
            Button::Down => 1 << 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Calibration {
    Uncalibrated = 0,
    Refining = 1,
    Complete = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

/* ---- Events ---- */

/// One simulated event, built per invocation and consumed by a single send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EmulatorEvent {
    Tap {
        axis: Axis,
        direction: i8,
    },
    BluetoothConnection {
        connected: bool,
    },
    Compass {
        /// `None` is sent as [`HEADING_UNKNOWN`].
        heading: Option<u32>,
        calibration: Calibration,
    },
    Battery {
        percent: u8,
        charging: bool,
    },
    Accel {
        samples: AccelSamples,
    },
    Button {
        button: Button,
    },
}

impl EmulatorEvent {
    /// Emulator protocol number this event is delivered on.
    pub fn protocol(&self) -> u16 {
        match self {
            EmulatorEvent::Tap { .. } => PROTOCOL_TAP,
            EmulatorEvent::BluetoothConnection { .. } => PROTOCOL_BLUETOOTH_CONNECTION,
            EmulatorEvent::Compass { .. } => PROTOCOL_COMPASS,
            EmulatorEvent::Battery { .. } => PROTOCOL_BATTERY,
            EmulatorEvent::Accel { .. } => PROTOCOL_ACCEL,
            EmulatorEvent::Button { .. } => PROTOCOL_BUTTON,
        }
    }

    /// Short human label used in status output.
    pub fn label(&self) -> &'static str {
        match self {
            EmulatorEvent::Tap { .. } => "tap",
            EmulatorEvent::BluetoothConnection { .. } => "bluetooth connection",
            EmulatorEvent::Compass { .. } => "compass",
            EmulatorEvent::Battery { .. } => "battery",
            EmulatorEvent::Accel { .. } => "accel",
            EmulatorEvent::Button { .. } => "button",
        }
    }

    /// Encode the event body (without transport framing).
    pub fn encode(&self) -> Vec<u8> {
        match self {
            EmulatorEvent::Tap { axis, direction } => vec![*axis as u8, *direction as u8],
            EmulatorEvent::BluetoothConnection { connected } => vec![u8::from(*connected)],
            EmulatorEvent::Compass {
                heading,
                calibration,
            } => {
                let mut out = Vec::with_capacity(5);
                out.extend_from_slice(&heading.unwrap_or(HEADING_UNKNOWN).to_be_bytes());
                out.push(*calibration as u8);
                out
            }
            EmulatorEvent::Battery { percent, charging } => vec![*percent, u8::from(*charging)],
            EmulatorEvent::Accel { samples } => {
                let mut out = Vec::with_capacity(1 + samples.len() * 6);
                // AccelSamples caps the length at MAX_ACCEL_SAMPLES.
                out.push(samples.len() as u8);
                for s in samples.as_slice() {
                    out.extend_from_slice(&s.x.to_be_bytes());
                    out.extend_from_slice(&s.y.to_be_bytes());
                    out.extend_from_slice(&s.z.to_be_bytes());
                }
                out
            }
            EmulatorEvent::Button { button } => vec![button.state_bit()],
        }
    }
}

/* ---- Phone simulator app configuration ---- */

const APP_CONFIG_SETUP: u8 = 0x01;
const APP_CONFIG_RESPONSE: u8 = 0x02;
const APP_CONFIG_CANCELLED: u8 = 0x03;

/// Messages sent to the phone simulator's app-configuration endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "config", content = "data", rename_all = "snake_case")]
pub enum AppConfigMessage {
    /// Ask the phone simulator for the app's configuration URL.
    Setup,
    /// The configuration page returned this query string.
    Response(String),
    /// The configuration page was closed without saving.
    Cancelled,
}

impl AppConfigMessage {
    pub fn label(&self) -> &'static str {
        match self {
            AppConfigMessage::Setup => "config setup",
            AppConfigMessage::Response(_) => "config response",
            AppConfigMessage::Cancelled => "config cancelled",
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            AppConfigMessage::Setup => vec![APP_CONFIG_SETUP],
            AppConfigMessage::Cancelled => vec![APP_CONFIG_CANCELLED],
            AppConfigMessage::Response(data) => {
                let bytes = data.as_bytes();
                let mut out = Vec::with_capacity(5 + bytes.len());
                out.push(APP_CONFIG_RESPONSE);
                out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                out.extend_from_slice(bytes);
                out
            }
        }
    }
}

/// Decode the phone simulator's reply to [`AppConfigMessage::Setup`] into the config URL.
pub fn decode_config_url(body: &[u8]) -> Result<String, ToolError> {
    let malformed = |why: &str| ToolError::Transport(format!("malformed app config response: {why}"));

    let (&command, rest) = body.split_first().ok_or_else(|| malformed("empty message"))?;
    if command != APP_CONFIG_SETUP {
        return Err(malformed(&format!("unexpected command 0x{command:02x}")));
    }
    if rest.len() < 4 {
        return Err(malformed("truncated length"));
    }
    let (len_bytes, data) = rest.split_at(4);
    let len = u32::from_be_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
    let url = data.get(..len).ok_or_else(|| malformed("truncated url"))?;
    String::from_utf8(url.to_vec()).map_err(|_| malformed("url is not valid UTF-8"))
}
