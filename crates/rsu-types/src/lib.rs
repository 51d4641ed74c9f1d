use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a single binary output line (a BCM GPIO number on the
/// reference board).
pub type LineId = u32;

/// One of the two traffic-light heads at the intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadId {
    Head1,
    Head2,
}

impl HeadId {
    /// The head controlling the crossing approach.
    pub fn opposing(self) -> HeadId {
        match self {
            HeadId::Head1 => HeadId::Head2,
            HeadId::Head2 => HeadId::Head1,
        }
    }
}

impl fmt::Display for HeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadId::Head1 => write!(f, "head1"),
            HeadId::Head2 => write!(f, "head2"),
        }
    }
}

/// The three mutually exclusive aspects of a head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Yellow,
    Green,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "red"),
            Color::Yellow => write!(f, "yellow"),
            Color::Green => write!(f, "green"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Route vocabulary
// ────────────────────────────────────────────────────────────────────────────

/// Localised direction codes accepted from the dispatch system.
const DIRECTION_CODES: [(&str, &str); 8] = [
    ("북", "N"),
    ("남", "S"),
    ("동", "E"),
    ("서", "W"),
    ("북동", "NE"),
    ("남동", "SE"),
    ("남서", "SW"),
    ("북서", "NW"),
];

/// Localised turn codes accepted from the dispatch system.
const TURN_CODES: [(&str, &str); 4] = [
    ("직진", "Straight"),
    ("좌회전", "Left"),
    ("우회전", "Right"),
    ("유턴", "U-turn"),
];

fn canonical<'a>(table: &[(&'a str, &'a str)], code: &'a str) -> &'a str {
    table
        .iter()
        .find(|(local, _)| *local == code)
        .map(|(_, canon)| *canon)
        .unwrap_or(code)
}

/// Compass direction an emergency vehicle enters from or leaves toward.
///
/// Codes outside the fixed set are kept verbatim in [`Direction::Other`] so
/// they can still be shown to operators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    N,
    S,
    E,
    W,
    NE,
    SE,
    SW,
    NW,
    Other(String),
}

impl Direction {
    /// Parse a localised or canonical direction code.  Never fails.
    pub fn from_code(code: &str) -> Self {
        match canonical(&DIRECTION_CODES, code) {
            "N" => Direction::N,
            "S" => Direction::S,
            "E" => Direction::E,
            "W" => Direction::W,
            "NE" => Direction::NE,
            "SE" => Direction::SE,
            "SW" => Direction::SW,
            "NW" => Direction::NW,
            other => Direction::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Direction::N => "N",
            Direction::S => "S",
            Direction::E => "E",
            Direction::W => "W",
            Direction::NE => "NE",
            Direction::SE => "SE",
            Direction::SW => "SW",
            Direction::NW => "NW",
            Direction::Other(code) => code,
        };
        f.write_str(code)
    }
}

/// Manoeuvre the emergency vehicle makes through the intersection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Turn {
    Straight,
    Left,
    Right,
    UTurn,
    Other(String),
}

impl Turn {
    /// Parse a localised or canonical turn code.  Never fails.
    pub fn from_code(code: &str) -> Self {
        match canonical(&TURN_CODES, code) {
            "Straight" => Turn::Straight,
            "Left" => Turn::Left,
            "Right" => Turn::Right,
            "U-turn" => Turn::UTurn,
            other => Turn::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Turn::Straight => "Straight",
            Turn::Left => "Left",
            Turn::Right => "Right",
            Turn::UTurn => "U-turn",
            Turn::Other(code) => code,
        };
        f.write_str(code)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Events
// ────────────────────────────────────────────────────────────────────────────

/// Emergency-vehicle lifecycle event, decoded from an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmergencyEvent {
    /// The vehicle is about to enter the intersection.
    Approach {
        in_direction: Option<Direction>,
        out_direction: Option<Direction>,
        turn: Option<Turn>,
    },
    /// The vehicle is inside the intersection.  Not actionable.
    Arrived,
    /// The vehicle has cleared the intersection.
    Passed,
    /// Any other event name, kept for logging.
    Unknown(String),
}

impl EmergencyEvent {
    /// Short label used in logs.
    pub fn kind(&self) -> &str {
        match self {
            EmergencyEvent::Approach { .. } => "approach",
            EmergencyEvent::Arrived => "arrived",
            EmergencyEvent::Passed => "passed",
            EmergencyEvent::Unknown(name) => name,
        }
    }
}

/// A decoded event together with the free-text `explain` field that may
/// accompany it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub event: EmergencyEvent,
    pub explain: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Global error type spanning payload decoding, hardware writes, configuration
/// and messaging.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RsuError {
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Unsupported event: {0}")]
    UnsupportedEvent(String),

    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Channel error: {0}")]
    Channel(String),
}

impl RsuError {
    /// Convenience constructor for [`RsuError::HardwareFault`].
    pub fn hardware(component: impl Into<String>, details: impl Into<String>) -> Self {
        RsuError::HardwareFault {
            component: component.into(),
            details: details.into(),
        }
    }
}
