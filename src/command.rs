//! Commands and types used throughout slotgrid.
//!
//! This module defines the vocabulary that all components share:
//! [`Command`] describes every action the board can perform, and
//! [`Direction`] / [`ScaleDirection`] / [`KeyEvent`] / [`SlotIndex`]
//! provide the supporting data types.
//!
//! UI surfaces forward raw arguments; the daemon parses direction strings
//! (e.g. "left", "Up"), scale directions ("increase", "+") and slot indices
//! (number or string).

use crate::label::LabelCommand;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Direction for panning the content of the active slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Unit offset delta `(dx, dy)` in screen coordinates (y grows downward).
    pub fn delta(self) -> (f64, f64) {
        match self {
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
        }
    }

    /// Whether this is a vertical direction.
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Parse a direction string (case-insensitive; accepts "left", "Left", " UP ").
fn parse_direction(s: &str) -> Option<Direction> {
    match s.trim().to_lowercase().as_str() {
        "left" => Some(Direction::Left),
        "right" => Some(Direction::Right),
        "up" => Some(Direction::Up),
        "down" => Some(Direction::Down),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_direction(&s).ok_or_else(|| DeError::custom(format!("invalid direction: {:?}", s)))
    }
}

/// Whether a resize grows or shrinks the content of the active slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScaleDirection {
    Increase,
    Decrease,
}

impl fmt::Display for ScaleDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleDirection::Increase => write!(f, "increase"),
            ScaleDirection::Decrease => write!(f, "decrease"),
        }
    }
}

fn parse_scale_direction(s: &str) -> Option<ScaleDirection> {
    match s.trim().to_lowercase().as_str() {
        "increase" | "in" | "+" => Some(ScaleDirection::Increase),
        "decrease" | "out" | "-" => Some(ScaleDirection::Decrease),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for ScaleDirection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_scale_direction(&s)
            .ok_or_else(|| DeError::custom(format!("invalid scale direction: {:?}", s)))
    }
}

/// Wire format for a slot index: accepts a number or a numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SlotIndex(pub usize);

impl<'de> Deserialize<'de> for SlotIndex {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = SlotIndex;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "non-negative integer or string")
            }
            fn visit_u64<E>(self, n: u64) -> Result<SlotIndex, E> {
                Ok(SlotIndex(n as usize))
            }
            fn visit_str<E>(self, s: &str) -> Result<SlotIndex, E>
            where
                E: DeError,
            {
                let n: usize = s
                    .trim()
                    .parse()
                    .map_err(|_| DeError::custom("slot index: expected non-negative integer"))?;
                Ok(SlotIndex(n))
            }
        }
        deserializer.deserialize_any(V)
    }
}

/// The control a keyboard event originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTarget {
    /// The layout surface or any non-text control.
    #[default]
    Surface,
    /// A text input or text area with keyboard focus.
    TextEntry,
}

/// A raw key-down event as delivered by the UI surface.
///
/// `key` uses the DOM `KeyboardEvent.key` names (`"ArrowLeft"`, `"+"`, …).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: String,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub target: EventTarget,
}

impl KeyEvent {
    /// Key-down on the layout surface.
    pub fn new(key: impl Into<String>, shift: bool) -> Self {
        Self {
            key: key.into(),
            shift,
            target: EventTarget::Surface,
        }
    }

    /// Same key, but typed into a focused text control.
    pub fn in_text_entry(mut self) -> Self {
        self.target = EventTarget::TextEntry;
        self
    }
}

/// Every action the board can perform.
///
/// Commands are produced by [`CommandSource`](crate::traits::CommandSource)
/// implementations (and by the upload reader threads) and consumed by the
/// [`Board`](crate::board::Board).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Make the slot at the given index the active one.
    Select(SlotIndex),

    /// A raw key-down event; routed through the input router.
    Key(KeyEvent),

    /// Scale the active slot's content up or down.
    Resize {
        direction: ScaleDirection,
        #[serde(default)]
        amplified: bool,
    },

    /// Pan the active slot's content.
    Move {
        direction: Direction,
        #[serde(default)]
        amplified: bool,
    },

    /// Toggle the horizontal mirror flag of the slot at the given index.
    /// Independent of the selection.
    Flip(SlotIndex),

    /// Apply the catalog layout with the given id.
    ApplyLayout(String),

    /// Start reading an image file into a slot.
    ///
    /// `media_type` is the type declared by the file picker; when absent it
    /// is guessed from the file extension.
    Upload {
        index: usize,
        path: PathBuf,
        #[serde(default)]
        media_type: Option<String>,
    },

    /// Completion of a read started by [`Upload`](Command::Upload).
    ///
    /// `payload` is a self-contained `data:` URI.  Completions whose
    /// `generation` is not the slot's latest are discarded.  Only the
    /// reader threads produce this, so it is never accepted off the wire.
    #[serde(skip_deserializing)]
    UploadComplete {
        index: usize,
        generation: u64,
        payload: String,
    },

    /// A read started by [`Upload`](Command::Upload) could not finish.
    /// Internal like [`UploadComplete`](Command::UploadComplete).
    #[serde(skip_deserializing)]
    UploadFailed {
        index: usize,
        generation: u64,
        reason: String,
    },

    /// Drop the content of the slot at the given index.
    RemoveContent(SlotIndex),

    /// Show borders on every slot, or hide them on every slot.
    ///
    /// On the wire this is encoded as the JSON string `"ToggleBorders"`.
    ToggleBorders,

    /// Copy the active (or first non-empty) slot into every slot.
    Duplicate,

    /// Reset every slot, forget the persisted state and the selection.
    Clear,

    /// A label-sheet editing command.
    Label(LabelCommand),
}
