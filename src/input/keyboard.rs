//! Translates key-down events into transform [`Command`]s.
//!
//! | Key            | Command                               |
//! |----------------|---------------------------------------|
//! | `+` `=`        | [`Command::Resize`] increase          |
//! | `-` `_`        | [`Command::Resize`] decrease          |
//! | `ArrowLeft` …  | [`Command::Move`] in that direction   |
//!
//! Shift sets `amplified`.  Events are dropped entirely while no slot is
//! selected or while a text control has focus, so normal typing is never
//! hijacked.  Vertical arrows that are consumed also ask the surface to
//! suppress its default scrolling.
//!
//! Every key-down yields at most one command; there is no throttling.

use crate::command::{Command, Direction, EventTarget, KeyEvent, ScaleDirection};
use crate::slots::Selection;
use log::debug;

/// Result of routing one key event.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyOutcome {
    /// The command to execute, if the key is bound.
    pub command: Option<Command>,
    /// Whether the surface should cancel the browser default (scrolling).
    pub prevent_default: bool,
}

impl KeyOutcome {
    fn ignored() -> Self {
        Self {
            command: None,
            prevent_default: false,
        }
    }
}

/// Map a DOM key name to its direction, if it is an arrow key.
fn arrow_direction(key: &str) -> Option<Direction> {
    match key {
        "ArrowLeft" => Some(Direction::Left),
        "ArrowRight" => Some(Direction::Right),
        "ArrowUp" => Some(Direction::Up),
        "ArrowDown" => Some(Direction::Down),
        _ => None,
    }
}

/// Map a DOM key name to a resize direction.
fn scale_direction(key: &str) -> Option<ScaleDirection> {
    match key {
        "+" | "=" => Some(ScaleDirection::Increase),
        "-" | "_" => Some(ScaleDirection::Decrease),
        _ => None,
    }
}

/// Stateless keyboard router.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputRouter;

impl InputRouter {
    pub fn new() -> Self {
        Self
    }

    /// Route `event` given the current selection.
    pub fn route(&self, event: &KeyEvent, selection: Selection) -> KeyOutcome {
        if selection == Selection::None {
            return KeyOutcome::ignored();
        }
        if event.target == EventTarget::TextEntry {
            debug!("key {:?} ignored: text entry has focus", event.key);
            return KeyOutcome::ignored();
        }

        let amplified = event.shift;
        if let Some(direction) = arrow_direction(&event.key) {
            return KeyOutcome {
                command: Some(Command::Move {
                    direction,
                    amplified,
                }),
                prevent_default: direction.is_vertical(),
            };
        }
        if let Some(direction) = scale_direction(&event.key) {
            return KeyOutcome {
                command: Some(Command::Resize {
                    direction,
                    amplified,
                }),
                prevent_default: false,
            };
        }
        KeyOutcome::ignored()
    }
}
