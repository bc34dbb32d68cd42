//! Input translation.
//!
//! Turns raw UI events into slotgrid [`Command`](crate::command::Command)s.
//! Only keyboard input exists today; pointer picks arrive as explicit
//! [`Select`](crate::command::Command::Select) commands.

pub mod keyboard;
