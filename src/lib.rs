//! **slotgrid** — a slot-grid layout engine for photo print sheets, plus a
//! product label sheet designer.
//!
//! A layout is an ordered collection of rectangular *slots*.  Each slot
//! holds an optional image and its own scale, pan and mirror state.  Layouts
//! are picked from a fixed catalog; switching layouts keeps the slots the
//! old and new layout have in common.  Slot state (without the images) and
//! the label template survive restarts.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::KeyValueStore`] — abstracts durable storage so the slot and
//!   label logic is not coupled to any specific backend.
//! * [`traits::CommandSource`] — abstracts the transport that delivers
//!   user intent (a Unix socket, a test harness, …) so the main loop is not
//!   coupled to any specific IPC mechanism.
//!
//! [`board::Board`] consumes [`command::Command`]s and publishes
//! [`traits::ViewEvent`]s.  Concrete stores live in [`storage`]; the socket
//! listener lives in [`ipc`].

pub mod board;
pub mod command;
pub mod config;
pub mod input;
pub mod ipc;
pub mod label;
pub mod layout;
pub mod slots;
pub mod storage;
pub mod traits;
pub mod transform;
pub mod upload;
