//! Core traits that decouple slotgrid from any specific storage backend or
//! transport mechanism, plus the view types handed to renderers.
//!
//! Every concrete backend (a JSON file, an in-memory map, a Unix-socket
//! listener, a test harness, …) implements one of these traits.  The
//! [`Board`](crate::board::Board) only depends on these abstractions.

use crate::command::Command;
use crate::label::LabelSheetView;
use serde::Serialize;
use std::rc::Rc;
use std::sync::mpsc;

//  Durable storage

/// Abstraction over a string-keyed, string-valued durable store.
///
/// Semantics follow browser local storage: values are whole strings,
/// writes replace, and `remove` of a missing key is not an error.
///
/// Methods take `&self` so one store can be shared (through [`Rc`]) by the
/// slot store and the label designer.
pub trait KeyValueStore {
    /// The error type produced by this store.
    type Error: std::error::Error + Send + 'static;

    /// Return the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Remove `key`.  Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Rc<T> {
    type Error = T::Error;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        (**self).remove(key)
    }
}

//  Views

/// Renderer-facing state of one slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotView {
    pub content: Option<String>,
    pub borders_visible: bool,
    pub scale: f64,
    pub offset: (f64, f64),
    pub flipped: bool,
}

/// A snapshot of everything the layout renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardView {
    /// Visual style tag of the active layout.
    pub style: String,
    pub slots: Vec<SlotView>,
    /// Whether any slot shows borders; labels the single toggle control.
    pub any_borders_visible: bool,
    /// The selected slot index, possibly dangling after a layout change.
    pub active: Option<usize>,
}

/// Events sent from the [`Board`](crate::board::Board) to an external
/// renderer over an [`mpsc`](std::sync::mpsc) channel.
///
/// The board holds an `Option<mpsc::Sender<ViewEvent>>`.  Any listener (a
/// web bridge, a debug logger, a test) can receive these events without
/// being owned by the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ViewEvent {
    /// The slot layout changed (or was re-rendered on request).
    Board(BoardView),
    /// The label sheet changed.
    Labels(LabelSheetView),
    /// A non-blocking message for the user, e.g. a rejected upload.
    Notice(String),
}

//  Command Source

/// A source of [`Command`]s.
///
/// Implementations listen on some transport (a Unix socket, an in-memory
/// channel, …) and forward parsed commands into the provided
/// [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](CommandSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received command must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait CommandSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Command`] into `sink`.
    ///
    /// This method blocks the calling thread.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error>;
}
