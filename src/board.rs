//! The main orchestrator that ties slots, layouts, transforms, uploads and
//! label sheets together.
//!
//! [`Board`] owns every piece of state and reacts to [`Command`]s by
//! mutating it and publishing [`ViewEvent`]s for whatever renderer is
//! listening.

use crate::command::{Command, KeyEvent, SlotIndex};
use crate::config::Config;
use crate::input::keyboard::{InputRouter, KeyOutcome};
use crate::label::{LabelDesigner, LabelError, LabelSheetView};
use crate::layout::{LayoutCatalog, LayoutSelector};
use crate::slots::{SlotStore, Selection};
use crate::traits::{BoardView, KeyValueStore, SlotView, ViewEvent};
use crate::transform::TransformEngine;
use crate::upload::{self, PendingUpload, UploadError, UploadTracker};
use log::{debug, info, warn};
use std::sync::mpsc;

/// Possible errors from the board.
///
/// None of them leave state half-changed; the board also reports each one
/// as a [`ViewEvent::Notice`].
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// A rejected or unreadable upload.
    #[error(transparent)]
    Upload(#[from] UploadError),
    /// `ApplyLayout` named an id that is not in the catalog.
    #[error("unknown layout {0:?}")]
    UnknownLayout(String),
    #[error(transparent)]
    Label(#[from] LabelError),
    /// A background read reported by the upload reader thread.
    #[error("upload into slot {index} failed: {reason}")]
    UploadFailed { index: usize, reason: String },
}

/// Which part of the state a command touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Changed {
    Nothing,
    Slots,
    Labels,
}

impl From<bool> for Changed {
    fn from(changed: bool) -> Self {
        if changed {
            Changed::Slots
        } else {
            Changed::Nothing
        }
    }
}

/// Orchestrates the slot grid and the label sheet.
///
/// The board is generic over any [`KeyValueStore`]; the store is cloned
/// once so the slot store and the label designer can share it, which is
/// why `S` is usually an `Rc<_>`.
///
/// # Typical usage
///
/// ```ignore
/// let store = Rc::new(JsonFileStore::open(path)?);
/// let mut board = Board::new(store, &Config::default());
/// board.handle(Command::Select(SlotIndex(2)))?;
/// board.handle(Command::Resize { direction: ScaleDirection::Increase, amplified: false })?;
/// ```
pub struct Board<S: KeyValueStore + Clone> {
    slots: SlotStore<S>,
    transform: TransformEngine,
    catalog: LayoutCatalog,
    selector: LayoutSelector,
    router: InputRouter,
    uploads: UploadTracker,
    labels: LabelDesigner<S>,
    upload_tx: Option<mpsc::Sender<Command>>,
    view_tx: Option<mpsc::Sender<ViewEvent>>,
}

impl<S: KeyValueStore + Clone> Board<S> {
    /// Restore the board from `store` using the settings in `config`.
    ///
    /// The style tag starts as the first catalog entry's style; the slot
    /// count is whatever was persisted.
    pub fn new(store: S, config: &Config) -> Self {
        let slots = SlotStore::load_bounded(
            store.clone(),
            config.storage.slots_key.as_str(),
            config.default_slot_count,
            config.transform.bounds(),
        );
        let initial_style = config
            .layouts
            .first()
            .map(|d| d.style.clone())
            .unwrap_or_default();
        Self {
            slots,
            transform: TransformEngine::new(config.transform.clone()),
            catalog: config.layouts.clone(),
            selector: LayoutSelector::new(initial_style),
            router: InputRouter::new(),
            uploads: UploadTracker::new(),
            labels: LabelDesigner::load(store),
            upload_tx: None,
            view_tx: None,
        }
    }

    /// Attach a view event channel.
    ///
    /// The board sends:
    ///
    /// - [`ViewEvent::Board`] after a command changed the slots,
    /// - [`ViewEvent::Labels`] after a label command changed the sheet,
    /// - [`ViewEvent::Notice`] when a command is rejected.
    ///
    /// Commands that change nothing publish nothing.
    pub fn set_view_sink(&mut self, tx: mpsc::Sender<ViewEvent>) {
        self.view_tx = Some(tx);
    }

    /// Attach the command channel that upload reader threads report into.
    ///
    /// Without one, uploads are read synchronously inside
    /// [`handle`](Board::handle).
    pub fn set_upload_sink(&mut self, tx: mpsc::Sender<Command>) {
        self.upload_tx = Some(tx);
    }

    pub fn slots(&self) -> &SlotStore<S> {
        &self.slots
    }

    pub fn catalog(&self) -> &LayoutCatalog {
        &self.catalog
    }

    pub fn labels(&self) -> &LabelDesigner<S> {
        &self.labels
    }

    pub fn selection(&self) -> Selection {
        self.slots.selection()
    }

    /// Style tag of the active layout.
    pub fn style(&self) -> &str {
        self.selector.style()
    }

    /// Number of slots with an upload still being read.
    pub fn uploads_in_flight(&self) -> usize {
        self.uploads.in_flight()
    }

    /// Process a single [`Command`].
    ///
    /// Out-of-range indices and transforms without a selection are silent
    /// no-ops.  Errors are also published as notices.
    pub fn handle(&mut self, cmd: Command) -> Result<(), BoardError> {
        match self.dispatch(cmd) {
            Ok(changed) => {
                self.publish(changed);
                Ok(())
            }
            Err(e) => {
                warn!("command rejected: {}", e);
                self.notify(e.to_string());
                Err(e)
            }
        }
    }

    /// Route a key-down event and execute the resulting command.
    ///
    /// The returned outcome tells the UI surface whether to cancel its
    /// default handling of the key.
    pub fn handle_key(&mut self, event: &KeyEvent) -> KeyOutcome {
        let outcome = self.router.route(event, self.slots.selection());
        if let Some(cmd) = outcome.command.clone() {
            if let Err(e) = self.handle(cmd) {
                warn!("key {:?}: {}", event.key, e);
            }
        }
        outcome
    }

    fn dispatch(&mut self, cmd: Command) -> Result<Changed, BoardError> {
        let changed = match cmd {
            Command::Select(SlotIndex(index)) => {
                debug!("select slot {}", index);
                self.slots.select(index).into()
            }

            Command::Key(event) => {
                // `handle_key` publishes on its own.
                self.handle_key(&event);
                Changed::Nothing
            }

            Command::Resize {
                direction,
                amplified,
            } => self
                .transform
                .resize_active(&mut self.slots, direction, amplified)
                .into(),

            Command::Move {
                direction,
                amplified,
            } => self
                .transform
                .move_active(&mut self.slots, direction, amplified)
                .into(),

            Command::Flip(SlotIndex(index)) => self.transform.flip(&mut self.slots, index).into(),

            Command::ApplyLayout(id) => {
                let descriptor = self
                    .catalog
                    .find(&id)
                    .ok_or_else(|| BoardError::UnknownLayout(id.clone()))?;
                self.selector.apply(&mut self.slots, descriptor);
                Changed::Slots
            }

            Command::Upload {
                index,
                path,
                media_type,
            } => {
                let media_type = upload::resolve_media_type(&path, media_type.as_deref());
                upload::check_image(&media_type)?;
                if index >= self.slots.len() {
                    debug!("upload into slot {} ignored: out of range", index);
                    return Ok(Changed::Nothing);
                }
                let generation = self.uploads.begin(index);
                info!(
                    "upload {} ({}) into slot {}",
                    path.display(),
                    media_type,
                    index
                );
                let pending = PendingUpload {
                    index,
                    generation,
                    path,
                    media_type,
                };
                if let Some(tx) = self.upload_tx.clone() {
                    pending.spawn(tx);
                    Changed::Nothing
                } else {
                    let payload = match upload::read_data_uri(&pending.path, &pending.media_type)
                    {
                        Ok(payload) => payload,
                        Err(e) => {
                            self.uploads.finish(index, generation);
                            return Err(e.into());
                        }
                    };
                    self.complete_upload(index, generation, payload).into()
                }
            }

            Command::UploadComplete {
                index,
                generation,
                payload,
            } => self.complete_upload(index, generation, payload).into(),

            Command::UploadFailed {
                index,
                generation,
                reason,
            } => {
                if self.uploads.finish(index, generation) {
                    return Err(BoardError::UploadFailed { index, reason });
                }
                debug!(
                    "stale upload failure for slot {} (generation {})",
                    index, generation
                );
                Changed::Nothing
            }

            Command::RemoveContent(SlotIndex(index)) => {
                info!("remove content of slot {}", index);
                self.slots.remove_content(index).into()
            }

            Command::ToggleBorders => {
                let visible = self.slots.toggle_all_borders();
                info!("borders {}", if visible { "shown" } else { "hidden" });
                Changed::Slots
            }

            Command::Duplicate => match self.slots.duplicate_from_active() {
                Some(source) => {
                    info!("duplicated slot {} into every slot", source);
                    Changed::Slots
                }
                None => {
                    debug!("duplicate: no source slot");
                    Changed::Nothing
                }
            },

            Command::Clear => {
                info!("clear");
                self.slots.clear();
                self.uploads.reset();
                Changed::Slots
            }

            Command::Label(cmd) => {
                debug!("label {:?}", cmd);
                if self.labels.handle(cmd)? {
                    Changed::Labels
                } else {
                    Changed::Nothing
                }
            }
        };
        Ok(changed)
    }

    /// Apply a finished read unless a newer upload into the same slot has
    /// started since.
    fn complete_upload(&mut self, index: usize, generation: u64, payload: String) -> bool {
        if !self.uploads.finish(index, generation) {
            debug!(
                "discarding stale upload for slot {} (generation {})",
                index, generation
            );
            return false;
        }
        self.slots.set_content(index, payload)
    }

    //  Views

    /// Snapshot of everything the layout renderer needs.
    pub fn view(&self) -> BoardView {
        BoardView {
            style: self.selector.style().to_string(),
            slots: self
                .slots
                .slots()
                .iter()
                .map(|slot| SlotView {
                    content: slot.content.clone(),
                    borders_visible: slot.borders_visible,
                    scale: slot.scale,
                    offset: (slot.offset.x, slot.offset.y),
                    flipped: slot.flipped,
                })
                .collect(),
            any_borders_visible: self.slots.any_borders_visible(),
            active: self.slots.selection().index(),
        }
    }

    pub fn label_view(&self) -> LabelSheetView {
        self.labels.view()
    }

    /// Send both views, e.g. right after a renderer attaches.
    pub fn publish_all(&self) {
        self.send(ViewEvent::Board(self.view()));
        self.send(ViewEvent::Labels(self.label_view()));
    }

    fn publish(&self, changed: Changed) {
        match changed {
            Changed::Nothing => {}
            Changed::Slots => self.send(ViewEvent::Board(self.view())),
            Changed::Labels => self.send(ViewEvent::Labels(self.label_view())),
        }
    }

    fn notify(&self, message: String) {
        self.send(ViewEvent::Notice(message));
    }

    fn send(&self, event: ViewEvent) {
        if let Some(tx) = &self.view_tx {
            let _ = tx.send(event);
        }
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Direction, ScaleDirection};
    use crate::label::LabelCommand;
    use crate::slots::{Offset, Slot, DEFAULT_SLOTS_KEY};
    use crate::storage::memory::MemoryStore;
    use std::cell::RefCell;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;
    use std::time::Duration;

    fn make_board() -> Board<Rc<MemoryStore>> {
        Board::new(Rc::new(MemoryStore::new()), &Config::default())
    }

    /// Board with a view channel attached; returns the receiver too.
    fn watched_board() -> (Board<Rc<MemoryStore>>, mpsc::Receiver<ViewEvent>) {
        let mut b = make_board();
        let (tx, rx) = mpsc::channel();
        b.set_view_sink(tx);
        (b, rx)
    }

    fn fill(b: &mut Board<Rc<MemoryStore>>, indices: &[usize]) {
        for &i in indices {
            let generation = b.uploads.begin(i);
            b.handle(Command::UploadComplete {
                index: i,
                generation,
                payload: format!("data:image/png;base64,{}", i),
            })
            .unwrap();
        }
    }

    fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::File::create(&path).unwrap().write_all(bytes).unwrap();
        path
    }

    fn resize(direction: ScaleDirection) -> Command {
        Command::Resize {
            direction,
            amplified: false,
        }
    }

    #[test]
    fn starts_with_default_slots_and_first_style() {
        let b = make_board();
        assert_eq!(b.slots().len(), 6);
        assert_eq!(b.style(), "rectangle-style1");
        assert_eq!(b.selection(), Selection::None);
        let view = b.view();
        assert_eq!(view.slots.len(), 6);
        assert!(view.any_borders_visible);
        assert_eq!(view.active, None);
    }

    #[test]
    fn select_then_resize_grows_only_active_slot() {
        let mut b = make_board();
        b.handle(Command::Select(SlotIndex(2))).unwrap();
        b.handle(resize(ScaleDirection::Increase)).unwrap();
        let slots = b.slots().slots();
        assert!((slots[2].scale - 101.0).abs() < 1e-9);
        for (i, slot) in slots.iter().enumerate() {
            if i != 2 {
                assert_eq!(slot, &Slot::default());
            }
        }
    }

    #[test]
    fn move_without_selection_changes_nothing() {
        let (mut b, rx) = watched_board();
        let before = b.slots().slots().to_vec();
        let writes = b.slots().store().writes();
        b.handle(Command::Move {
            direction: Direction::Left,
            amplified: false,
        })
        .unwrap();
        assert_eq!(b.slots().slots(), &before[..]);
        assert_eq!(b.slots().store().writes(), writes);
        assert!(rx.try_recv().is_err(), "no-ops publish nothing");
    }

    #[test]
    fn amplified_move_uses_large_step() {
        let mut b = make_board();
        b.handle(Command::Select(SlotIndex(0))).unwrap();
        b.handle(Command::Move {
            direction: Direction::Up,
            amplified: true,
        })
        .unwrap();
        b.handle(Command::Move {
            direction: Direction::Right,
            amplified: false,
        })
        .unwrap();
        assert_eq!(b.slots().slot(0).unwrap().offset, Offset::new(1.0, -10.0));
    }

    #[test]
    fn apply_layout_keeps_overlapping_prefix() {
        let mut b = make_board();
        b.handle(Command::ApplyLayout("rect7".into())).unwrap();
        assert_eq!(b.slots().len(), 12);
        b.handle(Command::ApplyLayout("pasha2".into())).unwrap();
        b.handle(Command::ApplyLayout("rect6".into())).unwrap();
        b.handle(Command::ApplyLayout("rect4".into())).unwrap();
        // 4 slots now; give them content, grow to 8 and shrink back.
        fill(&mut b, &[0, 1, 2, 3]);
        let first_four = b.slots().slots().to_vec();
        b.handle(Command::ApplyLayout("pasha2".into())).unwrap();
        b.handle(Command::ApplyLayout("pasha1".into())).unwrap();
        assert_eq!(b.slots().slots(), &first_four[..]);
        assert_eq!(b.style(), "rectangle-pasha");
    }

    #[test]
    fn unknown_layout_is_rejected_with_notice() {
        let (mut b, rx) = watched_board();
        let err = b.handle(Command::ApplyLayout("hexagon".into())).unwrap_err();
        assert!(matches!(err, BoardError::UnknownLayout(ref id) if id == "hexagon"));
        assert_eq!(b.slots().len(), 6);
        let events: Vec<ViewEvent> = rx.try_iter().collect();
        assert!(
            matches!(events.as_slice(), [ViewEvent::Notice(msg)] if msg.contains("hexagon")),
            "got: {events:#?}"
        );
    }

    #[test]
    fn layout_change_keeps_dangling_selection_safe() {
        let mut b = make_board();
        b.handle(Command::ApplyLayout("rect7".into())).unwrap();
        b.handle(Command::Select(SlotIndex(10))).unwrap();
        b.handle(Command::ApplyLayout("a5".into())).unwrap();
        assert_eq!(b.selection(), Selection::Selected(10));
        let before = b.slots().slots().to_vec();
        b.handle(resize(ScaleDirection::Decrease)).unwrap();
        b.handle(Command::Move {
            direction: Direction::Down,
            amplified: true,
        })
        .unwrap();
        assert_eq!(b.slots().slots(), &before[..]);
        assert_eq!(b.view().active, Some(10));
    }

    #[test]
    fn flip_ignores_selection() {
        let mut b = make_board();
        b.handle(Command::Select(SlotIndex(1))).unwrap();
        b.handle(Command::Flip(SlotIndex(4))).unwrap();
        assert!(b.slots().slot(4).unwrap().flipped);
        assert!(!b.slots().slot(1).unwrap().flipped);
        b.handle(Command::Flip(SlotIndex(4))).unwrap();
        assert!(!b.slots().slot(4).unwrap().flipped);
        b.handle(Command::Flip(SlotIndex(99))).unwrap();
    }

    #[test]
    fn non_image_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "notes.pdf", b"%PDF-1.4");
        let (mut b, rx) = watched_board();
        let result = b.handle(Command::Upload {
            index: 0,
            path,
            media_type: Some("application/pdf".into()),
        });
        assert!(matches!(
            result,
            Err(BoardError::Upload(UploadError::InvalidFileType(_)))
        ));
        assert_eq!(b.slots().slot(0).unwrap().content, None);
        assert_eq!(b.uploads_in_flight(), 0);
        let events: Vec<ViewEvent> = rx.try_iter().collect();
        assert!(matches!(events.as_slice(), [ViewEvent::Notice(_)]));
    }

    #[test]
    fn guessed_media_type_gates_upload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "readme.txt", b"hello");
        let mut b = make_board();
        assert!(b
            .handle(Command::Upload {
                index: 1,
                path,
                media_type: None,
            })
            .is_err());
        assert_eq!(b.slots().slot(1).unwrap().content, None);
    }

    #[test]
    fn synchronous_upload_sets_content_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "pic.png", b"abc");
        let mut b = make_board();
        b.handle(Command::Select(SlotIndex(3))).unwrap();
        b.handle(resize(ScaleDirection::Increase)).unwrap();
        let scale = b.slots().slot(3).unwrap().scale;
        b.handle(Command::Upload {
            index: 3,
            path,
            media_type: None,
        })
        .unwrap();
        let slot = b.slots().slot(3).unwrap();
        assert_eq!(slot.content.as_deref(), Some("data:image/png;base64,YWJj"));
        assert_eq!(slot.scale, scale);
        assert_eq!(b.uploads_in_flight(), 0);
    }

    #[test]
    fn out_of_range_upload_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "pic.png", b"abc");
        let mut b = make_board();
        b.handle(Command::Upload {
            index: 6,
            path,
            media_type: None,
        })
        .unwrap();
        assert!(b.slots().slots().iter().all(|s| s.content.is_none()));
        assert_eq!(b.uploads_in_flight(), 0);
    }

    #[test]
    fn unreadable_upload_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut b = make_board();
        let result = b.handle(Command::Upload {
            index: 0,
            path: dir.path().join("gone.png"),
            media_type: None,
        });
        assert!(matches!(result, Err(BoardError::Upload(UploadError::Io { .. }))));
        assert_eq!(b.uploads_in_flight(), 0);
    }

    #[test]
    fn threaded_upload_round_trip_discards_stale_read() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_file(dir.path(), "first.png", b"one");
        let second = write_file(dir.path(), "second.jpg", b"two");
        let mut b = make_board();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        b.set_upload_sink(cmd_tx);

        b.handle(Command::Upload {
            index: 0,
            path: first,
            media_type: None,
        })
        .unwrap();
        b.handle(Command::Upload {
            index: 0,
            path: second,
            media_type: None,
        })
        .unwrap();
        assert_eq!(b.slots().slot(0).unwrap().content, None, "no loading state");

        let mut completions: Vec<Command> = (0..2)
            .map(|_| cmd_rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        // Feed the newest read first so the older one arrives last.
        completions.sort_by_key(|c| match c {
            Command::UploadComplete { generation, .. } => std::cmp::Reverse(*generation),
            _ => std::cmp::Reverse(0),
        });
        for cmd in completions {
            b.handle(cmd).unwrap();
        }
        assert_eq!(
            b.slots().slot(0).unwrap().content.as_deref(),
            Some("data:image/jpeg;base64,dHdv")
        );
        assert_eq!(b.uploads_in_flight(), 0);
    }

    #[test]
    fn threaded_read_failure_notifies_and_settles() {
        let dir = tempfile::tempdir().unwrap();
        let (mut b, views) = watched_board();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        b.set_upload_sink(cmd_tx);

        b.handle(Command::Upload {
            index: 0,
            path: dir.path().join("gone.png"),
            media_type: None,
        })
        .unwrap();
        assert_eq!(b.uploads_in_flight(), 1);

        let failure = cmd_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(failure, Command::UploadFailed { index: 0, .. }));
        let result = b.handle(failure);
        assert!(matches!(result, Err(BoardError::UploadFailed { index: 0, .. })));
        assert_eq!(b.uploads_in_flight(), 0);
        assert_eq!(b.slots().slot(0).unwrap().content, None);
        let notices: Vec<ViewEvent> = views.try_iter().collect();
        assert!(
            matches!(notices.as_slice(), [ViewEvent::Notice(m)] if m.contains("gone.png")),
            "got: {notices:#?}"
        );
    }

    #[test]
    fn stale_failure_is_ignored() {
        let (mut b, views) = watched_board();
        fill(&mut b, &[1]);
        let _ = views.try_iter().count();
        let stale = b.uploads.begin(1);
        let latest = b.uploads.begin(1);
        b.handle(Command::UploadFailed {
            index: 1,
            generation: stale,
            reason: "gone".into(),
        })
        .unwrap();
        assert!(views.try_recv().is_err());
        assert!(b.uploads.is_current(1, latest));
        assert_eq!(
            b.slots().slot(1).unwrap().content.as_deref(),
            Some("data:image/png;base64,1")
        );
    }

    #[test]
    fn completion_after_clear_is_discarded() {
        let mut b = make_board();
        let generation = b.uploads.begin(2);
        b.handle(Command::Clear).unwrap();
        b.handle(Command::UploadComplete {
            index: 2,
            generation,
            payload: "data:image/png;base64,AA==".into(),
        })
        .unwrap();
        assert_eq!(b.slots().slot(2).unwrap().content, None);
    }

    #[test]
    fn remove_content_and_duplicate() {
        let mut b = make_board();
        fill(&mut b, &[1, 4]);
        b.handle(Command::RemoveContent(SlotIndex(1))).unwrap();
        assert_eq!(b.slots().slot(1).unwrap().content, None);
        b.handle(Command::Duplicate).unwrap();
        assert!(b
            .slots()
            .slots()
            .iter()
            .all(|s| s.content.as_deref() == Some("data:image/png;base64,4")));
    }

    #[test]
    fn toggle_borders_labels_the_control() {
        let (mut b, rx) = watched_board();
        b.handle(Command::ToggleBorders).unwrap();
        assert!(!b.view().any_borders_visible);
        b.handle(Command::ToggleBorders).unwrap();
        assert!(b.view().any_borders_visible);
        let events: Vec<ViewEvent> = rx.try_iter().collect();
        assert!(
            matches!(events.as_slice(), [ViewEvent::Board(first), ViewEvent::Board(second)]
                if !first.any_borders_visible && second.any_borders_visible),
            "got: {events:#?}"
        );
    }

    #[test]
    fn clear_on_nine_slots() {
        let mut b = make_board();
        b.handle(Command::ApplyLayout("rect6".into())).unwrap();
        fill(&mut b, &[0, 5, 8]);
        b.handle(Command::Select(SlotIndex(5))).unwrap();
        b.handle(resize(ScaleDirection::Increase)).unwrap();
        assert!(b.slots().store().contains(DEFAULT_SLOTS_KEY));

        b.handle(Command::Clear).unwrap();
        assert_eq!(b.slots().len(), 9);
        assert!(b.slots().slots().iter().all(|s| *s == Slot::default()));
        assert_eq!(b.selection(), Selection::None);
        assert!(!b.slots().store().contains(DEFAULT_SLOTS_KEY));
    }

    #[test]
    fn state_survives_restart_without_content() {
        let store = Rc::new(MemoryStore::new());
        let mut b = Board::new(Rc::clone(&store), &Config::default());
        b.handle(Command::ApplyLayout("rect3".into())).unwrap();
        fill(&mut b, &[0]);
        b.handle(Command::Flip(SlotIndex(0))).unwrap();
        b.handle(Command::Label(LabelCommand::ApplyWeightPreset("85".into())))
            .unwrap();
        drop(b);

        let b = Board::new(store, &Config::default());
        assert_eq!(b.slots().len(), 4);
        let slot = b.slots().slot(0).unwrap();
        assert!(slot.flipped);
        assert_eq!(slot.content, None);
        assert_eq!(b.labels().template().weight, "85g");
    }

    #[test]
    fn restart_keeps_scale_beyond_default_maximum() {
        let mut config = Config::default();
        config.transform.max_scale = 800.0;
        let store = Rc::new(MemoryStore::new());
        let mut b = Board::new(Rc::clone(&store), &config);
        b.handle(Command::Select(SlotIndex(0))).unwrap();
        for _ in 0..100 {
            b.handle(Command::Resize {
                direction: ScaleDirection::Increase,
                amplified: true,
            })
            .unwrap();
        }
        assert_eq!(b.slots().slot(0).unwrap().scale, 800.0);
        drop(b);

        let b = Board::new(store, &config);
        assert_eq!(b.slots().slot(0).unwrap().scale, 800.0);
    }

    #[test]
    fn label_commands_publish_label_view() {
        let (mut b, rx) = watched_board();
        b.handle(Command::Label(LabelCommand::SaveProfile { name: "Sheet".into() }))
            .unwrap();
        b.handle(Command::Label(LabelCommand::ApplyProfile("missing".into())))
            .unwrap();
        let events: Vec<ViewEvent> = rx.try_iter().collect();
        assert!(
            matches!(events.as_slice(), [ViewEvent::Labels(v)]
                if v.profiles.len() == 1 && v.selected_profile.is_some()),
            "got: {events:#?}"
        );
    }

    #[test]
    fn publish_all_sends_both_views() {
        let (b, rx) = watched_board();
        b.publish_all();
        let events: Vec<ViewEvent> = rx.try_iter().collect();
        assert!(matches!(
            events.as_slice(),
            [ViewEvent::Board(_), ViewEvent::Labels(_)]
        ));
    }

    //  Keyboard

    #[test]
    fn keys_drive_transforms_and_report_prevent_default() {
        let mut b = make_board();
        let down = KeyEvent::new("ArrowDown", false);
        assert!(!b.handle_key(&down).prevent_default, "nothing selected");
        assert_eq!(b.slots().slot(0).unwrap().offset, Offset::default());

        b.handle(Command::Select(SlotIndex(0))).unwrap();
        assert!(b.handle_key(&down).prevent_default);
        assert!(!b.handle_key(&KeyEvent::new("ArrowLeft", true)).prevent_default);
        assert_eq!(b.slots().slot(0).unwrap().offset, Offset::new(-10.0, 1.0));

        b.handle_key(&KeyEvent::new("+", true));
        assert!((b.slots().slot(0).unwrap().scale - 105.0).abs() < 1e-9);

        b.handle_key(&KeyEvent::new("-", false).in_text_entry());
        assert!((b.slots().slot(0).unwrap().scale - 105.0).abs() < 1e-9);
    }

    #[test]
    fn key_command_goes_through_router() {
        let mut b = make_board();
        b.handle(Command::Select(SlotIndex(1))).unwrap();
        b.handle(Command::Key(KeyEvent::new("_", false))).unwrap();
        assert!((b.slots().slot(1).unwrap().scale - 99.0).abs() < 1e-9);
    }

    //  Shared storage

    /// Store that records every key written, to check the two owners of
    /// the shared store keep to their own keys.
    #[derive(Debug, Default)]
    struct RecorderStore {
        inner: MemoryStore,
        keys: RefCell<Vec<String>>,
    }

    impl KeyValueStore for RecorderStore {
        type Error = std::convert::Infallible;

        fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
            self.keys.borrow_mut().push(key.to_string());
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), Self::Error> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn slots_and_labels_write_separate_keys() {
        let store = Rc::new(RecorderStore::default());
        let mut b = Board::new(Rc::clone(&store), &Config::default());
        b.handle(Command::ToggleBorders).unwrap();
        b.handle(Command::Label(LabelCommand::ApplyWeightPreset("45".into())))
            .unwrap();
        b.handle(Command::Label(LabelCommand::SaveProfile { name: "p".into() }))
            .unwrap();
        assert_eq!(
            *store.keys.borrow(),
            vec![
                "images".to_string(),
                "hb-label-template-v1".to_string(),
                "hb-label-profiles-v1".to_string(),
            ]
        );
    }
}
