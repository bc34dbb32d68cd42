//! Slot collection and its durable projection.
//!
//! The [`SlotStore`] owns an ordered, fixed-length collection of [`Slot`]s
//! plus the [`Selection`].  Every mutation immediately writes the
//! serializable projection of the collection to the injected
//! [`KeyValueStore`].
//!
//! The projection deliberately leaves out slot content: image payloads are
//! large, so after a reload every slot starts empty and keeps only its
//! borders / scale / offset / flip state.

use crate::traits::KeyValueStore;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Scale of untouched content, in percent of the slot's base size.
pub const BASE_SCALE: f64 = 100.0;
/// Lower bound for [`Slot::scale`].
pub const MIN_SCALE: f64 = 10.0;
/// Upper bound for [`Slot::scale`].
pub const MAX_SCALE: f64 = 400.0;
/// Slot count used when nothing (valid) is persisted.
pub const DEFAULT_SLOT_COUNT: usize = 6;
/// Storage key of the persisted slot projection.
pub const DEFAULT_SLOTS_KEY: &str = "images";

/// Pan offset of a slot's content, in pixels.  Unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

impl Offset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One rectangle of the layout grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    /// Renderable image payload (a `data:` URI), or `None` when empty.
    pub content: Option<String>,
    pub borders_visible: bool,
    /// Percentage of the base size, kept within `[MIN_SCALE, MAX_SCALE]`.
    pub scale: f64,
    pub offset: Offset,
    /// Horizontal mirror.
    pub flipped: bool,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            content: None,
            borders_visible: true,
            scale: BASE_SCALE,
            offset: Offset::default(),
            flipped: false,
        }
    }
}

impl Slot {
    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }
}

/// Inclusive range a slot's scale is kept in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for ScaleBounds {
    fn default() -> Self {
        Self {
            min: MIN_SCALE,
            max: MAX_SCALE,
        }
    }
}

impl ScaleBounds {
    pub fn clamp(self, scale: f64) -> f64 {
        scale.clamp(self.min, self.max)
    }
}

/// Which slot, if any, receives transform commands.
///
/// A selected index may dangle after a layout shrinks the collection; every
/// consumer bounds-checks instead of the store fixing the selection up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Selected(usize),
}

impl Selection {
    pub fn index(self) -> Option<usize> {
        match self {
            Selection::None => None,
            Selection::Selected(i) => Some(i),
        }
    }
}

//  Durable projection

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct PersistedSize {
    width: f64,
    #[serde(default = "base_scale")]
    height: f64,
}

impl Default for PersistedSize {
    fn default() -> Self {
        Self {
            width: BASE_SCALE,
            height: BASE_SCALE,
        }
    }
}

fn base_scale() -> f64 {
    BASE_SCALE
}

fn default_true() -> bool {
    true
}

/// One entry of the persisted array.  Unknown fields (such as an inline
/// `src` written by older builds) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSlot {
    #[serde(default = "default_true")]
    show_borders: bool,
    #[serde(default)]
    size: PersistedSize,
    #[serde(default)]
    position: Offset,
    #[serde(default)]
    flipped: bool,
}

impl From<&Slot> for PersistedSlot {
    fn from(slot: &Slot) -> Self {
        Self {
            show_borders: slot.borders_visible,
            size: PersistedSize {
                width: slot.scale,
                height: BASE_SCALE,
            },
            position: slot.offset,
            flipped: slot.flipped,
        }
    }
}

impl PersistedSlot {
    /// Rebuild a slot (without content), clamping the scale to `bounds`.
    fn restore(self, bounds: ScaleBounds) -> Slot {
        let scale = if self.size.width.is_finite() {
            bounds.clamp(self.size.width)
        } else {
            BASE_SCALE
        };
        let offset = if self.position.x.is_finite() && self.position.y.is_finite() {
            self.position
        } else {
            Offset::default()
        };
        Slot {
            content: None,
            borders_visible: self.show_borders,
            scale,
            offset,
            flipped: self.flipped,
        }
    }
}

/// Why a persisted value could not be restored.
#[derive(Debug, thiserror::Error)]
pub enum CorruptState {
    #[error("unparseable slot state: {0}")]
    Json(#[from] serde_json::Error),
    #[error("persisted slot collection is empty")]
    Empty,
}

/// Serialize the durable projection of `slots` (content excluded).
pub fn encode_slots(slots: &[Slot]) -> Result<String, serde_json::Error> {
    let projection: Vec<PersistedSlot> = slots.iter().map(PersistedSlot::from).collect();
    serde_json::to_string(&projection)
}

/// Parse a durable projection back into slots (all without content),
/// clamping each scale to `bounds`.
pub fn decode_slots(raw: &str, bounds: ScaleBounds) -> Result<Vec<Slot>, CorruptState> {
    let projection: Vec<PersistedSlot> = serde_json::from_str(raw)?;
    if projection.is_empty() {
        return Err(CorruptState::Empty);
    }
    Ok(projection.into_iter().map(|p| p.restore(bounds)).collect())
}

//  Store

/// Owner of the slot collection and the selection.
#[derive(Debug)]
pub struct SlotStore<S: KeyValueStore> {
    store: S,
    key: String,
    slots: Vec<Slot>,
    selection: Selection,
}

impl<S: KeyValueStore> SlotStore<S> {
    /// Restore the collection persisted under `key` with the default
    /// scale bounds.
    pub fn load(store: S, key: impl Into<String>, default_count: usize) -> Self {
        Self::load_bounded(store, key, default_count, ScaleBounds::default())
    }

    /// Restore the collection persisted under `key`, clamping restored
    /// scales to `bounds`.
    ///
    /// Absent or corrupt data falls back to `default_count` default slots.
    /// Corruption is logged, never surfaced.
    pub fn load_bounded(
        store: S,
        key: impl Into<String>,
        default_count: usize,
        bounds: ScaleBounds,
    ) -> Self {
        let key = key.into();
        let slots = match store.get(&key) {
            Ok(Some(raw)) => match decode_slots(&raw, bounds) {
                Ok(slots) => {
                    debug!("restored {} slot(s) from {:?}", slots.len(), key);
                    slots
                }
                Err(e) => {
                    warn!("{} under {:?}, using {} default slots", e, key, default_count);
                    vec![Slot::default(); default_count]
                }
            },
            Ok(None) => {
                debug!("no persisted slots under {:?}", key);
                vec![Slot::default(); default_count]
            }
            Err(e) => {
                warn!("failed to read {:?}: {}, using defaults", key, e);
                vec![Slot::default(); default_count]
            }
        };
        Self {
            store,
            key,
            slots,
            selection: Selection::None,
        }
    }

    //  Accessors

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// The selected slot, or `None` when nothing is selected or the
    /// selection dangles.
    pub fn active_slot(&self) -> Option<&Slot> {
        self.selection.index().and_then(|i| self.slots.get(i))
    }

    /// Aggregate used to label the border toggle.
    pub fn any_borders_visible(&self) -> bool {
        self.slots.iter().any(|s| s.borders_visible)
    }

    /// The backing key-value store.
    pub fn store(&self) -> &S {
        &self.store
    }

    //  Selection

    /// Select `index`.  Out-of-range picks are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.slots.len() {
            debug!("select {} ignored: only {} slot(s)", index, self.slots.len());
            return false;
        }
        self.selection = Selection::Selected(index);
        true
    }

    //  Mutations (each one persists)

    /// Apply `f` to the slot at `index`.  Returns `false` (and changes
    /// nothing) when `index` is out of range.
    pub fn update(&mut self, index: usize, f: impl FnOnce(&mut Slot)) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            debug!("slot {} out of range ({} slot(s))", index, self.slots.len());
            return false;
        };
        f(slot);
        self.save();
        true
    }

    /// Replace the content of the slot at `index`, leaving its other
    /// fields untouched.
    pub fn set_content(&mut self, index: usize, payload: impl Into<String>) -> bool {
        let payload = payload.into();
        self.update(index, |slot| slot.content = Some(payload))
    }

    pub fn remove_content(&mut self, index: usize) -> bool {
        self.update(index, |slot| slot.content = None)
    }

    /// Hide borders everywhere if any slot shows them, otherwise show them
    /// everywhere.  Returns the new collective value.
    pub fn toggle_all_borders(&mut self) -> bool {
        let visible = !self.any_borders_visible();
        for slot in &mut self.slots {
            slot.borders_visible = visible;
        }
        self.save();
        visible
    }

    /// Copy one slot (content and all flags) into every slot.
    ///
    /// The source is the selected slot when the selection is in range,
    /// otherwise the first slot with content.  Returns the source index, or
    /// `None` (no-op) when neither exists.
    pub fn duplicate_from_active(&mut self) -> Option<usize> {
        let source = self
            .selection
            .index()
            .filter(|&i| i < self.slots.len())
            .or_else(|| self.slots.iter().position(Slot::has_content))?;
        let template = self.slots[source].clone();
        let len = self.slots.len();
        self.slots = vec![template; len];
        self.save();
        Some(source)
    }

    /// Resize the collection to `count`, keeping slots below
    /// `min(old, new)` untouched and filling new indices with defaults.
    /// The selection is left alone, even if it now dangles.
    pub fn resize(&mut self, count: usize) {
        self.slots.resize_with(count, Slot::default);
        self.save();
    }

    /// Reset every slot to defaults (keeping the count), delete the
    /// persisted entry and drop the selection.
    pub fn clear(&mut self) {
        let len = self.slots.len();
        self.slots = vec![Slot::default(); len];
        self.selection = Selection::None;
        if let Err(e) = self.store.remove(&self.key) {
            warn!("failed to remove {:?}: {}", self.key, e);
        }
    }

    /// Write the durable projection.  Failures are logged and swallowed.
    pub fn save(&self) {
        match encode_slots(&self.slots) {
            Ok(json) => {
                if let Err(e) = self.store.set(&self.key, &json) {
                    warn!("failed to persist slots under {:?}: {}", self.key, e);
                }
            }
            Err(e) => warn!("failed to encode slots: {}", e),
        }
    }
}

//  Tests
