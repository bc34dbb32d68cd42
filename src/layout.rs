//! Layout catalog and selector.
//!
//! A [`LayoutDescriptor`] names a fixed slot count and the visual style tag
//! the renderer uses to size the rectangles.  Applying one resizes the
//! [`SlotStore`] with the prefix-preserving rule and swaps the style tag;
//! the selection is not touched.

use crate::slots::SlotStore;
use crate::traits::KeyValueStore;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One selectable layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDescriptor {
    pub id: String,
    /// Visual style tag handed to the renderer.
    pub style: String,
    pub slot_count: usize,
    /// Button caption.
    pub label: String,
}

impl LayoutDescriptor {
    pub fn new(
        id: impl Into<String>,
        style: impl Into<String>,
        slot_count: usize,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            style: style.into(),
            slot_count,
            label: label.into(),
        }
    }
}

/// Problems with a configured catalog.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("layout catalog is empty")]
    Empty,
    #[error("layout {0:?} has no slots")]
    NoSlots(String),
    #[error("duplicate layout id {0:?}")]
    DuplicateId(String),
}

/// The ordered, immutable list of layouts offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutCatalog {
    entries: Vec<LayoutDescriptor>,
}

impl Default for LayoutCatalog {
    /// The built-in print templates.
    fn default() -> Self {
        Self {
            entries: vec![
                LayoutDescriptor::new("rect1", "rectangle-style1", 2, "Large round x11"),
                LayoutDescriptor::new("rect2", "rectangle-style2", 6, "Small round x9"),
                LayoutDescriptor::new("rect3", "rectangle-style3", 4, "Large frame 14x10"),
                LayoutDescriptor::new("rect4", "rectangle-style4", 4, "Rectangle 13x9"),
                LayoutDescriptor::new("rect5", "rectangle-style5", 6, "Round x7"),
                LayoutDescriptor::new("rect6", "rectangle-style6", 9, "Logo 5.7x8"),
                LayoutDescriptor::new("rect7", "rectangle-style7", 12, "Round x6"),
                LayoutDescriptor::new("pasha1", "rectangle-pasha", 4, "Easter"),
                LayoutDescriptor::new("pasha2", "rectangle-pasha2", 20, "Easter small 5.4x4.1"),
                LayoutDescriptor::new("a5", "rectangle-style8", 1, "A5 145x225"),
            ],
        }
    }
}

impl LayoutCatalog {
    /// Build a catalog, rejecting empty lists, zero-slot layouts and
    /// repeated ids.
    pub fn new(entries: Vec<LayoutDescriptor>) -> Result<Self, LayoutError> {
        let catalog = Self { entries };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.entries.is_empty() {
            return Err(LayoutError::Empty);
        }
        let mut seen = HashSet::new();
        for entry in &self.entries {
            if entry.slot_count == 0 {
                return Err(LayoutError::NoSlots(entry.id.clone()));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(LayoutError::DuplicateId(entry.id.clone()));
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> &[LayoutDescriptor] {
        &self.entries
    }

    pub fn find(&self, id: &str) -> Option<&LayoutDescriptor> {
        self.entries.iter().find(|d| d.id == id)
    }

    /// The first entry, whose style is used before any layout is picked.
    pub fn first(&self) -> Option<&LayoutDescriptor> {
        self.entries.first()
    }
}

/// Tracks the active style tag and applies layouts to the slot store.
#[derive(Debug, Clone)]
pub struct LayoutSelector {
    style: String,
}

impl LayoutSelector {
    pub fn new(initial_style: impl Into<String>) -> Self {
        Self {
            style: initial_style.into(),
        }
    }

    /// Style tag of the most recently applied layout.
    pub fn style(&self) -> &str {
        &self.style
    }

    /// Resize `slots` to the descriptor's count and adopt its style.
    pub fn apply<S: KeyValueStore>(&mut self, slots: &mut SlotStore<S>, descriptor: &LayoutDescriptor) {
        info!(
            "layout {} ({} slot(s), style {})",
            descriptor.id, descriptor.slot_count, descriptor.style
        );
        self.style = descriptor.style.clone();
        slots.resize(descriptor.slot_count);
    }
}
