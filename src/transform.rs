//! Per-slot scale, pan and flip.
//!
//! Scaling is multiplicative so repeated steps feel the same at any size;
//! panning is additive and unbounded (the renderer clips).  Scale and pan
//! act on the selected slot and silently do nothing when the selection is
//! empty or dangles.  Flip addresses a slot directly.

use crate::command::{Direction, ScaleDirection};
use crate::slots::{ScaleBounds, SlotStore, MAX_SCALE, MIN_SCALE};
use crate::traits::KeyValueStore;
use log::debug;
use serde::{Deserialize, Serialize};

/// Step sizes and scale bounds.
///
/// The decrease factor mirrors the increase factor around `1.0`, so a
/// `scale_step` of `1.01` shrinks by `0.99`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Multiplicative factor per resize step.  Default: `1.01`.
    pub scale_step: f64,
    /// Factor per resize step with the modifier held.  Default: `1.05`.
    pub amplified_scale_step: f64,
    /// Pixels per move step.  Default: `1`.
    pub move_step: f64,
    /// Pixels per move step with the modifier held.  Default: `10`.
    pub amplified_move_step: f64,
    /// Default: `10`.
    pub min_scale: f64,
    /// Default: `400`.
    pub max_scale: f64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            scale_step: 1.01,
            amplified_scale_step: 1.05,
            move_step: 1.0,
            amplified_move_step: 10.0,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }
}

impl TransformConfig {
    /// Factor applied to the current scale for one resize step.
    pub fn scale_factor(&self, direction: ScaleDirection, amplified: bool) -> f64 {
        let step = if amplified {
            self.amplified_scale_step
        } else {
            self.scale_step
        };
        match direction {
            ScaleDirection::Increase => step,
            ScaleDirection::Decrease => 2.0 - step,
        }
    }

    /// The configured scale range, also used when restoring slots.
    pub fn bounds(&self) -> ScaleBounds {
        ScaleBounds {
            min: self.min_scale,
            max: self.max_scale,
        }
    }

    /// Pixel distance of one move step.
    pub fn move_distance(&self, amplified: bool) -> f64 {
        if amplified {
            self.amplified_move_step
        } else {
            self.move_step
        }
    }
}

/// Applies bounded transform steps to the slot collection.
#[derive(Debug, Clone, Default)]
pub struct TransformEngine {
    config: TransformConfig,
}

impl TransformEngine {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Scale the selected slot by one step, clamped to the configured
    /// bounds.  Returns whether a slot was touched.
    pub fn resize_active<S: KeyValueStore>(
        &self,
        slots: &mut SlotStore<S>,
        direction: ScaleDirection,
        amplified: bool,
    ) -> bool {
        let Some(index) = slots.selection().index() else {
            debug!("resize {}: nothing selected", direction);
            return false;
        };
        let factor = self.config.scale_factor(direction, amplified);
        let bounds = self.config.bounds();
        slots.update(index, |slot| {
            slot.scale = bounds.clamp(slot.scale * factor);
        })
    }

    /// Pan the selected slot by one step.  Returns whether a slot was
    /// touched.
    pub fn move_active<S: KeyValueStore>(
        &self,
        slots: &mut SlotStore<S>,
        direction: Direction,
        amplified: bool,
    ) -> bool {
        let Some(index) = slots.selection().index() else {
            debug!("move {}: nothing selected", direction);
            return false;
        };
        let distance = self.config.move_distance(amplified);
        let (dx, dy) = direction.delta();
        slots.update(index, |slot| {
            slot.offset.x += dx * distance;
            slot.offset.y += dy * distance;
        })
    }

    /// Toggle the mirror flag of the slot at `index`, selected or not.
    pub fn flip<S: KeyValueStore>(&self, slots: &mut SlotStore<S>, index: usize) -> bool {
        slots.update(index, |slot| slot.flipped = !slot.flipped)
    }
}
