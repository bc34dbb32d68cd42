//! Print-sheet geometry: where each copy of the template lands.

use super::template::{LabelTemplate, MAX_COLS, MAX_LABEL_COUNT};
use serde::Serialize;

/// Position and size of one label on the sheet, in millimetres from the
/// sheet's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelPlacement {
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

/// Grid parameters extracted from a template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetGeometry {
    pub count: usize,
    pub cols: usize,
    pub label_width_mm: f64,
    pub label_height_mm: f64,
    pub top_offset_mm: f64,
    pub left_offset_mm: f64,
    pub horizontal_gap_mm: f64,
    pub vertical_gap_mm: f64,
}

impl SheetGeometry {
    /// Geometry of `template`; count and columns are kept in
    /// `1..=MAX_LABEL_COUNT` and `1..=MAX_COLS`.
    pub fn from_template(template: &LabelTemplate) -> Self {
        Self {
            count: template.count.clamp(1, MAX_LABEL_COUNT) as usize,
            cols: template.cols.clamp(1, MAX_COLS) as usize,
            label_width_mm: template.label_width_mm,
            label_height_mm: template.label_height_mm,
            top_offset_mm: template.top_offset_mm,
            left_offset_mm: template.left_offset_mm,
            horizontal_gap_mm: template.horizontal_gap_mm,
            vertical_gap_mm: template.vertical_gap_mm,
        }
    }

    pub fn rows(&self) -> usize {
        self.count.div_ceil(self.cols)
    }

    /// Row-major placements of every label.
    pub fn placements(&self) -> Vec<LabelPlacement> {
        (0..self.count)
            .map(|index| {
                let row = index / self.cols;
                let col = index % self.cols;
                LabelPlacement {
                    index,
                    row,
                    col,
                    x_mm: self.left_offset_mm
                        + col as f64 * (self.label_width_mm + self.horizontal_gap_mm),
                    y_mm: self.top_offset_mm
                        + row as f64 * (self.label_height_mm + self.vertical_gap_mm),
                    width_mm: self.label_width_mm,
                    height_mm: self.label_height_mm,
                }
            })
            .collect()
    }

    /// Width and height covered by the labels including the offsets.
    pub fn extent_mm(&self) -> (f64, f64) {
        let cols = self.cols.min(self.count) as f64;
        let rows = self.rows() as f64;
        let width = self.left_offset_mm + cols * self.label_width_mm
            + (cols - 1.0).max(0.0) * self.horizontal_gap_mm;
        let height = self.top_offset_mm + rows * self.label_height_mm
            + (rows - 1.0).max(0.0) * self.vertical_gap_mm;
        (width, height)
    }
}
