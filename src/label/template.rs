//! The single editable label template and the values derived from it.

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How dates are printed on the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    /// `MM/DD/YYYY`
    #[default]
    Us,
    /// `DD.MM.YYYY`
    Eu,
    /// `YYYY-MM-DD`
    Iso,
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateFormat::Us => write!(f, "us"),
            DateFormat::Eu => write!(f, "eu"),
            DateFormat::Iso => write!(f, "iso"),
        }
    }
}

pub fn format_date(date: NaiveDate, format: DateFormat) -> String {
    let pattern = match format {
        DateFormat::Us => "%m/%d/%Y",
        DateFormat::Eu => "%d.%m.%Y",
        DateFormat::Iso => "%Y-%m-%d",
    };
    date.format(pattern).to_string()
}

/// A named weight / tolerance / calories combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightPreset {
    pub id: &'static str,
    pub label: &'static str,
    /// `None` for the free-form preset, which only records its id.
    pub values: Option<PresetValues>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetValues {
    pub weight: &'static str,
    pub tolerance: &'static str,
    pub calories: &'static str,
}

pub const CUSTOM_PRESET: &str = "custom";

pub const WEIGHT_PRESETS: &[WeightPreset] = &[
    WeightPreset {
        id: "45",
        label: "45 g",
        values: Some(PresetValues {
            weight: "45g",
            tolerance: "+/-5g",
            calories: "Calories: 151 kcal",
        }),
    },
    WeightPreset {
        id: "85",
        label: "85 g",
        values: Some(PresetValues {
            weight: "85g",
            tolerance: "+/-5g",
            calories: "Calories per 100g: 370 kcal",
        }),
    },
    WeightPreset {
        id: CUSTOM_PRESET,
        label: "Custom values",
        values: None,
    },
];

/// Most labels a sheet may hold.
pub const MAX_LABEL_COUNT: u32 = 500;
/// Most columns a sheet may have.
pub const MAX_COLS: u32 = 50;
/// Smallest label edge, in millimetres.
pub const MIN_LABEL_EDGE_MM: f64 = 20.0;
/// Logo shown when the template names none.
pub const DEFAULT_LOGO_URL: &str = "qr-code.png";

pub fn find_preset(id: &str) -> Option<&'static WeightPreset> {
    WEIGHT_PRESETS.iter().find(|p| p.id == id)
}

/// Every field printed on (or used to lay out) a label.
///
/// Serialized in camelCase with the millimetre fields spelled `…MM`, so the
/// stored JSON stays readable by hand.  Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelTemplate {
    pub brand: String,
    pub subtitle: String,
    pub ingredients: String,
    pub calories: String,
    pub storage: String,

    /// Manufacturing date, `YYYY-MM-DD`.
    pub mfg_date: String,
    pub shelf_life_days: i64,
    pub date_format: DateFormat,

    pub website: String,
    pub email: String,
    pub instagram: String,
    pub note: String,

    pub weight_preset: String,
    pub weight: String,
    pub tolerance: String,
    pub origin: String,

    /// The QR / logo image.
    pub logo_url: Option<String>,
    #[serde(rename = "logoSizeMM")]
    pub logo_size_mm: f64,
    /// Extra badge image (e.g. "nut free"); `None` hides it.
    pub badge_url: Option<String>,
    #[serde(rename = "badgeSizeMM")]
    pub badge_size_mm: f64,

    pub count: u32,
    pub cols: u32,
    #[serde(rename = "labelWidthMM")]
    pub label_width_mm: f64,
    #[serde(rename = "labelHeightMM")]
    pub label_height_mm: f64,
    #[serde(rename = "topOffsetMM")]
    pub top_offset_mm: f64,
    #[serde(rename = "leftOffsetMM")]
    pub left_offset_mm: f64,
    #[serde(rename = "horizontalGapMM")]
    pub horizontal_gap_mm: f64,
    #[serde(rename = "verticalGapMM")]
    pub vertical_gap_mm: f64,
}

impl Default for LabelTemplate {
    fn default() -> Self {
        Self {
            brand: "\"Honey Bunny\"".into(),
            subtitle: "Handmade cookies by Olha Moroz".into(),
            ingredients: "Ingredients: flour, natural honey, butter, sugar, powdered sugar, eggs, \
                          soda, spices (cinnamon, ginger, cloves), food coloring."
                .into(),
            calories: "Calories: 151 kcal".into(),
            storage: "Keep in a cool (+18°C (+/-5), dry place (less 75%).".into(),
            mfg_date: Local::now().date_naive().format("%Y-%m-%d").to_string(),
            shelf_life_days: 180,
            date_format: DateFormat::Us,
            website: "hb-cookies.com".into(),
            email: "info@hb-cookies.com".into(),
            instagram: "@honey_bunny_canada".into(),
            note: "\u{2018}not for resale\u{2019}".into(),
            weight_preset: "45".into(),
            weight: "45g".into(),
            tolerance: "+/-5g".into(),
            origin: "Made in CANADA".into(),
            logo_url: Some(DEFAULT_LOGO_URL.into()),
            logo_size_mm: 22.0,
            badge_url: Some("NutsFREE.png".into()),
            badge_size_mm: 22.0,
            count: 15,
            cols: 3,
            label_width_mm: 50.0,
            label_height_mm: 66.0,
            top_offset_mm: 5.0,
            left_offset_mm: 5.0,
            horizontal_gap_mm: 2.0,
            vertical_gap_mm: 2.0,
        }
    }
}

impl LabelTemplate {
    /// Pull the sheet layout back into printable range: count in
    /// `1..=MAX_LABEL_COUNT`, cols in `1..=MAX_COLS`, label edges at least
    /// `MIN_LABEL_EDGE_MM`.  Returns whether anything changed.
    pub fn sanitize(&mut self) -> bool {
        let before = (self.count, self.cols, self.label_width_mm, self.label_height_mm);
        self.count = self.count.clamp(1, MAX_LABEL_COUNT);
        self.cols = self.cols.clamp(1, MAX_COLS);
        self.label_width_mm = min_edge(self.label_width_mm);
        self.label_height_mm = min_edge(self.label_height_mm);
        before != (self.count, self.cols, self.label_width_mm, self.label_height_mm)
    }

    /// The manufacturing date, if it parses.
    pub fn mfg(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.mfg_date.trim(), "%Y-%m-%d").ok()
    }

    /// Manufacturing date plus the shelf life.
    pub fn best_before(&self) -> Option<NaiveDate> {
        self.mfg()?
            .checked_add_signed(Duration::try_days(self.shelf_life_days)?)
    }

    /// Formatted manufacturing date, empty when it does not parse.
    pub fn mfg_formatted(&self) -> String {
        self.mfg()
            .map(|d| format_date(d, self.date_format))
            .unwrap_or_default()
    }

    /// Formatted best-before date, empty when it cannot be computed.
    pub fn best_before_formatted(&self) -> String {
        self.best_before()
            .map(|d| format_date(d, self.date_format))
            .unwrap_or_default()
    }

    pub fn expiration_line(&self) -> String {
        format!("Expiration date: {} days", self.shelf_life_days)
    }

    pub fn best_before_line(&self) -> String {
        format!("Best Before: {}", self.best_before_formatted())
    }

    pub fn mfg_line(&self) -> String {
        format!("Mfg date: {}", self.mfg_formatted())
    }

    /// Switch to the preset `id`.
    ///
    /// Fixed presets overwrite weight, tolerance and calories; the custom
    /// preset only records its id.  Unknown ids change nothing and return
    /// `false`.
    pub fn apply_weight_preset(&mut self, id: &str) -> bool {
        let Some(preset) = find_preset(id) else {
            return false;
        };
        self.weight_preset = preset.id.to_string();
        if let Some(values) = preset.values {
            self.weight = values.weight.to_string();
            self.tolerance = values.tolerance.to_string();
            self.calories = values.calories.to_string();
        }
        true
    }
}

fn min_edge(mm: f64) -> f64 {
    if mm.is_finite() {
        mm.max(MIN_LABEL_EDGE_MM)
    } else {
        MIN_LABEL_EDGE_MM
    }
}
