//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/slotgrid/config.json`.
//! Every section is optional so the file can grow new keys later without
//! breaking older files.
//!
//! # Example
//!
//! ```json
//! {
//!   "transform": {
//!     "scale_step": 1.02,
//!     "amplified_move_step": 25
//!   },
//!   "storage": { "path": "/home/me/.local/share/slotgrid/storage.json" },
//!   "default_slot_count": 6,
//!   "layouts": [
//!     { "id": "rect2", "style": "rectangle-style2", "slot_count": 6, "label": "Small round x9" }
//!   ]
//! }
//! ```

use crate::layout::LayoutCatalog;
use crate::slots::{DEFAULT_SLOTS_KEY, DEFAULT_SLOT_COUNT};
use crate::transform::TransformConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
///
/// Every field is optional; a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Scale / pan step sizes and scale bounds.
    #[serde(default)]
    pub transform: TransformConfig,

    /// Where durable state lives.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Slot count used when nothing valid is persisted.
    #[serde(default = "default_slot_count")]
    pub default_slot_count: usize,

    /// Layouts offered to the user, in display order.
    #[serde(default)]
    pub layouts: LayoutCatalog,
}

fn default_slot_count() -> usize {
    DEFAULT_SLOT_COUNT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transform: TransformConfig::default(),
            storage: StorageConfig::default(),
            default_slot_count: DEFAULT_SLOT_COUNT,
            layouts: LayoutCatalog::default(),
        }
    }
}

/// Durable storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON key-value file.  `None` means
    /// `$XDG_DATA_HOME/slotgrid/storage.json`.
    pub path: Option<PathBuf>,
    /// Key of the persisted slot collection.
    pub slots_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            slots_key: DEFAULT_SLOTS_KEY.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the board cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_slot_count == 0 {
            return Err(ConfigError("default_slot_count must be at least 1".into()));
        }
        let t = &self.transform;
        if !(t.min_scale > 0.0 && t.min_scale <= t.max_scale) {
            return Err(ConfigError(format!(
                "invalid scale bounds [{}, {}]",
                t.min_scale, t.max_scale
            )));
        }
        if !(t.scale_step > 1.0 && t.scale_step < 2.0)
            || !(t.amplified_scale_step > 1.0 && t.amplified_scale_step < 2.0)
        {
            return Err(ConfigError("scale steps must lie in (1, 2)".into()));
        }
        self.layouts
            .validate()
            .map_err(|e| ConfigError(e.to_string()))
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
