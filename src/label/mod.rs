//! Product label sheets.
//!
//! One [`LabelTemplate`] is edited at a time and printed `count` times on a
//! sheet laid out by [`SheetGeometry`].  The template is persisted on every
//! change; named snapshots live in a [`ProfileBook`] persisted under its own
//! key, so resetting the template never loses profiles.

pub mod profiles;
pub mod sheet;
pub mod template;

pub use profiles::{Profile, ProfileBook, ProfileSummary};
pub use sheet::{LabelPlacement, SheetGeometry};
pub use template::{DateFormat, LabelTemplate};

use crate::traits::KeyValueStore;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Storage key of the current template.
pub const TEMPLATE_KEY: &str = "hb-label-template-v1";
/// Storage key of the profile list.
pub const PROFILES_KEY: &str = "hb-label-profiles-v1";

/// Errors from label commands.
#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("invalid template patch: {0}")]
    InvalidPatch(#[from] serde_json::Error),
}

/// Label editing commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LabelCommand {
    /// Replace the whole template.
    SetTemplate(LabelTemplate),
    /// Overwrite individual template fields, e.g. `{"brand":"Acme"}`.
    Patch(serde_json::Map<String, serde_json::Value>),
    /// Switch the weight preset by id.
    ApplyWeightPreset(String),
    /// Store the current template as a new, selected profile.
    SaveProfile { name: String },
    /// Load the profile with this id into the template.
    ApplyProfile(String),
    /// Overwrite the selected profile with the current template.
    UpdateProfile,
    /// Delete the selected profile.
    DeleteProfile,
    /// Forget the stored template and return to defaults.  Profiles stay.
    Reset,
}

/// Renderer-facing snapshot of the label sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelSheetView {
    pub template: LabelTemplate,
    pub expiration_line: String,
    pub best_before_line: String,
    pub mfg_line: String,
    pub placements: Vec<LabelPlacement>,
    pub sheet_extent_mm: (f64, f64),
    pub profiles: Vec<ProfileSummary>,
    pub selected_profile: Option<String>,
}

/// Owns the label template and profiles and keeps them persisted.
#[derive(Debug)]
pub struct LabelDesigner<S: KeyValueStore> {
    store: S,
    template: LabelTemplate,
    profiles: ProfileBook,
}

fn read_json<S, T>(store: &S, key: &str) -> Option<T>
where
    S: KeyValueStore,
    T: serde::de::DeserializeOwned,
{
    match store.get(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("ignoring unparseable {:?}: {}", key, e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!("failed to read {:?}: {}", key, e);
            None
        }
    }
}

impl<S: KeyValueStore> LabelDesigner<S> {
    /// Restore the template and profiles; anything missing or corrupt
    /// falls back to defaults, an out-of-range sheet layout is pulled back
    /// into range.
    pub fn load(store: S) -> Self {
        let mut template: LabelTemplate = read_json(&store, TEMPLATE_KEY).unwrap_or_default();
        if template.sanitize() {
            warn!("stored label layout out of range, clamped");
        }
        let profiles = ProfileBook::new(read_json(&store, PROFILES_KEY).unwrap_or_default());
        Self {
            store,
            template,
            profiles,
        }
    }

    pub fn template(&self) -> &LabelTemplate {
        &self.template
    }

    pub fn profiles(&self) -> &ProfileBook {
        &self.profiles
    }

    /// Process one command.  Returns whether anything changed.
    pub fn handle(&mut self, cmd: LabelCommand) -> Result<bool, LabelError> {
        let changed = match cmd {
            LabelCommand::SetTemplate(mut template) => {
                template.sanitize();
                self.template = template;
                self.save_template();
                true
            }
            LabelCommand::Patch(fields) => {
                let mut value = serde_json::to_value(&self.template)?;
                if let Some(object) = value.as_object_mut() {
                    object.extend(fields);
                }
                let mut patched: LabelTemplate = serde_json::from_value(value)?;
                patched.sanitize();
                self.template = patched;
                self.save_template();
                true
            }
            LabelCommand::ApplyWeightPreset(id) => {
                let applied = self.template.apply_weight_preset(&id);
                if applied {
                    self.save_template();
                }
                applied
            }
            LabelCommand::SaveProfile { name } => {
                let now_ms = chrono::Utc::now().timestamp_millis();
                let saved = self
                    .profiles
                    .save_as_new(&name, self.template.clone(), now_ms)
                    .map(|p| info!("saved label profile {:?} as {}", p.name, p.id))
                    .is_some();
                if saved {
                    self.save_profiles();
                }
                saved
            }
            LabelCommand::ApplyProfile(id) => match self.profiles.apply(&id) {
                Some(config) => {
                    self.template = config.clone();
                    self.template.sanitize();
                    self.save_template();
                    true
                }
                None => false,
            },
            LabelCommand::UpdateProfile => {
                let updated = self.profiles.update_selected(self.template.clone());
                if updated {
                    self.save_profiles();
                }
                updated
            }
            LabelCommand::DeleteProfile => {
                let deleted = self.profiles.delete_selected();
                if deleted {
                    self.save_profiles();
                }
                deleted
            }
            LabelCommand::Reset => {
                if let Err(e) = self.store.remove(TEMPLATE_KEY) {
                    warn!("failed to remove {:?}: {}", TEMPLATE_KEY, e);
                }
                self.template = LabelTemplate::default();
                true
            }
        };
        Ok(changed)
    }

    pub fn view(&self) -> LabelSheetView {
        let geometry = SheetGeometry::from_template(&self.template);
        LabelSheetView {
            template: self.template.clone(),
            expiration_line: self.template.expiration_line(),
            best_before_line: self.template.best_before_line(),
            mfg_line: self.template.mfg_line(),
            placements: geometry.placements(),
            sheet_extent_mm: geometry.extent_mm(),
            profiles: self.profiles.summaries(),
            selected_profile: self.profiles.selected().map(str::to_string),
        }
    }

    fn save_template(&self) {
        self.write_json(TEMPLATE_KEY, &self.template);
    }

    fn save_profiles(&self) {
        self.write_json(PROFILES_KEY, self.profiles.profiles());
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => {
                if let Err(e) = self.store.set(key, &json) {
                    warn!("failed to persist {:?}: {}", key, e);
                }
            }
            Err(e) => warn!("failed to encode {:?}: {}", key, e),
        }
    }
}
