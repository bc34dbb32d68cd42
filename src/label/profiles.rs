//! Named snapshots of the label template ("sheet profiles").

use super::template::LabelTemplate;
use serde::{Deserialize, Serialize};

/// A saved template under a user-chosen name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub config: LabelTemplate,
}

/// `{id, name}` pair for pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub id: String,
    pub name: String,
}

/// The ordered list of profiles and which one is selected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileBook {
    profiles: Vec<Profile>,
    selected: Option<String>,
}

impl ProfileBook {
    /// Wrap loaded profiles, selecting the first one.
    pub fn new(profiles: Vec<Profile>) -> Self {
        let selected = profiles.first().map(|p| p.id.clone());
        Self { profiles, selected }
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn summaries(&self) -> Vec<ProfileSummary> {
        self.profiles
            .iter()
            .map(|p| ProfileSummary {
                id: p.id.clone(),
                name: p.name.clone(),
            })
            .collect()
    }

    /// Unused id derived from a millisecond timestamp.
    fn fresh_id(&self, now_ms: i64) -> String {
        let mut candidate = now_ms;
        while self.get(&candidate.to_string()).is_some() {
            candidate += 1;
        }
        candidate.to_string()
    }

    /// Append a profile and select it.  Blank names are refused.
    pub fn save_as_new(&mut self, name: &str, config: LabelTemplate, now_ms: i64) -> Option<&Profile> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let id = self.fresh_id(now_ms);
        self.profiles.push(Profile {
            id: id.clone(),
            name: name.to_string(),
            config,
        });
        self.selected = Some(id);
        self.profiles.last()
    }

    /// Select `id` and return its template; unknown ids change nothing.
    pub fn apply(&mut self, id: &str) -> Option<&LabelTemplate> {
        let index = self.profiles.iter().position(|p| p.id == id)?;
        self.selected = Some(id.to_string());
        Some(&self.profiles[index].config)
    }

    /// Overwrite the selected profile's template.
    pub fn update_selected(&mut self, config: LabelTemplate) -> bool {
        let Some(id) = self.selected.as_deref() else {
            return false;
        };
        match self.profiles.iter_mut().find(|p| p.id == id) {
            Some(profile) => {
                profile.config = config;
                true
            }
            None => false,
        }
    }

    /// Remove the selected profile; the first remaining one becomes
    /// selected.
    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.selected.take() else {
            return false;
        };
        let before = self.profiles.len();
        self.profiles.retain(|p| p.id != id);
        self.selected = self.profiles.first().map(|p| p.id.clone());
        self.profiles.len() != before
    }
}
