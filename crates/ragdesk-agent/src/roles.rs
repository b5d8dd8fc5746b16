//! Selectable system roles.

use ragdesk_core::config::{RagDeskConfig, RolePreset};

#[derive(Debug, Clone)]
pub struct RoleCatalog {
    presets: Vec<RolePreset>,
    default_role: String,
}

impl RoleCatalog {
    pub fn new(presets: Vec<RolePreset>, default_role: impl Into<String>) -> Self {
        Self {
            presets,
            default_role: default_role.into(),
        }
    }

    pub fn from_config(config: &RagDeskConfig) -> Self {
        Self::new(config.roles.clone(), &config.identity.default_role)
    }

    pub fn presets(&self) -> &[RolePreset] {
        &self.presets
    }

    pub fn default_role(&self) -> &str {
        &self.default_role
    }

    /// Preset by 1-based position, as shown to the user.
    pub fn get(&self, number: usize) -> Option<&RolePreset> {
        number.checked_sub(1).and_then(|i| self.presets.get(i))
    }

    pub fn find(&self, label: &str) -> Option<&RolePreset> {
        self.presets
            .iter()
            .find(|p| p.label.eq_ignore_ascii_case(label))
    }

    /// Role text for a user selection: a preset number, a preset label, or
    /// free text used verbatim.
    pub fn resolve(&self, selection: &str) -> String {
        let selection = selection.trim();
        if let Some(preset) = selection.parse().ok().and_then(|n| self.get(n)) {
            return preset.text.clone();
        }
        match self.find(selection) {
            Some(preset) => preset.text.clone(),
            None if selection.is_empty() => self.default_role.clone(),
            None => selection.to_string(),
        }
    }

    /// Label of the preset whose text is `role`, if any.
    pub fn label_for(&self, role: &str) -> Option<&str> {
        self.presets
            .iter()
            .find(|p| p.text == role)
            .map(|p| p.label.as_str())
    }
}
