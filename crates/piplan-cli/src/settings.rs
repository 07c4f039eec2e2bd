//! Application settings file
//!
//! ```toml
//! [tracker]
//! base_url = "https://tracker.example/rest/api/2"
//! browse_url = "https://tracker.example/browse"
//!
//! [tracker.fields]
//! story_points = "customfield_10106"
//! sprints = ["customfield_10105"]
//!
//! [engine]
//! hard_cap = 2000
//! call_timeout_ms = 120000
//! ```

use anyhow::Context;
use piplan_client::TrackerConfig;
use piplan_engine::EngineConfig;
use serde::Deserialize;
use std::path::Path;

/// Tracker and engine settings loaded from one TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) tracker: TrackerConfig,
    pub(crate) engine: EngineConfig,
}

impl Settings {
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub(crate) fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let mut settings: Self = toml::from_str(text)?;
        settings.tracker.validate()?;
        if settings.engine.browse_url.is_none() {
            settings.engine.browse_url.clone_from(&settings.tracker.browse_url);
        }
        Ok(settings)
    }

    /// Use `token` unless the file already carries one
    pub(crate) fn with_fallback_token(mut self, token: Option<String>) -> Self {
        if self.tracker.token.is_none() {
            self.tracker.token = token.filter(|t| !t.trim().is_empty());
        }
        self
    }
}
