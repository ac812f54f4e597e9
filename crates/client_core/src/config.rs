use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

pub const SETTINGS_FILE: &str = "desktop.toml";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Overrides the host's picture directory as the picker default.
    pub picture_dir: Option<PathBuf>,
    pub success_dismiss_ms: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            picture_dir: None,
            success_dismiss_ms: 5000,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn success_dismiss(&self) -> Duration {
        Duration::from_millis(self.success_dismiss_ms)
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// File values first, then `APP__*` overrides from `env`.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            apply(&mut settings, |key| file_cfg.get(key).cloned());
        }
    }

    apply(&mut settings, |key| env(&format!("APP__{}", key.to_ascii_uppercase())));
    settings
}

fn apply(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("picture_dir") {
        settings.picture_dir = Some(PathBuf::from(v));
    }
    if let Some(v) = lookup("success_dismiss_ms") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.success_dismiss_ms = parsed;
        }
    }
    if let Some(v) = lookup("log_filter") {
        settings.log_filter = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
