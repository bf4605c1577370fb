use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use client_core::{ClientConfig, DEFAULT_API_BASE_URL};
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "study_desk.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout_secs: Option<u64>,
    pub confirm_deletes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            request_timeout_secs: None,
            confirm_deletes: true,
        }
    }
}

impl Settings {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base_url.clone(),
            request_timeout: self
                .request_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    confirm_deletes: Option<bool>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("study_desk").join(CONFIG_FILE_NAME))
}

/// Defaults, then the config file, then the process environment.
pub fn load_settings(explicit_path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with_env(explicit_path, default_config_path(), |key| {
        std::env::var(key).ok()
    })
}

fn load_settings_with_env(
    explicit_path: Option<&Path>,
    fallback_path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let file_cfg = match explicit_path {
        Some(path) => Some(read_file_settings(path)?),
        None => match fallback_path {
            Some(path) if path.exists() => Some(read_file_settings(&path)?),
            _ => None,
        },
    };
    if let Some(file_cfg) = file_cfg {
        if let Some(v) = file_cfg.api_base_url {
            settings.api_base_url = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            settings.request_timeout_secs = Some(v);
        }
        if let Some(v) = file_cfg.confirm_deletes {
            settings.confirm_deletes = v;
        }
    }

    if let Some(v) = env("STUDY_DESK_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    for key in ["STUDY_DESK_TIMEOUT_SECS", "APP__REQUEST_TIMEOUT_SECS"] {
        if let Some(v) = env(key) {
            match v.trim().parse::<u64>() {
                Ok(parsed) => settings.request_timeout_secs = Some(parsed),
                Err(err) => tracing::warn!(key, value = %v, "ignoring timeout override: {err}"),
            }
        }
    }

    Ok(settings)
}

fn read_file_settings(path: &Path) -> anyhow::Result<FileSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
