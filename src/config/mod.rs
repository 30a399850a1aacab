use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
}

pub(crate) const APP_DIR: &str = "folio-theme";
const APP_CONFIG_FILE: &str = "config.json";

/// Application-level settings from `config.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Overrides the storage key the preference is kept under.
    #[serde(default)]
    pub storage_key: Option<String>,
    /// Ambient signal used when nothing better is available.
    #[serde(default)]
    pub prefers_dark: Option<bool>,
    #[serde(default)]
    pub log_filter: Option<String>,
}

pub(crate) fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

/// Missing, unreadable and malformed files all yield the defaults.
fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home)
        .ok()
        .filter(|path| path.exists())
        .and_then(|path| read_app_config(&path))
        .unwrap_or_default()
}

fn read_app_config(path: &Path) -> Option<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .inspect_err(|err| tracing::warn!(?err, ?path, "config.json unreadable; using defaults"))
        .ok()?;
    serde_json::from_str(&contents)
        .inspect_err(|err| tracing::warn!(?err, ?path, "config.json malformed; using defaults"))
        .ok()
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    let var = |name: &str| std::env::var_os(name).map(PathBuf::from);
    (var("XDG_CONFIG_HOME"), var("HOME"))
}

/// `$XDG_CONFIG_HOME/<app_dir>/<file_name>`, else `$HOME/.config/<app_dir>/<file_name>`.
pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigError> {
    let root = match xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        Some(xdg) => xdg.to_path_buf(),
        None => home
            .ok_or(ConfigError::MissingHomeDirectory)?
            .join(".config"),
    };
    Ok(root.join(app_dir).join(file_name))
}
