//! Persisted client preferences.
//!
//! A tiny JSON object under fixed keys, the terminal counterpart of browser
//! local storage. Only the theme preference and the install-hint dismissal
//! are stored; there is no schema versioning.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{FlowdeckError, Result};

/// Storage key for the theme preference.
pub const THEME_KEY: &str = "dashboard-theme";
/// Storage key for the install hint dismissal flag.
pub const INSTALL_DISMISSED_KEY: &str = "pwa-install-dismissed";
/// File name of the client state inside `~/.flowdeck/`.
pub const CLIENT_STATE_FILE: &str = "client_state.json";

/// Dashboard color mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    /// Parse `dark` / `light` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(ThemeMode::Dark),
            "light" => Some(ThemeMode::Light),
            _ => None,
        }
    }

    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values kept between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientState {
    #[serde(rename = "dashboard-theme", default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeMode>,

    #[serde(rename = "pwa-install-dismissed", default)]
    pub install_prompt_dismissed: bool,
}

/// Reads and writes [`ClientState`] at a fixed path.
#[derive(Debug, Clone)]
pub struct ClientStateStore {
    path: PathBuf,
}

impl ClientStateStore {
    /// Store backed by an explicit file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `~/.flowdeck/client_state.json`.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(crate::logging::flowdeck_home()?.join(CLIENT_STATE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load saved state. Missing or unreadable files yield the default state.
    pub fn load(&self) -> ClientState {
        match self.try_load() {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable client state");
                ClientState::default()
            }
        }
    }

    /// Load saved state, reporting parse failures.
    pub fn try_load(&self) -> Result<ClientState> {
        if !self.path.exists() {
            return Ok(ClientState::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| FlowdeckError::io("reading client state", &self.path, e))?;
        serde_json::from_str(&content).map_err(|e| FlowdeckError::ClientState {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Persist state, creating the parent directory when needed.
    pub fn save(&self, state: &ClientState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FlowdeckError::DirectoryCreation {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let content = serde_json::to_string_pretty(state)
            .map_err(|e| FlowdeckError::json_parse("client state", e))?;
        std::fs::write(&self.path, content)
            .map_err(|e| FlowdeckError::io("writing client state", &self.path, e))?;
        debug!(path = %self.path.display(), "saved client state");
        Ok(())
    }

    /// Load, apply `update`, and save.
    pub fn update(&self, update: impl FnOnce(&mut ClientState)) -> Result<ClientState> {
        let mut state = self.load();
        update(&mut state);
        self.save(&state)?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_mode_parse_and_toggle() {
        assert_eq!(ThemeMode::parse("Light"), Some(ThemeMode::Light));
        assert_eq!(ThemeMode::parse(" dark "), Some(ThemeMode::Dark));
        assert_eq!(ThemeMode::parse(""), None);
        assert_eq!(ThemeMode::Dark.toggled(), ThemeMode::Light);
        assert_eq!(ThemeMode::Light.toggled().toggled(), ThemeMode::Light);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = ClientStateStore::new(dir.path().join("state.json"));
        assert_eq!(store.load(), ClientState::default());
    }

    #[test]
    fn test_save_uses_fixed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = ClientStateStore::new(dir.path().join("nested").join("state.json"));
        let state = ClientState {
            theme: Some(ThemeMode::Light),
            install_prompt_dismissed: true,
        };
        store.save(&state).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[THEME_KEY], "light");
        assert_eq!(value[INSTALL_DISMISSED_KEY], true);

        assert_eq!(store.load(), state);
    }

    #[test]
    fn test_update_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = ClientStateStore::new(dir.path().join("state.json"));
        store.update(|s| s.theme = Some(ThemeMode::Light)).unwrap();
        let state = store.update(|s| s.install_prompt_dismissed = true).unwrap();

        assert_eq!(state.theme, Some(ThemeMode::Light));
        assert!(state.install_prompt_dismissed);
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = ClientStateStore::new(&path);

        assert!(store.try_load().is_err());
        assert_eq!(store.load(), ClientState::default());
    }
}
