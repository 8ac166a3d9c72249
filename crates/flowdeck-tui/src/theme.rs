//! Theme system for the flowdeck TUI.
//!
//! Two palettes, dark and light. The active mode is persisted in the client
//! state file under `dashboard-theme`; with nothing saved, the configured
//! default theme applies.

use flowdeck_core::{ClientStateStore, ThemeMode};
use ratatui::style::Color;
use tracing::{info, warn};

/// Color palette for a theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeColors {
    /// Primary headers and focused borders
    pub header: Color,
    /// Hotkey hints
    pub hotkey: Color,
    /// Normal text
    pub text: Color,
    /// Secondary text (timestamps, ids)
    pub text_dim: Color,
    /// Unfocused borders
    pub border_dim: Color,
    /// Overlay background
    pub overlay_bg: Color,
    /// Status: success / connected
    pub status_healthy: Color,
    /// Status: running / warning
    pub status_warning: Color,
    /// Status: error / disconnected
    pub status_error: Color,
    /// Money figures
    pub money: Color,
}

/// Complete theme definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub mode: ThemeMode,
    pub colors: ThemeColors,
}

impl Theme {
    /// Dark palette.
    pub fn dark_theme() -> Self {
        Self {
            mode: ThemeMode::Dark,
            colors: ThemeColors {
                header: Color::Cyan,
                hotkey: Color::Yellow,
                text: Color::White,
                text_dim: Color::Gray,
                border_dim: Color::DarkGray,
                overlay_bg: Color::Black,
                status_healthy: Color::Green,
                status_warning: Color::Yellow,
                status_error: Color::Red,
                money: Color::LightGreen,
            },
        }
    }

    /// Light palette.
    pub fn light_theme() -> Self {
        Self {
            mode: ThemeMode::Light,
            colors: ThemeColors {
                header: Color::Blue,
                hotkey: Color::Magenta,
                text: Color::Black,
                text_dim: Color::DarkGray,
                border_dim: Color::Gray,
                overlay_bg: Color::White,
                status_healthy: Color::Green,
                status_warning: Color::Rgb(180, 120, 0),
                status_error: Color::Red,
                money: Color::Rgb(0, 120, 60),
            },
        }
    }

    /// Get a theme by mode.
    pub fn by_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self::dark_theme(),
            ThemeMode::Light => Self::light_theme(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark_theme()
    }
}

/// Theme manager handles loading, saving, and switching themes.
pub struct ThemeManager {
    current: Theme,
    store: Option<ClientStateStore>,
}

impl ThemeManager {
    /// Manager without persistence.
    pub fn new(mode: ThemeMode) -> Self {
        Self {
            current: Theme::by_mode(mode),
            store: None,
        }
    }

    /// Load the saved mode from `store`, falling back to `default_mode`.
    pub fn load(store: ClientStateStore, default_mode: ThemeMode) -> Self {
        let mode = store.load().theme.unwrap_or(default_mode);
        info!(theme = %mode, "loaded theme");
        Self {
            current: Theme::by_mode(mode),
            store: Some(store),
        }
    }

    pub fn current(&self) -> &Theme {
        &self.current
    }

    pub fn mode(&self) -> ThemeMode {
        self.current.mode
    }

    /// Switch between dark and light and persist the choice.
    pub fn toggle(&mut self) -> ThemeMode {
        let mode = self.current.mode.toggled();
        self.current = Theme::by_mode(mode);

        if let Some(store) = &self.store {
            if let Err(e) = store.update(|state| state.theme = Some(mode)) {
                warn!(error = %e, "failed to persist theme");
            }
        }

        mode
    }
}

impl Default for ThemeManager {
    fn default() -> Self {
        Self::new(ThemeMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdeck_core::client_state::THEME_KEY;

    #[test]
    fn test_palettes_differ() {
        assert_ne!(Theme::dark_theme().colors, Theme::light_theme().colors);
        assert_eq!(Theme::default().mode, ThemeMode::Dark);
    }

    #[test]
    fn test_default_mode_when_nothing_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = ClientStateStore::new(dir.path().join("state.json"));
        let manager = ThemeManager::load(store, ThemeMode::Light);
        assert_eq!(manager.mode(), ThemeMode::Light);
    }

    #[test]
    fn test_toggle_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut manager = ThemeManager::load(ClientStateStore::new(&path), ThemeMode::Dark);
        assert_eq!(manager.toggle(), ThemeMode::Light);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[THEME_KEY], "light");

        // saved value wins over the configured default
        let reloaded = ThemeManager::load(ClientStateStore::new(&path), ThemeMode::Dark);
        assert_eq!(reloaded.mode(), ThemeMode::Light);
    }

    #[test]
    fn test_toggle_without_store() {
        let mut manager = ThemeManager::default();
        manager.toggle();
        manager.toggle();
        assert_eq!(manager.mode(), ThemeMode::Dark);
    }
}
