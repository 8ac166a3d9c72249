//! Dashboard configuration.
//!
//! Every setting comes from a `FLOWDECK_*` environment variable, optionally
//! seeded by a YAML file (`~/.flowdeck/config.yaml` or `--config`). All
//! settings are required, but a missing one is never fatal: it is logged at
//! warn level and replaced with an empty string (text settings) or NaN
//! (numeric settings). Accessors such as [`DashboardConfig::refresh_interval`]
//! turn those fallbacks into "feature disabled" rather than errors.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client_state::ThemeMode;
use crate::error::{FlowdeckError, Result};

/// Environment variable for the dashboard feed URL.
pub const ENV_DASHBOARD_WEBHOOK_URL: &str = "FLOWDECK_DASHBOARD_WEBHOOK_URL";
/// Environment variable for the token usage feed URL.
pub const ENV_TOKEN_USAGE_WEBHOOK_URL: &str = "FLOWDECK_TOKEN_USAGE_WEBHOOK_URL";
/// Environment variable for the refresh interval in milliseconds.
pub const ENV_REFRESH_INTERVAL_MS: &str = "FLOWDECK_REFRESH_INTERVAL_MS";
/// Environment variable for the USD to BRL exchange rate.
pub const ENV_USD_TO_BRL: &str = "FLOWDECK_USD_TO_BRL";
/// Environment variable for the error recency threshold in minutes.
pub const ENV_ERROR_NOTIFICATION_THRESHOLD_MINUTES: &str =
    "FLOWDECK_ERROR_NOTIFICATION_THRESHOLD_MINUTES";
/// Environment variable for the notification sound volume (0.0 - 1.0).
pub const ENV_NOTIFICATION_SOUND_VOLUME: &str = "FLOWDECK_NOTIFICATION_SOUND_VOLUME";
/// Environment variable for the install prompt delay in seconds.
pub const ENV_PWA_PROMPT_DELAY_SECONDS: &str = "FLOWDECK_PWA_PROMPT_DELAY_SECONDS";
/// Environment variable for the default theme (`dark` or `light`).
pub const ENV_DEFAULT_THEME: &str = "FLOWDECK_DEFAULT_THEME";

/// Optional YAML configuration file contents.
///
/// Keys mirror the environment variables in snake_case. Anything left out is
/// looked up in the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub dashboard_webhook_url: Option<String>,
    pub token_usage_webhook_url: Option<String>,
    pub refresh_interval_ms: Option<f64>,
    pub usd_to_brl: Option<f64>,
    pub error_notification_threshold_minutes: Option<f64>,
    pub notification_sound_volume: Option<f64>,
    pub pwa_prompt_delay_seconds: Option<f64>,
    pub default_theme: Option<String>,
}

impl FileConfig {
    /// Parse a YAML configuration document.
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| FlowdeckError::config_invalid(path, e.to_string()))
    }

    /// Read a YAML configuration file.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FlowdeckError::io("reading config", path, e))?;
        Self::from_yaml(&content, path)
    }
}

/// Resolved dashboard configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// URL of the dashboard webhook (executions, workflows, instances, profile)
    pub dashboard_webhook_url: String,
    /// URL of the token usage webhook
    pub token_usage_webhook_url: String,
    /// Automatic refresh interval in milliseconds
    pub refresh_interval_ms: f64,
    /// USD to BRL conversion rate
    pub usd_to_brl: f64,
    /// Maximum age (minutes) for an error to count as recent
    pub error_notification_threshold_minutes: f64,
    /// Notification sound volume (0.0 - 1.0)
    pub notification_sound_volume: f64,
    /// Seconds before the install hint is shown
    pub pwa_prompt_delay_seconds: f64,
    /// Theme used when no preference has been saved (`dark` | `light`)
    pub default_theme: String,
}

impl DashboardConfig {
    /// Load configuration from an optional YAML file plus the process environment.
    ///
    /// An explicitly requested file must exist; the default file
    /// (`~/.flowdeck/config.yaml`) is optional.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let file = match explicit_path {
            Some(path) => FileConfig::read(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => FileConfig::read(&path)?,
                _ => FileConfig::default(),
            },
        };

        Ok(Self::from_sources(file, |key| std::env::var(key).ok()))
    }

    /// Resolve configuration from a file layer and an environment lookup.
    ///
    /// Environment values win over file values.
    pub fn from_sources(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            dashboard_webhook_url: resolve_text(
                ENV_DASHBOARD_WEBHOOK_URL,
                file.dashboard_webhook_url,
                &env,
            ),
            token_usage_webhook_url: resolve_text(
                ENV_TOKEN_USAGE_WEBHOOK_URL,
                file.token_usage_webhook_url,
                &env,
            ),
            refresh_interval_ms: resolve_number(
                ENV_REFRESH_INTERVAL_MS,
                file.refresh_interval_ms,
                &env,
            ),
            usd_to_brl: resolve_number(ENV_USD_TO_BRL, file.usd_to_brl, &env),
            error_notification_threshold_minutes: resolve_number(
                ENV_ERROR_NOTIFICATION_THRESHOLD_MINUTES,
                file.error_notification_threshold_minutes,
                &env,
            ),
            notification_sound_volume: resolve_number(
                ENV_NOTIFICATION_SOUND_VOLUME,
                file.notification_sound_volume,
                &env,
            ),
            pwa_prompt_delay_seconds: resolve_number(
                ENV_PWA_PROMPT_DELAY_SECONDS,
                file.pwa_prompt_delay_seconds,
                &env,
            ),
            default_theme: resolve_text(ENV_DEFAULT_THEME, file.default_theme, &env),
        }
    }

    /// Automatic refresh interval, or `None` when polling is disabled.
    pub fn refresh_interval(&self) -> Option<Duration> {
        positive_millis(self.refresh_interval_ms)
    }

    /// Recency window for error notifications, or `None` when unusable.
    ///
    /// With no usable window no error ever counts as recent.
    pub fn error_threshold(&self) -> Option<chrono::TimeDelta> {
        let minutes = self.error_notification_threshold_minutes;
        if !minutes.is_finite() {
            return None;
        }
        chrono::TimeDelta::try_milliseconds((minutes * 60_000.0) as i64)
    }

    /// Notification volume clamped to `0.0..=1.0`, or `None` when silent.
    pub fn sound_volume(&self) -> Option<f64> {
        let volume = self.notification_sound_volume;
        if volume.is_finite() && volume > 0.0 {
            Some(volume.min(1.0))
        } else {
            None
        }
    }

    /// Delay before the install hint; unusable values mean "immediately".
    pub fn install_prompt_delay(&self) -> Duration {
        let secs = self.pwa_prompt_delay_seconds;
        if secs.is_finite() && secs > 0.0 {
            Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }

    /// Default theme when nothing has been persisted.
    pub fn default_theme_mode(&self) -> ThemeMode {
        ThemeMode::parse(&self.default_theme).unwrap_or_default()
    }
}

/// Default configuration file path: `~/.flowdeck/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".flowdeck").join("config.yaml"))
}

fn positive_millis(ms: f64) -> Option<Duration> {
    if ms.is_finite() && ms > 0.0 {
        Some(Duration::from_millis(ms as u64))
    } else {
        None
    }
}

/// Blank environment values count as unset.
fn env_value(key: &str, env: &impl Fn(&str) -> Option<String>) -> Option<String> {
    env(key).filter(|value| !value.trim().is_empty())
}

fn resolve_text(key: &str, file_value: Option<String>, env: &impl Fn(&str) -> Option<String>) -> String {
    if let Some(value) = env_value(key, env) {
        return value;
    }
    if let Some(value) = file_value {
        debug!(key, "using value from config file");
        return value;
    }
    warn!(key, "environment variable not set, using empty string");
    String::new()
}

fn resolve_number(key: &str, file_value: Option<f64>, env: &impl Fn(&str) -> Option<String>) -> f64 {
    if let Some(raw) = env_value(key, env) {
        return match raw.trim().parse::<f64>() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, "environment variable is not a number, using NaN");
                f64::NAN
            }
        };
    }
    if let Some(value) = file_value {
        debug!(key, "using value from config file");
        return value;
    }
    warn!(key, "environment variable not set, using NaN");
    f64::NAN
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn full_env() -> impl Fn(&str) -> Option<String> {
        env_from(&[
            (ENV_DASHBOARD_WEBHOOK_URL, "https://n8n.example.com/webhook/dash"),
            (ENV_TOKEN_USAGE_WEBHOOK_URL, "https://n8n.example.com/webhook/tokens"),
            (ENV_REFRESH_INTERVAL_MS, "30000"),
            (ENV_USD_TO_BRL, "5.5"),
            (ENV_ERROR_NOTIFICATION_THRESHOLD_MINUTES, "5"),
            (ENV_NOTIFICATION_SOUND_VOLUME, "0.3"),
            (ENV_PWA_PROMPT_DELAY_SECONDS, "10"),
            (ENV_DEFAULT_THEME, "light"),
        ])
    }

    #[test]
    fn test_resolves_all_values_from_env() {
        let config = DashboardConfig::from_sources(FileConfig::default(), full_env());

        assert_eq!(config.dashboard_webhook_url, "https://n8n.example.com/webhook/dash");
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(30)));
        assert_eq!(config.usd_to_brl, 5.5);
        assert_eq!(config.error_threshold(), chrono::TimeDelta::try_minutes(5));
        assert_eq!(config.sound_volume(), Some(0.3));
        assert_eq!(config.install_prompt_delay(), Duration::from_secs(10));
        assert_eq!(config.default_theme_mode(), ThemeMode::Light);
    }

    #[test]
    fn test_missing_values_fall_back() {
        let config = DashboardConfig::from_sources(FileConfig::default(), env_from(&[]));

        assert_eq!(config.dashboard_webhook_url, "");
        assert_eq!(config.token_usage_webhook_url, "");
        assert!(config.refresh_interval_ms.is_nan());
        assert!(config.usd_to_brl.is_nan());
        assert_eq!(config.refresh_interval(), None);
        assert_eq!(config.error_threshold(), None);
        assert_eq!(config.sound_volume(), None);
        assert_eq!(config.install_prompt_delay(), Duration::ZERO);
        assert_eq!(config.default_theme_mode(), ThemeMode::Dark);
    }

    #[test]
    fn test_unparseable_number_is_nan() {
        let config = DashboardConfig::from_sources(
            FileConfig::default(),
            env_from(&[(ENV_REFRESH_INTERVAL_MS, "soon")]),
        );
        assert!(config.refresh_interval_ms.is_nan());
        assert_eq!(config.refresh_interval(), None);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = FileConfig {
            dashboard_webhook_url: Some("https://file.example.com".into()),
            refresh_interval_ms: Some(60_000.0),
            ..Default::default()
        };
        let config = DashboardConfig::from_sources(
            file,
            env_from(&[(ENV_DASHBOARD_WEBHOOK_URL, "https://env.example.com")]),
        );

        assert_eq!(config.dashboard_webhook_url, "https://env.example.com");
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(60)));

        let blank = FileConfig {
            dashboard_webhook_url: Some("https://file.example.com".into()),
            refresh_interval_ms: Some(60_000.0),
            ..Default::default()
        };
        let config = DashboardConfig::from_sources(
            blank,
            env_from(&[(ENV_DASHBOARD_WEBHOOK_URL, ""), (ENV_REFRESH_INTERVAL_MS, "  ")]),
        );

        assert_eq!(config.dashboard_webhook_url, "https://file.example.com");
        assert_eq!(config.refresh_interval(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_blank_env_without_file_is_unset() {
        let config = DashboardConfig::from_sources(
            FileConfig::default(),
            env_from(&[(ENV_USD_TO_BRL, ""), (ENV_DEFAULT_THEME, " ")]),
        );
        assert!(config.usd_to_brl.is_nan());
        assert_eq!(config.default_theme, "");
    }

    #[test]
    fn test_huge_durations_do_not_panic() {
        let config = DashboardConfig::from_sources(
            FileConfig::default(),
            env_from(&[
                (ENV_PWA_PROMPT_DELAY_SECONDS, "1e30"),
                (ENV_ERROR_NOTIFICATION_THRESHOLD_MINUTES, "1e12"),
            ]),
        );
        assert_eq!(config.install_prompt_delay(), Duration::MAX);
        assert_eq!(config.error_threshold(), chrono::TimeDelta::try_minutes(1_000_000_000_000));
    }

    #[test]
    fn test_volume_is_clamped() {
        let config = DashboardConfig::from_sources(
            FileConfig::default(),
            env_from(&[(ENV_NOTIFICATION_SOUND_VOLUME, "3")]),
        );
        assert_eq!(config.sound_volume(), Some(1.0));

        let muted = DashboardConfig::from_sources(
            FileConfig::default(),
            env_from(&[(ENV_NOTIFICATION_SOUND_VOLUME, "0")]),
        );
        assert_eq!(muted.sound_volume(), None);
    }

    #[test]
    fn test_file_config_from_yaml() {
        let yaml = "dashboard_webhook_url: https://n8n.example.com/dash\nusd_to_brl: 5.1\ndefault_theme: dark\n";
        let file = FileConfig::from_yaml(yaml, Path::new("config.yaml")).unwrap();
        assert_eq!(file.dashboard_webhook_url.as_deref(), Some("https://n8n.example.com/dash"));
        assert_eq!(file.usd_to_brl, Some(5.1));
        assert_eq!(file.refresh_interval_ms, None);
    }

    #[test]
    fn test_file_config_invalid_yaml() {
        let err = FileConfig::from_yaml("usd_to_brl: [", Path::new("bad.yaml")).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(DashboardConfig::load(Some(&missing)).is_err());
    }
}
