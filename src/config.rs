//! Application configuration management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::Result;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Service connection
    #[serde(default)]
    pub server: ServerConfig,

    /// Polling and rate-limiting windows
    #[serde(default)]
    pub timing: TimingConfig,

    /// UI configuration
    #[serde(default)]
    pub ui: UiConfig,
}

/// Jukebox service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Service URL (e.g., "http://jukebox.local:8080")
    #[serde(default = "default_url")]
    pub url: String,

    /// Music directory shown in the tree title when boot data doesn't carry one
    #[serde(default)]
    pub music_dir: String,
}

/// Timing configuration, all values in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Interval between status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Delay before the first status poll
    #[serde(default = "default_poll_initial_delay")]
    pub poll_initial_delay_ms: u64,

    /// Minimum spacing between accepted play commands
    #[serde(default = "default_play_guard")]
    pub play_guard_ms: u64,

    /// Quiet period before a volume change is sent
    #[serde(default = "default_volume_quiet")]
    pub volume_quiet_ms: u64,

    /// Quiet period before the filter is re-applied
    #[serde(default = "default_filter_quiet")]
    pub filter_quiet_ms: u64,

    /// HTTP request timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

/// UI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Title of the tree panel
    #[serde(default = "default_root_label")]
    pub root_label: String,

    /// Volume change per key press
    #[serde(default = "default_volume_step")]
    pub volume_step: u8,
}

fn default_url() -> String {
    String::from("http://localhost:8080")
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_poll_initial_delay() -> u64 {
    1500
}

fn default_play_guard() -> u64 {
    3000
}

fn default_volume_quiet() -> u64 {
    120
}

fn default_filter_quiet() -> u64 {
    150
}

fn default_request_timeout() -> u64 {
    5000
}

fn default_root_label() -> String {
    String::from("Library")
}

fn default_volume_step() -> u8 {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            music_dir: String::new(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            poll_initial_delay_ms: default_poll_initial_delay(),
            play_guard_ms: default_play_guard(),
            volume_quiet_ms: default_volume_quiet(),
            filter_quiet_ms: default_filter_quiet(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            root_label: default_root_label(),
            volume_step: default_volume_step(),
        }
    }
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_initial_delay(&self) -> Duration {
        Duration::from_millis(self.poll_initial_delay_ms)
    }

    pub fn play_guard(&self) -> Duration {
        Duration::from_millis(self.play_guard_ms)
    }

    pub fn volume_quiet(&self) -> Duration {
        Duration::from_millis(self.volume_quiet_ms)
    }

    pub fn filter_quiet(&self) -> Duration {
        Duration::from_millis(self.filter_quiet_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Config {
    /// Get the default configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine config directory"))?;

        Ok(config_dir.join("jukebox-tui").join("config.toml"))
    }

    /// Load configuration from the given file, or the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;

        // Clamp step to a usable range
        config.ui.volume_step = config.ui.volume_step.clamp(1, 100);

        Ok(config)
    }

    /// Check if the configuration is valid for connecting.
    pub fn is_valid(&self) -> bool {
        let url = self.server.url.trim();
        !url.is_empty() && (url.starts_with("http://") || url.starts_with("https://"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.timing.poll_interval(), Duration::from_millis(2000));
        assert_eq!(config.timing.poll_initial_delay(), Duration::from_millis(1500));
        assert_eq!(config.timing.play_guard(), Duration::from_millis(3000));
        assert_eq!(config.timing.volume_quiet(), Duration::from_millis(120));
        assert_eq!(config.ui.root_label, "Library");
        assert!(config.is_valid());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = Config::parse(
            r#"
            [server]
            url = "https://jukebox.example.com"

            [timing]
            poll_interval_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.server.url, "https://jukebox.example.com");
        assert_eq!(config.timing.poll_interval_ms, 500);
        assert_eq!(config.timing.play_guard_ms, 3000);
        assert_eq!(config.ui.volume_step, 5);
    }

    #[test]
    fn test_volume_step_clamped() {
        let config = Config::parse("[ui]\nvolume_step = 0\n").unwrap();
        assert_eq!(config.ui.volume_step, 1);
    }

    #[test]
    fn test_is_valid_requires_http_url() {
        let mut config = Config::default();
        config.server.url = String::from("jukebox.local");
        assert!(!config.is_valid());
        config.server.url = String::new();
        assert!(!config.is_valid());
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::load(Some(Path::new("/nonexistent/jukebox-tui.toml"))).unwrap();
        assert_eq!(config.timing.filter_quiet_ms, 150);
    }
}
