//! # Configuration
//!
//! Loads the service configuration from a TOML file, layers environment
//! overrides on top, and validates the result before anything touches the
//! network.
//!
//! ## File layout
//!
//! ```toml
//! workers = 4
//! album_concurrency = 2
//! strict_metadata = false
//! skip_videos = false
//! sync_start_time = "03:30"
//! debug = false
//!
//! [destination]
//! api_url = "https://immich.example.com"
//! api_key = "..."
//! timeout_secs = 300
//!
//! [[albums]]
//! url = "https://photos.app.goo.gl/abc"
//! album_name = "Family"
//! sync_interval = "6h"
//! ```
//!
//! ## Environment overrides
//!
//! | Variable | Field |
//! |---|---|
//! | `ALBUM_SYNC_API_URL` | `destination.api_url` |
//! | `ALBUM_SYNC_API_KEY` | `destination.api_key` |
//! | `ALBUM_SYNC_WORKERS` | `workers` |
//! | `ALBUM_SYNC_DEBUG` | `debug` |

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

pub const ENV_API_URL: &str = "ALBUM_SYNC_API_URL";
pub const ENV_API_KEY: &str = "ALBUM_SYNC_API_KEY";
pub const ENV_WORKERS: &str = "ALBUM_SYNC_WORKERS";
pub const ENV_DEBUG: &str = "ALBUM_SYNC_DEBUG";

fn default_workers() -> usize {
    4
}

fn default_album_concurrency() -> usize {
    1
}

fn default_sync_interval() -> String {
    "24h".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

/// Top-level service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Destination server connection
    pub destination: DestinationConfig,

    /// Albums to mirror
    #[serde(default)]
    pub albums: Vec<AlbumConfig>,

    /// Transfer workers per album pass
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Albums allowed to sync at the same time
    #[serde(default = "default_album_concurrency")]
    pub album_concurrency: usize,

    /// Skip items without a capture timestamp
    #[serde(default)]
    pub strict_metadata: bool,

    /// Skip video items entirely
    #[serde(default)]
    pub skip_videos: bool,

    /// Local wall-clock time (`HH:MM`) for the first pass of every album
    #[serde(default)]
    pub sync_start_time: Option<String>,

    #[serde(default)]
    pub debug: bool,
}

/// Destination server settings.
#[derive(Clone, Deserialize)]
pub struct DestinationConfig {
    pub api_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout, sized for large video uploads
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl fmt::Debug for DestinationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestinationConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// One shared album to mirror.
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumConfig {
    /// Public share link
    pub url: String,

    /// Destination album name; defaults to the scraped title
    #[serde(default)]
    pub album_name: Option<String>,

    /// Compound duration such as `6h` or `1h30m`
    #[serde(default = "default_sync_interval")]
    pub sync_interval: String,

    /// Pin the destination album instead of matching by name
    #[serde(default)]
    pub existing_album_id: Option<String>,
}

impl AlbumConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            album_name: None,
            sync_interval: default_sync_interval(),
            existing_album_id: None,
        }
    }
}

impl AppConfig {
    /// Read and parse a TOML configuration file.
    ///
    /// Environment overrides are not applied; call
    /// [`apply_env_overrides`](Self::apply_env_overrides) and then
    /// [`validate`](Self::validate).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Apply `ALBUM_SYNC_*` variables from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.destination.api_url = url;
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.destination.api_key = key;
        }
        if let Some(workers) = get(ENV_WORKERS) {
            self.workers = workers.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be a non-negative integer, got '{}'", ENV_WORKERS, workers))
            })?;
        }
        if let Some(debug) = get(ENV_DEBUG) {
            self.debug = parse_flag(&debug).ok_or_else(|| {
                Error::Config(format!("{} must be a boolean, got '{}'", ENV_DEBUG, debug))
            })?;
        }

        Ok(())
    }

    /// Fail fast on settings that would make every pass fail.
    pub fn validate(&self) -> Result<()> {
        let api_url = self.destination.api_url.trim();
        if api_url.is_empty() {
            return Err(Error::Config("destination.api_url is required".to_string()));
        }
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "destination.api_url must be an http(s) URL, got '{}'",
                api_url
            )));
        }
        if self.destination.api_key.trim().is_empty() {
            return Err(Error::Config("destination.api_key is required".to_string()));
        }
        if let Some(index) = self.albums.iter().position(|a| a.url.trim().is_empty()) {
            return Err(Error::Config(format!("albums[{}].url is empty", index)));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const MINIMAL: &str = r#"
        [destination]
        api_url = "https://immich.local"
        api_key = "key"

        [[albums]]
        url = "https://photos.app.goo.gl/abc"
    "#;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.workers, 4);
        assert_eq!(config.album_concurrency, 1);
        assert!(!config.strict_metadata);
        assert!(!config.skip_videos);
        assert!(!config.debug);
        assert_eq!(config.sync_start_time, None);
        assert_eq!(config.destination.timeout_secs, 300);
        assert_eq!(config.albums[0].sync_interval, "24h");
        assert_eq!(config.albums[0].album_name, None);
        config.validate().unwrap();
    }

    #[test]
    fn test_full_file() {
        let config = AppConfig::from_toml_str(
            r#"
            workers = 8
            album_concurrency = 3
            strict_metadata = true
            skip_videos = true
            sync_start_time = "03:30"

            [destination]
            api_url = "http://10.0.0.2:2283/"
            api_key = "k"
            timeout_secs = 60

            [[albums]]
            url = "https://photos.app.goo.gl/a"
            album_name = "Family"
            sync_interval = "1h30m"
            existing_album_id = "abc-123"

            [[albums]]
            url = "https://photos.app.goo.gl/b"
            "#,
        )
        .unwrap();

        assert_eq!(config.workers, 8);
        assert_eq!(config.album_concurrency, 3);
        assert!(config.strict_metadata && config.skip_videos);
        assert_eq!(config.sync_start_time.as_deref(), Some("03:30"));
        assert_eq!(config.albums.len(), 2);
        assert_eq!(config.albums[0].album_name.as_deref(), Some("Family"));
        assert_eq!(config.albums[0].existing_album_id.as_deref(), Some("abc-123"));
        assert_eq!(config.albums[1].sync_interval, "24h");
    }

    #[test]
    fn test_malformed_toml() {
        let err = AppConfig::from_toml_str("workers = [").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::from_toml_str(MINIMAL).unwrap();
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "https://other.local"),
            (ENV_API_KEY, "from-env"),
            (ENV_WORKERS, "12"),
            (ENV_DEBUG, "true"),
        ]
        .into_iter()
        .collect();

        config
            .apply_overrides_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.destination.api_url, "https://other.local");
        assert_eq!(config.destination.api_key, "from-env");
        assert_eq!(config.workers, 12);
        assert!(config.debug);
    }

    #[test]
    fn test_env_empty_values_ignored() {
        let mut config = AppConfig::from_toml_str(MINIMAL).unwrap();
        config
            .apply_overrides_from(|_| Some("  ".to_string()))
            .unwrap();
        assert_eq!(config.destination.api_key, "key");
    }

    #[test]
    fn test_env_bad_values() {
        let mut config = AppConfig::from_toml_str(MINIMAL).unwrap();
        let err = config
            .apply_overrides_from(|key| (key == ENV_WORKERS).then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_WORKERS));

        let err = config
            .apply_overrides_from(|key| (key == ENV_DEBUG).then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_DEBUG));
    }

    #[test]
    fn test_validate_rejects() {
        let base = AppConfig::from_toml_str(MINIMAL).unwrap();

        let mut config = base.clone();
        config.destination.api_url = "immich.local".to_string();
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.destination.api_url = String::new();
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.destination.api_key = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = base.clone();
        config.albums.push(AlbumConfig::new(""));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("albums[1]"));

        // Pool sizes are clamped to 1 downstream
        let mut config = base;
        config.workers = 0;
        config.album_concurrency = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_from_env_is_accepted() {
        let mut config = AppConfig::from_toml_str(MINIMAL).unwrap();
        config
            .apply_overrides_from(|key| (key == ENV_WORKERS).then(|| "0".to_string()))
            .unwrap();

        assert_eq!(config.workers, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = AppConfig::from_toml_str(MINIMAL).unwrap();
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("\"key\""));
    }
}
