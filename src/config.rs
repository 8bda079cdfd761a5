//! Layered configuration.
//!
//! Loading precedence (highest wins):
//! 1. Environment variables (ANIMEXIN_*)
//! 2. TOML file from ANIMEXIN_CONFIG_FILE, else `<config_dir>/animexin/config.toml`
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Site root every catalog path is joined to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How many search result pages to walk.
    #[serde(default = "default_search_pages")]
    pub search_pages: u32,

    /// Player binary used by the CLI.
    #[serde(default = "default_player")]
    pub player: String,
}

fn default_base_url() -> String {
    "https://animexin.dev".into()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
        .into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_search_pages() -> u32 {
    3
}

fn default_player() -> String {
    "mpv".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            search_pages: default_search_pages(),
            player: default_player(),
        }
    }
}

impl AppConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources and validate it.
    pub fn load() -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = config_file_path() {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("ANIMEXIN_").ignore(&["config_file"]));

        let config: Self = figment.extract().map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("base_url '{}': {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!("base_url must be http(s), got '{}'", url.scheme())));
        }
        if self.search_pages == 0 {
            return Err(Error::Config("search_pages must be at least 1".into()));
        }
        if self.timeout_ms == 0 {
            return Err(Error::Config("timeout_ms must be greater than 0".into()));
        }
        Ok(())
    }
}

fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("ANIMEXIN_CONFIG_FILE") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("animexin").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.base_url, "https://animexin.dev");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.search_pages, 3);
        assert_eq!(config.player, "mpv");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let config = AppConfig { base_url: "ftp://animexin.dev".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = AppConfig { base_url: "animexin".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = AppConfig { search_pages: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = AppConfig { timeout_ms: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }
}
