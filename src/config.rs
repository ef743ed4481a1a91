//! Configuration management for stillpoint
//!
//! Config is stored at ~/.config/stillpoint/config.toml. Store endpoint and
//! key can be overridden with STILLPOINT_STORE_URL / STILLPOINT_ANON_KEY.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::playback::PlayerType;
use crate::upload::{DEFAULT_ASSET_BUCKET, DEFAULT_SITE_BUCKET};

pub const STORE_URL_ENV: &str = "STILLPOINT_STORE_URL";
pub const ANON_KEY_ENV: &str = "STILLPOINT_ANON_KEY";

/// Default tracing filter when neither RUST_LOG nor the config sets one
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the catalog store
    pub store_url: Option<String>,
    /// Public (anonymous) API key
    pub anon_key: Option<String>,
    /// Session token cached by `login`
    pub access_token: Option<String>,
    /// Bucket for catalog assets (default "assets")
    pub asset_bucket: Option<String>,
    /// Bucket for logo and banners (default "site-assets")
    pub site_bucket: Option<String>,
    /// Local player for `play`
    pub preferred_player: Option<PlayerType>,
    /// tracing filter directive, e.g. "stillpoint=debug"
    pub log_filter: Option<String>,
}

/// Environment value wins over the file value; blanks count as unset
fn pick(env: Option<String>, file: Option<&String>) -> Option<String> {
    env.filter(|v| !v.trim().is_empty())
        .or_else(|| file.filter(|v| !v.trim().is_empty()).cloned())
}

impl Config {
    /// Get config file path (~/.config/stillpoint/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("stillpoint").join("config.toml"))
    }

    /// Load config from the default path, or defaults if not found
    pub fn load() -> Self {
        Self::path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    /// Load config from `path`, or defaults if missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&path)
    }

    /// Save config to `path`, creating the parent directory if needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Creating {}", parent.display()))?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml).with_context(|| format!("Writing {}", path.display()))?;
        Ok(())
    }

    /// Store URL: STILLPOINT_STORE_URL, then the config file
    pub fn store_url(&self) -> Option<String> {
        pick(std::env::var(STORE_URL_ENV).ok(), self.store_url.as_ref())
    }

    /// Anon key: STILLPOINT_ANON_KEY, then the config file
    pub fn anon_key(&self) -> Option<String> {
        pick(std::env::var(ANON_KEY_ENV).ok(), self.anon_key.as_ref())
    }

    pub fn asset_bucket(&self) -> &str {
        self.asset_bucket.as_deref().unwrap_or(DEFAULT_ASSET_BUCKET)
    }

    pub fn site_bucket(&self) -> &str {
        self.site_bucket.as_deref().unwrap_or(DEFAULT_SITE_BUCKET)
    }

    pub fn player(&self) -> PlayerType {
        self.preferred_player.unwrap_or_default()
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}
