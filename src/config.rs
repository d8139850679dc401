//! Scraper configuration, loaded from TOML.
//!
//! Every field has a default, so an empty or missing file is a valid
//! configuration. Example:
//!
//! ```toml
//! session_cap = 20
//! store_path = "data/sessions.json"
//!
//! [scroll]
//! max_scrolls = 5
//! delay_ms = 800
//!
//! [[strategies]]
//! name = "article"
//! query = { kind = "tag", name = "article" }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cascade::{default_strategies, Cascade, Strategy};
use crate::error::{Result, ScraperError};
use crate::scroll::ScrollSettings;
use crate::session::DEFAULT_SESSION_CAP;

pub const DEFAULT_STORE_PATH: &str = "feed_scraper_sessions.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Container strategies, highest priority first
    pub strategies: Vec<Strategy>,
    /// Sessions kept before the oldest are evicted
    pub session_cap: usize,
    pub store_path: PathBuf,
    pub scroll: ScrollSettings,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            session_cap: DEFAULT_SESSION_CAP,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            scroll: ScrollSettings::default(),
        }
    }
}

impl ScraperConfig {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ScraperConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.session_cap == 0 {
            return Err(invalid("session_cap must be at least 1"));
        }
        if self.strategies.is_empty() {
            return Err(invalid("at least one strategy is required"));
        }
        if let Some(s) = self.strategies.iter().find(|s| s.name.trim().is_empty()) {
            return Err(invalid(&format!(
                "strategy with query '{}' has an empty name",
                s.query.to_css()
            )));
        }
        Ok(())
    }

    pub fn cascade(&self) -> Cascade {
        Cascade::new(self.strategies.clone())
    }
}

fn invalid(message: &str) -> ScraperError {
    ScraperError::InvalidConfig {
        message: message.to_string(),
    }
}
