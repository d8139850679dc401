//! Error type for the collaborators around the scraping core.
//!
//! The core itself (cascade, field extraction, count parsing) never fails;
//! only storage, configuration and export surface errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid page URL: {url}")]
    InvalidPageUrl { url: String },

    #[error("Session not found: index {index} (have {available})")]
    SessionNotFound { index: usize, available: usize },
}

pub type Result<T> = std::result::Result<T, ScraperError>;
