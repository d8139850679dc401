//! Scraped data types

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

use crate::cascade::Diagnostics;
use crate::error::{Result, ScraperError};

static SUBREDDIT_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/r/([a-z0-9_]+)").unwrap());

/// Subreddit reported when the page path names none.
pub const UNKNOWN_SUBREDDIT: &str = "unknown";

/// One post scraped from the feed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostRecord {
    pub title: String,
    pub author: String,
    pub subreddit: String,
    pub upvotes: u64,
    pub comments: u64,
    pub url: String,
}

/// Where the tree being scraped came from.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    page_url: String,
    base: Option<Url>,
}

impl PageContext {
    pub fn new(page_url: &str) -> Self {
        Self {
            page_url: page_url.to_string(),
            base: Url::parse(page_url).ok(),
        }
    }

    /// Like `new`, but rejects anything that is not an absolute URL.
    pub fn parse(page_url: &str) -> Result<Self> {
        let base = Url::parse(page_url).map_err(|_| ScraperError::InvalidPageUrl {
            url: page_url.to_string(),
        })?;
        Ok(Self {
            page_url: page_url.to_string(),
            base: Some(base),
        })
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    /// Subreddit named by the page path, or "unknown".
    pub fn subreddit(&self) -> String {
        let path = match &self.base {
            Some(u) => u.path().to_string(),
            None => self.page_url.clone(),
        };
        SUBREDDIT_PATH
            .captures(&path)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| UNKNOWN_SUBREDDIT.to_string())
    }

    /// Resolve a link destination against the page URL.
    /// Without a usable base the href comes back unchanged.
    pub fn resolve_link(&self, href: &str) -> String {
        let href = href.trim();
        match &self.base {
            Some(base) => match base.join(href) {
                Ok(absolute) => absolute.to_string(),
                Err(_) => href.to_string(),
            },
            None => href.to_string(),
        }
    }
}

/// Result of one scrape, as handed to storage and export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub success: bool,
    pub posts: Vec<PostRecord>,
    pub page_url: String,
    pub subreddit: String,
    /// RFC 3339 capture time
    pub timestamp: String,
    /// Name of the cascade strategy that found the posts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}
