//! Bounded scrape history persisted as a JSON file.

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ScraperError};
use crate::model::ScrapeResult;

pub const DEFAULT_SESSION_CAP: usize = 10;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// One stored scrape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    /// When the session was stored, RFC 3339
    pub timestamp: String,
    pub data: ScrapeResult,
}

impl Session {
    pub fn new(data: ScrapeResult) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id(now.timestamp_millis()),
            timestamp: now.to_rfc3339(),
            data,
        }
    }
}

/// `session_<millis>_<9 lowercase base-36 chars>`
fn session_id(millis: i64) -> String {
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[fastrand::usize(..ID_ALPHABET.len())] as char)
        .collect();
    format!("session_{}_{}", millis, suffix)
}

/// Oldest-first session history holding at most `cap` entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStore {
    #[serde(skip, default = "default_cap")]
    cap: usize,
    #[serde(default)]
    sessions: Vec<Session>,
    #[serde(default)]
    last_scrape_time: Option<String>,
}

fn default_cap() -> usize {
    DEFAULT_SESSION_CAP
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_CAP)
    }
}

impl SessionStore {
    /// A cap of zero is raised to one.
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            sessions: Vec::new(),
            last_scrape_time: None,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Append a session, evicting the oldest ones beyond the cap.
    /// Returns the number of sessions held afterwards.
    pub fn push(&mut self, session: Session) -> usize {
        self.last_scrape_time = Some(session.timestamp.clone());
        debug!(session_id = %session.session_id, posts = session.data.posts.len(), "storing session");
        self.sessions.push(session);
        self.enforce_cap();
        self.sessions.len()
    }

    /// Wrap a scrape result in a fresh session and store it.
    pub fn record(&mut self, data: ScrapeResult) -> &Session {
        self.push(Session::new(data));
        // push always leaves at least the new session behind
        &self.sessions[self.sessions.len() - 1]
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn latest(&self) -> Option<&Session> {
        self.sessions.last()
    }

    /// Session by zero-based position, oldest first.
    pub fn get(&self, index: usize) -> Result<&Session> {
        self.sessions
            .get(index)
            .ok_or(ScraperError::SessionNotFound {
                index,
                available: self.sessions.len(),
            })
    }

    pub fn last_scrape_time(&self) -> Option<&str> {
        self.last_scrape_time.as_deref()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
        self.last_scrape_time = None;
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Load a store from `path`. A missing file gives an empty store.
    pub fn load(path: &Path, cap: usize) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no session file, starting empty");
            return Ok(Self::new(cap));
        }

        let raw = fs::read_to_string(path)?;
        let mut store: SessionStore = serde_json::from_str(&raw)?;
        store.cap = cap.max(1);
        store.enforce_cap();
        debug!(path = %path.display(), sessions = store.len(), "loaded sessions");
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), sessions = self.len(), "saved sessions");
        Ok(())
    }

    fn enforce_cap(&mut self) {
        if self.sessions.len() > self.cap {
            let excess = self.sessions.len() - self.cap;
            self.sessions.drain(..excess);
        }
    }
}
