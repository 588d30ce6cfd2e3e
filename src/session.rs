//! Locally cached proof of login.
//!
//! The session is persisted as one JSON document and read through a single
//! [`SessionStore`]. Every change (set, clear, lazy expiry) is broadcast on a
//! `watch` channel so all consumers observe the same value.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::Result;

/// Sessions older than this are discarded on read.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Characters stripped from the front of the token before it is sent for
/// validation (the server issues tokens with a 6-character scheme prefix).
const TOKEN_PREFIX_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub name: String,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: String, user_id: i64, name: String) -> Self {
        Self {
            token,
            user_id,
            name,
            issued_at: Utc::now(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.issued_at > Duration::hours(SESSION_TTL_HOURS)
    }

    /// The token as the validate endpoint expects it, without its prefix.
    pub fn validation_token(&self) -> String {
        self.token.chars().skip(TOKEN_PREFIX_LEN).collect()
    }
}

pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<Session>>;
    fn save(&self, session: &Session) -> Result<()>;
    fn remove(&self) -> Result<()>;
}

/// JSON file on disk, the CLI's equivalent of browser local storage.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, format!("{json}\n"))?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MemoryStorage {
    slot: std::sync::Mutex<Option<Session>>,
}

#[cfg(test)]
impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Session>> {
        Ok(self.slot.lock().map(|s| s.clone()).unwrap_or_default())
    }

    fn save(&self, session: &Session) -> Result<()> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(session.clone());
        }
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
        Ok(())
    }
}

pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    tx: watch::Sender<Option<Session>>,
}

impl SessionStore {
    pub fn new(storage: Box<dyn SessionStorage>) -> Self {
        let initial = storage.load().unwrap_or_default();
        let (tx, _rx) = watch::channel(initial);
        Self { storage, tx }
    }

    pub fn on_disk(path: PathBuf) -> Self {
        Self::new(Box::new(FileStorage::new(path)))
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::default()))
    }

    pub fn get(&self) -> Result<Option<Session>> {
        self.get_at(Utc::now())
    }

    /// Read the stored session, clearing it first if it has expired.
    pub fn get_at(&self, now: DateTime<Utc>) -> Result<Option<Session>> {
        match self.storage.load()? {
            Some(session) if session.is_expired_at(now) => {
                tracing::info!(user_id = session.user_id, "session expired");
                self.clear()?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    pub fn set(&self, session: Session) -> Result<()> {
        self.storage.save(&session)?;
        self.tx.send_replace(Some(session));
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.storage.remove()?;
        self.tx.send_replace(None);
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}
