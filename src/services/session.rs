use crate::error::Result;
use crate::models::config::SessionConfig;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    LoggedOut,
    Unauthorized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Active(String),
    Ended(SessionEnd),
}

/// The bearer credential, shared by handle. Every view reads it; only logout
/// and the unauthorized-response path clear it.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<SessionState>>,
    file: Option<Arc<TokenFile>>,
}

impl SessionStore {
    pub fn in_memory() -> Self {
        let (tx, _) = watch::channel(SessionState::Ended(SessionEnd::LoggedOut));
        Self {
            state: Arc::new(tx),
            file: None,
        }
    }

    /// A store backed by the token file; an existing token is picked up immediately.
    pub fn persistent(config: &SessionConfig) -> Self {
        let file = TokenFile::new(&config.token_file, &config.storage_key);
        let initial = match file.load() {
            Some(token) => SessionState::Active(token),
            None => SessionState::Ended(SessionEnd::LoggedOut),
        };
        let (tx, _) = watch::channel(initial);
        Self {
            state: Arc::new(tx),
            file: Some(Arc::new(file)),
        }
    }

    pub fn token(&self) -> Option<String> {
        match &*self.state.borrow() {
            SessionState::Active(token) => Some(token.clone()),
            SessionState::Ended(_) => None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(&*self.state.borrow(), SessionState::Active(_))
    }

    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        if let Some(file) = &self.file {
            if let Err(e) = file.save(&token) {
                warn!("Failed to persist session token: {}", e);
            }
        }
        self.state.send_replace(SessionState::Active(token));
        info!("Session started");
    }

    pub fn clear(&self, reason: SessionEnd) {
        if let Some(file) = &self.file {
            if let Err(e) = file.remove() {
                warn!("Failed to remove session token: {}", e);
            }
        }
        let previous = self.state.send_replace(SessionState::Ended(reason));
        if matches!(previous, SessionState::Active(_)) {
            info!("Session ended: {:?}", reason);
        }
    }

    /// Receives every change, including invalidation by an unauthorized response.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

/// JSON file holding the token under a fixed key, standing in for browser storage.
pub struct TokenFile {
    path: PathBuf,
    key: String,
}

impl TokenFile {
    pub fn new(path: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            key: key.to_string(),
        }
    }

    pub fn load(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let stored: Map<String, Value> = serde_json::from_str(&content).ok()?;
        stored
            .get(&self.key)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }

    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut stored: Map<String, Value> = std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|c| serde_json::from_str(&c).ok())
            .unwrap_or_default();
        stored.insert(self.key.clone(), Value::String(token.to_string()));
        std::fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }

    pub fn remove(&self) -> Result<()> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let mut stored: Map<String, Value> = serde_json::from_str(&content).unwrap_or_default();
        stored.remove(&self.key);
        if stored.is_empty() {
            std::fs::remove_file(&self.path)?;
        } else {
            std::fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;
        }
        Ok(())
    }
}
