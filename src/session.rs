//! Session persistence
//!
//! The session is a handful of strings stored under fixed keys. Stores are
//! swappable behind [`SessionStore`]; the rest of the crate only talks to the
//! injected [`SessionContext`].

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::auth::TokenClaims;
use crate::error::{DashboardError, Result};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USERNAME_KEY: &str = "username";

const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USERNAME_KEY];

/// A logged-in user's credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    /// Stored but never exchanged
    pub refresh_token: Option<String>,
    pub username: Option<String>,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            username: None,
        }
    }

    fn to_entries(&self) -> BTreeMap<String, String> {
        let mut entries = BTreeMap::new();
        entries.insert(ACCESS_TOKEN_KEY.to_string(), self.access_token.clone());
        if let Some(refresh) = &self.refresh_token {
            entries.insert(REFRESH_TOKEN_KEY.to_string(), refresh.clone());
        }
        if let Some(username) = &self.username {
            entries.insert(USERNAME_KEY.to_string(), username.clone());
        }
        entries
    }

    /// Rebuild from stored entries; an empty access token counts as absent
    fn from_entries(entries: &BTreeMap<String, String>) -> Option<Self> {
        let access_token = entries.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())?;
        Some(Self {
            access_token: access_token.clone(),
            refresh_token: entries.get(REFRESH_TOKEN_KEY).cloned(),
            username: entries.get(USERNAME_KEY).cloned(),
        })
    }
}

/// Key/value persistence for the session
pub trait SessionStore: Send + Sync {
    /// Persist `session`, replacing any previous one
    fn save(&self, session: &Session) -> Result<()>;

    /// Current session, `None` when absent or unreadable
    fn load(&self) -> Option<Session>;

    /// Remove every session key. Clearing an empty store is a no-op.
    fn clear(&self) -> Result<()>;
}

/// In-process store, lost on exit
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value under a storage key
    pub fn get_item(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| DashboardError::Storage("session store poisoned".into()))?;
        for key in SESSION_KEYS {
            entries.remove(key);
        }
        entries.extend(session.to_entries());
        Ok(())
    }

    fn load(&self) -> Option<Session> {
        let entries = self.entries.lock().ok()?;
        Session::from_entries(&entries)
    }

    fn clear(&self) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| DashboardError::Storage("session store poisoned".into()))?;
        for key in SESSION_KEYS {
            entries.remove(key);
        }
        Ok(())
    }
}

/// JSON file of storage key to value
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Owner-only file, since it holds bearer tokens
#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(bytes)
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    fs::write(path, bytes)
}

impl SessionStore for FileSessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&session.to_entries())?;
        write_private(&self.path, raw.as_bytes())?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    fn load(&self) -> Option<Session> {
        match self.read_entries() {
            Ok(entries) => Session::from_entries(&entries),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable session file, treating as logged out");
                None
            }
        }
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// How far a stored token is trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// Presence of an access token means logged in
    #[default]
    PresenceOnly,
    /// Tokens whose `exp` claim has passed count as absent
    RejectExpired,
}

/// Injectable handle on the single session source of truth
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    policy: ExpiryPolicy,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            policy: ExpiryPolicy::PresenceOnly,
        }
    }

    /// Context over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn get(&self) -> Option<Session> {
        let session = self.store.load()?;
        if self.policy == ExpiryPolicy::RejectExpired {
            let now = chrono::Utc::now().timestamp();
            if TokenClaims::decode(&session.access_token).is_some_and(|c| c.is_expired(now)) {
                warn!("Stored access token has expired");
                return None;
            }
        }
        Some(session)
    }

    pub fn set(&self, session: &Session) -> Result<()> {
        self.store.save(session)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.clear()
    }

    pub fn access_token(&self) -> Option<String> {
        self.get().map(|s| s.access_token)
    }

    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }

    pub fn username(&self) -> Option<String> {
        self.get().and_then(|s| s.username)
    }
}
