//! Per-visitor session data, carried explicitly in the request context
//!
//! The server loads a [`Session`] from the [`SessionStore`] before dispatch
//! and writes it back afterwards. Handlers never touch the store directly.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "press_session";

const SESSION_ID_LEN: usize = 40;

/// Sessions untouched for this long are dropped
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

/// Session values plus one-request flash messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    data: HashMap<String, String>,
    /// Flashed by the previous request, readable during this one
    flashed: HashMap<String, String>,
    /// Flashed during this request, readable during the next one
    outgoing: HashMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn forget(&mut self, key: &str) -> Option<String> {
        self.data.remove(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Store a message for the next request only
    pub fn flash(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.outgoing.insert(key.into(), value.into());
    }

    /// A message flashed by the previous request
    pub fn flashed(&self, key: &str) -> Option<&str> {
        self.flashed.get(key).map(String::as_str)
    }

    /// Clear all values and pending flash messages
    pub fn clear(&mut self) {
        self.data.clear();
        self.outgoing.clear();
    }

    /// No values and no flash messages in either direction
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.flashed.is_empty() && self.outgoing.is_empty()
    }

    /// Rotate flash messages: outgoing becomes readable, the old ones expire
    fn age(mut self) -> Self {
        self.flashed = std::mem::take(&mut self.outgoing);
        self
    }
}

#[derive(Debug, Clone)]
struct Entry {
    session: Session,
    last_seen: Instant,
}

/// In-memory session storage shared by all connections
///
/// Only sessions holding something are stored. Entries idle for longer than
/// the timeout are swept whenever a session is saved.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Entry>>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            idle_timeout,
        }
    }

    /// Load the session named by a `Cookie` header, or start a new one
    ///
    /// Returns the session id to send back and the session itself. Flash
    /// messages from the previous request become readable here. An expired
    /// session is treated as unknown.
    pub fn load(&self, cookie_header: Option<&str>) -> (String, Session) {
        if let Some(id) = cookie_header.and_then(session_id_from_cookie) {
            let existing = match self.sessions.read() {
                Ok(sessions) => sessions
                    .get(id)
                    .filter(|entry| entry.last_seen.elapsed() < self.idle_timeout)
                    .map(|entry| entry.session.clone()),
                Err(_) => {
                    warn!("session store lock poisoned, starting a fresh session");
                    None
                }
            };
            if let Some(session) = existing {
                return (id.to_string(), session);
            }
        }
        (generate_id(), Session::new())
    }

    /// Persist a session after the request finished
    ///
    /// Returns whether the session is stored, i.e. whether the client should
    /// keep its cookie. Empty sessions are dropped instead of stored.
    pub fn save(&self, id: &str, session: Session) -> bool {
        let session = session.age();
        let mut sessions = match self.sessions.write() {
            Ok(sessions) => sessions,
            Err(_) => {
                warn!(session = id, "session store lock poisoned, session not saved");
                return false;
            }
        };

        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() < self.idle_timeout);
        if sessions.len() < before {
            debug!(expired = before - sessions.len(), "swept idle sessions");
        }

        if session.is_empty() {
            sessions.remove(id);
            return false;
        }
        sessions.insert(
            id.to_string(),
            Entry {
                session,
                last_seen: Instant::now(),
            },
        );
        true
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `Set-Cookie` value for a session id
pub fn session_cookie(id: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

fn session_id_from_cookie(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
    })
}

fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}
