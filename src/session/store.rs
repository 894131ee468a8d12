//! Session-scoped key/value storage
//!
//! The login flow never touches ambient session state: callers pass the
//! [`SessionId`] and a [`SessionStore`] explicitly.

use crate::settings::SessionSettings;
use crate::utils::crypto::{generate_nonce, SESSION_ID_BYTES};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

/// Opaque identifier of one browser session
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random session id
    #[must_use]
    pub fn generate() -> Self {
        Self(generate_nonce(SESSION_ID_BYTES))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// Session ids are bearer secrets; keep them out of logs
impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "SessionId({prefix}…)")
    }
}

/// Key/value capability scoped to a single session
pub trait SessionStore: Send + Sync {
    fn get(&self, session: &SessionId, key: &str) -> Option<String>;

    /// Store `value`, replacing any previous value under `key`
    fn set(&self, session: &SessionId, key: &str, value: String);

    /// Remove and return the value under `key`
    fn remove(&self, session: &SessionId, key: &str) -> Option<String>;

    /// Drop every attribute of `session`
    fn invalidate(&self, session: &SessionId);
}

/// Default lifetime of a session, matching the session cookie
pub const DEFAULT_SESSION_TTL_HOURS: u32 = 24;

/// Default upper bound on sessions held at once
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

struct SessionEntry {
    attributes: HashMap<String, String>,
    expires_at: DateTime<Utc>,
}

impl SessionEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Process-local session storage
///
/// A session expires a fixed time after its first attribute was stored.
/// Expired sessions are invisible to `get` and are pruned whenever a new
/// session is created. When `max_sessions` live sessions are held, the one
/// closest to expiry is evicted to make room.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    ttl: Duration,
    max_sessions: usize,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::with_limits(
            Duration::hours(i64::from(DEFAULT_SESSION_TTL_HOURS)),
            DEFAULT_MAX_SESSIONS,
        )
    }
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with a custom session lifetime and capacity
    #[must_use]
    pub fn with_limits(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Store configured from the `[session]` settings section
    #[must_use]
    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self::with_limits(
            Duration::hours(i64::from(settings.session_duration_hours)),
            settings.max_sessions,
        )
    }

    /// Number of sessions currently held, expired ones included until pruned
    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn make_room(&self, sessions: &mut HashMap<SessionId, SessionEntry>, now: DateTime<Utc>) {
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(now));
        let pruned = before - sessions.len();
        if pruned > 0 {
            log::debug!("Pruned {pruned} expired session(s), {} held", sessions.len());
        }

        if sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                log::warn!(
                    "Session store is full ({} sessions), evicting the oldest session",
                    self.max_sessions
                );
                sessions.remove(&oldest);
            }
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, session: &SessionId, key: &str) -> Option<String> {
        let sessions = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        sessions
            .get(session)
            .filter(|entry| !entry.is_expired(Utc::now()))
            .and_then(|entry| entry.attributes.get(key).cloned())
    }

    fn set(&self, session: &SessionId, key: &str, value: String) {
        let now = Utc::now();
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if sessions
            .get(session)
            .is_some_and(|entry| entry.is_expired(now))
        {
            sessions.remove(session);
        }
        if !sessions.contains_key(session) {
            self.make_room(&mut sessions, now);
        }

        sessions
            .entry(session.clone())
            .or_insert_with(|| SessionEntry {
                attributes: HashMap::new(),
                expires_at: now + self.ttl,
            })
            .attributes
            .insert(key.to_string(), value);
    }

    fn remove(&self, session: &SessionId, key: &str) -> Option<String> {
        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = sessions.get_mut(session)?;
        let removed = entry.attributes.remove(key);
        if entry.attributes.is_empty() {
            sessions.remove(session);
        }
        removed
    }

    fn invalidate(&self, session: &SessionId) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session);
    }
}
