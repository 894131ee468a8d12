//! CSRF state token bound to the browser session
//!
//! A token is issued when login begins and embedded in the provider redirect.
//! The callback is accepted only if it carries the exact token stored for the
//! same session. Issuing again overwrites the previous token, so the most
//! recent login attempt of a session wins.

use std::sync::Arc;

use crate::session::{SessionId, SessionStore};
use crate::utils::crypto::{constant_time_eq, generate_csrf_token};

/// Session attribute holding the pending state token
pub const STATE_SESSION_KEY: &str = "idlink.github.state";

#[derive(Clone)]
pub struct StateTokenGuard {
    sessions: Arc<dyn SessionStore>,
}

impl StateTokenGuard {
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }

    /// Generate a fresh token and store it for `session`
    pub fn issue(&self, session: &SessionId) -> String {
        let token = generate_csrf_token();
        self.sessions.set(session, STATE_SESSION_KEY, token.clone());
        token
    }

    /// Check `supplied` against the token stored for `session`
    ///
    /// Does not clear the stored token; see [`StateTokenGuard::consume`].
    #[must_use]
    pub fn validate(&self, session: &SessionId, supplied: Option<&str>) -> bool {
        let Some(supplied) = supplied else {
            return false;
        };
        self.sessions
            .get(session, STATE_SESSION_KEY)
            .is_some_and(|stored| constant_time_eq(&stored, supplied))
    }

    /// Discard the token stored for `session`
    pub fn consume(&self, session: &SessionId) {
        self.sessions.remove(session, STATE_SESSION_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InMemorySessionStore;

    fn guard() -> StateTokenGuard {
        StateTokenGuard::new(Arc::new(InMemorySessionStore::new()))
    }

    #[test]
    fn test_issued_token_validates_for_same_session() {
        let guard = guard();
        let session = SessionId::from("A");
        let token = guard.issue(&session);
        assert!(guard.validate(&session, Some(&token)));
        // Validation alone does not consume the token
        assert!(guard.validate(&session, Some(&token)));
    }

    #[test]
    fn test_token_rejected_for_other_session() {
        let guard = guard();
        let token = guard.issue(&SessionId::from("A"));
        assert!(!guard.validate(&SessionId::from("B"), Some(&token)));
    }

    #[test]
    fn test_missing_or_mutated_state_rejected() {
        let guard = guard();
        let session = SessionId::from("A");
        let token = guard.issue(&session);

        assert!(!guard.validate(&session, None));
        assert!(!guard.validate(&session, Some("")));

        let mut mutated = token.clone();
        let last = mutated.pop().unwrap();
        mutated.push(if last == 'a' { 'b' } else { 'a' });
        assert!(!guard.validate(&session, Some(&mutated)));
        assert!(!guard.validate(&session, Some(&format!("{token}x"))));
    }

    #[test]
    fn test_reissue_replaces_previous_token() {
        let guard = guard();
        let session = SessionId::from("A");
        let first = guard.issue(&session);
        let second = guard.issue(&session);
        assert_ne!(first, second);
        assert!(!guard.validate(&session, Some(&first)));
        assert!(guard.validate(&session, Some(&second)));
    }

    #[test]
    fn test_consume_prevents_replay() {
        let guard = guard();
        let session = SessionId::from("A");
        let token = guard.issue(&session);
        guard.consume(&session);
        assert!(!guard.validate(&session, Some(&token)));
    }

    #[test]
    fn test_no_token_issued() {
        let guard = guard();
        assert!(!guard.validate(&SessionId::from("A"), Some("anything")));
    }
}
