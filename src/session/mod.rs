//! Browser session handling
//!
//! - [`store`] - session-scoped key/value storage used for the CSRF state token
//! - [`cookie`] - the cookie carrying the session id

pub mod cookie;
pub mod store;

pub use cookie::{CookieFactory, SESSION_COOKIE_NAME};
pub use store::{
    InMemorySessionStore, SessionId, SessionStore, DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TTL_HOURS,
};
