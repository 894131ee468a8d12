use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;

use crate::session::store::SessionId;
use crate::settings::SessionSettings;

/// Cookie carrying the browser session id
pub const SESSION_COOKIE_NAME: &str = "idlink_session";

/// Cookie factory for the browser session cookie
#[derive(Clone)]
pub struct CookieFactory {
    cookie_secure: bool,
    max_age: Duration,
}

impl CookieFactory {
    #[must_use]
    pub fn new(cookie_secure: bool, session_duration_hours: u32) -> Self {
        Self {
            cookie_secure,
            max_age: Duration::hours(i64::from(session_duration_hours)),
        }
    }

    /// Cookie lifetime matches the server-side session lifetime
    #[must_use]
    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self::new(settings.cookie_secure, settings.session_duration_hours)
    }

    /// Create the session cookie for `session`
    ///
    /// `SameSite::Lax` is required: the provider's redirect back to the callback
    /// is a cross-site top-level navigation that must still carry the cookie.
    #[must_use]
    pub fn create_session_cookie(&self, session: &SessionId) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE_NAME, session.as_str().to_owned())
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(self.max_age)
            .finish()
    }

    /// Create an expired session cookie to clear the browser session
    #[must_use]
    pub fn create_expired_cookie(&self) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE_NAME, "")
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(Duration::ZERO)
            .finish()
    }

    /// Session id carried by the request, if any
    #[must_use]
    pub fn session_from_request(req: &HttpRequest) -> Option<SessionId> {
        req.cookie(SESSION_COOKIE_NAME)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
            .map(SessionId::from)
    }
}
