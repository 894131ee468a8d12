// GitHub login handlers: sign-in redirect and provider callback
use crate::authentication::{AuthOutcome, AuthenticationFlow, FlowError, RejectReason};
use crate::handlers::{PRINCIPAL_SESSION_KEY, SIGN_IN_PATH};
use crate::oauth::OAuthCallback;
use crate::session::{CookieFactory, SessionId, SessionStore};
use crate::utils::responses::ResponseBuilder;
use actix_web::{web, HttpRequest, HttpResponse};
use log::{error, info, warn};

/// Start a GitHub login
///
/// Reuses the browser session when the request carries one, otherwise starts
/// a new session. The session cookie is (re)issued with the redirect.
pub async fn github_sign_in(
    req: HttpRequest,
    flow: web::Data<AuthenticationFlow>,
    cookies: web::Data<CookieFactory>,
) -> HttpResponse {
    let session = CookieFactory::session_from_request(&req).unwrap_or_else(SessionId::generate);

    match flow.begin_login(&session) {
        Ok(redirect) => ResponseBuilder::redirect(redirect.as_str())
            .with_cookie(cookies.create_session_cookie(&session))
            .build(),
        Err(FlowError::NotConfigured) => ResponseBuilder::service_unavailable()
            .with_error_code(RejectReason::NotConfigured.code())
            .with_message(&RejectReason::NotConfigured.user_message())
            .build(),
        Err(e @ FlowError::Redirect(_)) => {
            error!("Failed to start GitHub login: {e}");
            ResponseBuilder::internal_server_error().build()
        }
    }
}

/// GitHub redirects back here with `code` and `state`
///
/// A successful login always moves the principal to a newly generated
/// session; the id the browser presented before login is invalidated.
pub async fn github_callback(
    req: HttpRequest,
    query: web::Query<OAuthCallback>,
    flow: web::Data<AuthenticationFlow>,
    sessions: web::Data<dyn SessionStore>,
    cookies: web::Data<CookieFactory>,
) -> HttpResponse {
    if let Some(provider_error) = &query.error {
        warn!("GitHub returned an authorization error: {provider_error}");
    }

    // Without a session cookie there is no stored state, so a callback that
    // carries a code is rejected by the state check
    let session = CookieFactory::session_from_request(&req).unwrap_or_else(SessionId::generate);

    match flow
        .complete_login(&session, query.code.as_deref(), query.state.as_deref())
        .await
    {
        AuthOutcome::Authenticated(principal) => {
            let established = SessionId::generate();
            sessions.invalidate(&session);
            sessions.set(&established, PRINCIPAL_SESSION_KEY, principal.username.clone());
            info!("Session established for '{principal}'");
            ResponseBuilder::redirect("/")
                .with_cookie(cookies.create_session_cookie(&established))
                .build()
        }
        AuthOutcome::Rejected(reason) => {
            // An existing login survives a failed second attempt
            if sessions.get(&session, PRINCIPAL_SESSION_KEY).is_some() {
                return ResponseBuilder::login_rejected(&reason).build();
            }
            sessions.invalidate(&session);
            ResponseBuilder::login_rejected(&reason)
                .with_cookie(cookies.create_expired_cookie())
                .build()
        }
        AuthOutcome::NotApplicable => ResponseBuilder::redirect(SIGN_IN_PATH).build(),
    }
}
