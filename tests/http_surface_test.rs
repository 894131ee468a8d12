// HTTP surface tests: sign-in redirect, callback, userinfo and health
use actix_web::cookie::Cookie;
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use idlink::accounts::InMemoryAccountStore;
use idlink::authentication::AuthenticationFlow;
use idlink::handlers::configure_services;
use idlink::session::{
    CookieFactory, InMemorySessionStore, SessionStore, SESSION_COOKIE_NAME,
};
use idlink::testing::{FakeIdentityProvider, StaticConnectionProvider, TestFixtures};
use serde_json::Value;
use std::sync::Arc;
use url::Url;

fn flow_with(
    connections: StaticConnectionProvider,
    sessions: Arc<dyn SessionStore>,
    accounts: Arc<InMemoryAccountStore>,
) -> AuthenticationFlow {
    AuthenticationFlow::new(
        Arc::new(connections),
        Arc::new(FakeIdentityProvider::new()),
        sessions,
        accounts,
        TestFixtures::flow_config(),
    )
}

macro_rules! init_app {
    ($flow:expr, $sessions:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($flow))
                .app_data(web::Data::from($sessions))
                .app_data(web::Data::new(CookieFactory::new(false, 24)))
                .configure(configure_services),
        )
        .await
    };
}

fn location(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn session_cookie(resp: &actix_web::dev::ServiceResponse) -> Cookie<'static> {
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(Cookie::into_owned)
        .expect("session cookie is set")
}

fn state_param(redirect: &str) -> String {
    Url::parse(redirect)
        .unwrap()
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .unwrap()
}

#[actix_web::test]
async fn test_full_login_round_trip() {
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let accounts = Arc::new(InMemoryAccountStore::new());
    let flow = flow_with(
        StaticConnectionProvider::configured(),
        sessions.clone(),
        accounts.clone(),
    );
    let app = init_app!(flow, sessions);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/auth/github/sign_in").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let redirect = location(&resp);
    assert!(redirect.starts_with("https://github.example/login/oauth/authorize"));
    let cookie = session_cookie(&resp);
    let state = state_param(&redirect);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/auth/github/callback?code=c1&state={state}"))
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    assert_eq!(accounts.linked_username("42").as_deref(), Some("alice"));
    let logged_in = session_cookie(&resp);
    assert_ne!(logged_in.value(), cookie.value());

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/userinfo")
            .cookie(logged_in)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "alice");
}

#[actix_web::test]
async fn test_login_does_not_adopt_pre_login_session_id() {
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let flow = flow_with(
        StaticConnectionProvider::configured(),
        sessions.clone(),
        Arc::new(InMemoryAccountStore::new()),
    );
    let app = init_app!(flow, sessions);

    // Session id chosen by someone other than the browser's owner
    let planted = Cookie::new(SESSION_COOKIE_NAME, "attacker-chosen");

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/github/sign_in")
            .cookie(planted.clone())
            .to_request(),
    )
    .await;
    let state = state_param(&location(&resp));

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/auth/github/callback?code=c1&state={state}"))
            .cookie(planted.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let established = session_cookie(&resp);
    assert_ne!(established.value(), "attacker-chosen");

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/userinfo")
            .cookie(planted)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/userinfo")
            .cookie(established)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_rejected_callback_clears_session() {
    let store = Arc::new(InMemorySessionStore::new());
    let sessions: Arc<dyn SessionStore> = store.clone();
    let flow = flow_with(
        StaticConnectionProvider::configured(),
        sessions.clone(),
        Arc::new(InMemoryAccountStore::new()),
    );
    let app = init_app!(flow, sessions);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/auth/github/sign_in").to_request(),
    )
    .await;
    let cookie = session_cookie(&resp);
    assert_eq!(store.session_count(), 1);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/github/callback?code=c1&state=forged")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let cleared = session_cookie(&resp);
    assert_eq!(cleared.value(), "");
    assert_eq!(cleared.max_age(), Some(actix_web::cookie::time::Duration::ZERO));
    assert_eq!(store.session_count(), 0);
}

#[actix_web::test]
async fn test_cookieless_sign_ins_do_not_grow_sessions_without_bound() {
    let store = Arc::new(InMemorySessionStore::with_limits(
        chrono::Duration::hours(1),
        16,
    ));
    let sessions: Arc<dyn SessionStore> = store.clone();
    let flow = flow_with(
        StaticConnectionProvider::configured(),
        sessions.clone(),
        Arc::new(InMemoryAccountStore::new()),
    );
    let app = init_app!(flow, sessions);

    for _ in 0..200 {
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri("/auth/github/sign_in").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
    }

    assert_eq!(store.session_count(), 16);
}

#[actix_web::test]
async fn test_callback_with_bad_state_is_unauthorized() {
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let accounts = Arc::new(InMemoryAccountStore::new());
    let flow = flow_with(
        StaticConnectionProvider::configured(),
        sessions.clone(),
        accounts.clone(),
    );
    let app = init_app!(flow, sessions);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/auth/github/sign_in").to_request(),
    )
    .await;
    let cookie = session_cookie(&resp);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/github/callback?code=c1&state=forged")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_state");
    assert!(!body["message"].as_str().unwrap().contains("forged"));
    assert_eq!(accounts.account_count(), 0);
}

#[actix_web::test]
async fn test_callback_without_session_cookie_is_unauthorized() {
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let flow = flow_with(
        StaticConnectionProvider::configured(),
        sessions.clone(),
        Arc::new(InMemoryAccountStore::new()),
    );
    let app = init_app!(flow, sessions);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/github/callback?code=c1&state=anything")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_callback_without_code_redirects_to_sign_in() {
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let flow = flow_with(
        StaticConnectionProvider::configured(),
        sessions.clone(),
        Arc::new(InMemoryAccountStore::new()),
    );
    let app = init_app!(flow, sessions);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/github/callback?error=access_denied&state=abc")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/github/sign_in");
}

#[actix_web::test]
async fn test_sign_in_not_configured_is_service_unavailable() {
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let flow = flow_with(
        StaticConnectionProvider::unconfigured(),
        sessions.clone(),
        Arc::new(InMemoryAccountStore::new()),
    );
    let app = init_app!(flow, sessions);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/auth/github/sign_in").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "not_configured");
}

#[actix_web::test]
async fn test_userinfo_without_session_is_unauthorized() {
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let flow = flow_with(
        StaticConnectionProvider::configured(),
        sessions.clone(),
        Arc::new(InMemoryAccountStore::new()),
    );
    let app = init_app!(flow, sessions);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/auth/userinfo").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_ping() {
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let flow = flow_with(
        StaticConnectionProvider::configured(),
        sessions.clone(),
        Arc::new(InMemoryAccountStore::new()),
    );
    let app = init_app!(flow, sessions);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}
