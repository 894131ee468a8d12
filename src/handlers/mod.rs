// HTTP request handlers for GitHub login
pub mod health;
pub mod oauth;
pub mod userinfo;

use actix_web::web;

pub use health::health;
pub use oauth::{github_callback, github_sign_in};
pub use userinfo::userinfo;

/// Session attribute holding the authenticated username
pub const PRINCIPAL_SESSION_KEY: &str = "idlink.principal";

pub const SIGN_IN_PATH: &str = "/auth/github/sign_in";

/// Register all routes
///
/// Expects `web::Data` for [`crate::authentication::AuthenticationFlow`],
/// `dyn` [`crate::session::SessionStore`] and [`crate::session::CookieFactory`].
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.route(SIGN_IN_PATH, web::get().to(github_sign_in))
        .route(crate::settings::CALLBACK_PATH, web::get().to(github_callback))
        .route("/auth/userinfo", web::get().to(userinfo))
        .route("/ping", web::get().to(health));
}
