use crate::handlers::PRINCIPAL_SESSION_KEY;
use crate::session::{CookieFactory, SessionStore};
use crate::utils::responses::ResponseBuilder;
use actix_web::{web, HttpRequest, HttpResponse};
use log::debug;
use serde_json::json;

/// Principal of the current browser session
pub async fn userinfo(req: HttpRequest, sessions: web::Data<dyn SessionStore>) -> HttpResponse {
    let principal = CookieFactory::session_from_request(&req)
        .and_then(|session| sessions.get(&session, PRINCIPAL_SESSION_KEY));

    match principal {
        Some(username) => HttpResponse::Ok().json(json!({ "username": username })),
        None => {
            debug!("Userinfo endpoint: no authenticated session");
            ResponseBuilder::unauthorized().build()
        }
    }
}
