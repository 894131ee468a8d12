#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use idlink::{
    accounts::{AccountStore, InMemoryAccountStore},
    authentication::AuthenticationServiceFactory,
    handlers::configure_services,
    session::{CookieFactory, InMemorySessionStore, SessionStore},
    settings::IdlinkSettings,
};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from Settings.toml and environment variables
    let settings = IdlinkSettings::load().context("Failed to load settings")?;
    settings
        .initialize_logging()
        .context("Failed to initialize logging")?;

    for problem in settings.validate() {
        log::warn!("{problem}");
    }

    start_server(settings).await
}

/// Start the server with process-local session and account storage
///
/// # Errors
///
/// Returns an error if:
/// - The GitHub client cannot be built from settings
/// - Server binding fails
/// - Server fails to start
async fn start_server(settings: IdlinkSettings) -> anyhow::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    let sessions: Arc<dyn SessionStore> =
        Arc::new(InMemorySessionStore::from_settings(&settings.session));
    let accounts: Arc<dyn AccountStore> = Arc::new(InMemoryAccountStore::new());
    let flow = AuthenticationServiceFactory::create_flow(&settings, sessions.clone(), accounts)
        .context("Failed to initialize GitHub login")?;

    let flow = web::Data::new(flow);
    let sessions = web::Data::from(sessions);
    let cookies = web::Data::new(CookieFactory::from_settings(&settings.session));

    HttpServer::new(move || {
        App::new()
            .app_data(flow.clone())
            .app_data(sessions.clone())
            .app_data(cookies.clone())
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {bind_address}"))?
    .run()
    .await?;
    Ok(())
}

fn print_startup_info(bind_address: &str, settings: &IdlinkSettings) {
    println!("Starting idlink {} on http://{bind_address}", idlink::VERSION);
    println!();
    println!("GitHub login endpoints:");
    println!("  GET  /auth/github/sign_in  - Redirect to GitHub");
    println!("  GET  /auth/github/callback - OAuth callback");
    println!("  GET  /auth/userinfo        - Current principal");
    println!();
    println!("OAuth callback URL to register with GitHub:");
    println!("  {}", settings.callback_url());
    println!();
    println!("System endpoints:");
    println!("  GET  /ping - Health check");
}
