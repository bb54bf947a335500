#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the civic issue reporting system.
//!
//! Serves the REST API for listing and triaging reports, the AI photo
//! classification endpoint, and the built frontend as static files.
//! Report persistence goes through the [`aura_store::ReportStore`] seam;
//! classification goes through [`aura_ai::providers::VisionProvider`].

mod handlers;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, Scope, middleware, web};
use aura_ai::providers::VisionProvider;
use aura_ai::rate_limit::RateLimiter;
use aura_store::{MemoryReportStore, ReportStore};
use std::sync::{Arc, Mutex};

/// Shared application state.
pub struct AppState {
    /// Report persistence seam.
    pub store: Arc<dyn ReportStore>,
    /// Vision provider for the analyze endpoint. `None` when no gateway
    /// credentials are configured; the endpoint then returns 503.
    pub classifier: Option<Arc<dyn VisionProvider>>,
    /// Fixed-window rate limiter for the analyze endpoint.
    pub rate_limiter: Mutex<RateLimiter>,
}

impl AppState {
    /// Creates server state over the given store and optional classifier.
    #[must_use]
    pub fn new(store: Arc<dyn ReportStore>, classifier: Option<Arc<dyn VisionProvider>>) -> Self {
        Self {
            store,
            classifier,
            rate_limiter: Mutex::new(RateLimiter::new()),
        }
    }
}

/// Builds the `/api` route table. Shared between the server binary and
/// the handler tests.
pub fn api_scope() -> Scope {
    web::scope("/api")
        .route("/health", web::get().to(handlers::health))
        .route("/categories", web::get().to(handlers::categories))
        .route("/reports", web::get().to(handlers::reports))
        .route("/reports/counts", web::get().to(handlers::report_counts))
        .route(
            "/reports/{id}/status",
            web::post().to(handlers::update_status),
        )
        .route(
            "/reports/{id}/feedback",
            web::post().to(handlers::submit_feedback),
        )
        .route("/analyze", web::post().to(handlers::analyze))
}

/// JSON extractor config sized above the 10 MB image guard, so oversized
/// payloads reach the handler and get its specific error message.
#[must_use]
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().limit(20 * 1024 * 1024)
}

/// Starts the API server.
///
/// Uses the in-memory report store (the production deployment binds the
/// store seam to its hosted database) and creates the AI vision provider
/// from environment variables when credentials are present.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let classifier: Option<Arc<dyn VisionProvider>> =
        match aura_ai::providers::create_provider_from_env() {
            Ok(provider) => Some(Arc::from(provider)),
            Err(e) => {
                log::warn!("AI classification disabled: {e}");
                None
            }
        };

    let store: Arc<dyn ReportStore> = Arc::new(MemoryReportStore::new());
    let state = web::Data::new(AppState::new(store, classifier));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .app_data(json_config())
            .service(api_scope())
            // Serve frontend static files (production)
            .service(Files::new("/", "app/dist").index_file("index.html"))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
