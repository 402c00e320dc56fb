#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the claim funnel.
//!
//! Serves the lead intake REST API: qualified lead submission with
//! best-effort CRM forwarding, the three-step accident form endpoint,
//! first-party analytics ingestion with batched third-party
//! forwarding, and Google Ads conversion reporting. Accepted leads
//! and events are held in process memory; durable storage sits behind
//! the intake pipeline, not this server.

pub mod config;
mod handlers;

use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{App, HttpServer, Scope, middleware, web};
use chrono::{DateTime, Utc};
use claim_funnel_analytics::{
    BatchConfig, EventBatcher, EventStore, ForwardEvents, ThirdPartyForwarder,
};
use claim_funnel_crm::CrmClient;
use claim_funnel_lead_models::{AccidentReport, LeadFormData};
use claim_funnel_notify::{EmailNotifier, Notifier, SmsNotifier};
use claim_funnel_scoring::CaseValue;

use crate::config::ServerConfig;

/// A qualified lead accepted by `POST /api/submit-lead`.
#[derive(Debug, Clone)]
pub struct AcceptedLead {
    pub lead_id: String,
    pub score: u8,
    pub received_at: DateTime<Utc>,
    pub lead: LeadFormData,
}

/// An accident report accepted by `POST /api/submit-accident-form`.
#[derive(Debug, Clone)]
pub struct AcceptedReport {
    pub lead_id: String,
    pub estimated_value: CaseValue,
    pub received_at: DateTime<Utc>,
    pub report: AccidentReport,
}

/// Shared application state.
pub struct AppState {
    /// First-party analytics event log.
    pub events: Arc<EventStore>,
    /// Background third-party forwarder, when any destination is
    /// configured.
    pub batcher: Option<Arc<EventBatcher>>,
    /// Accepted qualified leads, newest last.
    pub leads: Mutex<Vec<AcceptedLead>>,
    /// Accepted accident reports, newest last.
    pub reports: Mutex<Vec<AcceptedReport>>,
    /// CRM client, when credentials are configured.
    pub crm: Option<CrmClient>,
    /// Email channel for lead notifications.
    pub email: Option<Arc<dyn Notifier>>,
    /// SMS channel for high-score alerts.
    pub sms: Option<Arc<dyn Notifier>>,
}

/// Builds the shared state from a configuration.
///
/// Spawns the analytics batch task when forwarding is configured, so
/// this must run inside an async runtime.
#[must_use]
pub fn build_state(config: ServerConfig) -> web::Data<AppState> {
    let forwarder = ThirdPartyForwarder::new(config.ga, config.fb);
    let batcher = if forwarder.is_active() {
        Some(Arc::new(EventBatcher::spawn(
            Arc::new(forwarder) as Arc<dyn ForwardEvents>,
            BatchConfig::default(),
        )))
    } else {
        None
    };

    web::Data::new(AppState {
        events: Arc::new(EventStore::new()),
        batcher,
        leads: Mutex::new(Vec::new()),
        reports: Mutex::new(Vec::new()),
        crm: config.crm.map(CrmClient::new),
        email: config
            .notification_email
            .map(|r| Arc::new(EmailNotifier::new(r)) as Arc<dyn Notifier>),
        sms: config
            .sms_alert_number
            .map(|r| Arc::new(SmsNotifier::new(r)) as Arc<dyn Notifier>),
    })
}

/// The `/api` route tree.
pub fn api_scope() -> Scope {
    web::scope("/api")
        .route("/health", web::get().to(handlers::health))
        .route("/submit-lead", web::post().to(handlers::submit_lead))
        .route(
            "/submit-accident-form",
            web::post().to(handlers::submit_accident_form),
        )
        .route("/analytics", web::get().to(handlers::analytics_query))
        .route("/analytics", web::post().to(handlers::analytics_ingest))
        .route(
            "/google-ads-conversion",
            web::get().to(handlers::google_ads_status),
        )
        .route(
            "/google-ads-conversion",
            web::post().to(handlers::google_ads_conversion),
        )
        .route(
            "/claim-connectors/test",
            web::get().to(handlers::crm_test),
        )
}

/// Starts the claim funnel API server.
///
/// Reads configuration from the environment, builds the shared state,
/// and runs the Actix-Web HTTP server. This is a regular async
/// function: the caller provides the runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to
/// bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();
    let bind_addr = config.bind_addr.clone();
    let port = config.port;

    log::info!(
        "Integrations: crm={} ga={} fb={} email={} sms={}",
        config.crm.is_some(),
        config.ga.is_some(),
        config.fb.is_some(),
        config.notification_email.is_some(),
        config.sms_alert_number.is_some(),
    );

    let state = build_state(config);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(api_scope())
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
