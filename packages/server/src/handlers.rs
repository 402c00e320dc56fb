//! HTTP handler functions for the claim funnel API.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use claim_funnel_analytics::{
    ConversionPayload, ConversionRequest, EventSummary, RequestContext, TrackingEvent,
};
use claim_funnel_crm::CrmOutcome;
use claim_funnel_lead_models::{AccidentReport, LeadFormData, format_phone};
use claim_funnel_notify::{Notifier, dispatch_all};
use claim_funnel_scoring::{SMS_ALERT_THRESHOLD, estimated_case_value, lead_score};
use claim_funnel_server_models::{
    AccidentFormResponse, AnalyticsIngestData, AnalyticsQueryData, AnalyticsQueryParams,
    ApiHealth, ApiResponse, ConversionResponse, LeadSubmissionData,
};
use claim_funnel_validate::{is_valid_email, is_valid_phone, is_valid_zip, validate_lead};
use std::sync::Arc;

use crate::{AcceptedLead, AcceptedReport, AppState};

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/submit-lead`
///
/// Accepts a qualified lead. Acceptance is decided by validation
/// alone: the CRM forward, notifications, and scoring all run after
/// the decision and cannot turn a 201 into an error.
pub async fn submit_lead(state: web::Data<AppState>, body: web::Json<serde_json::Value>) -> HttpResponse {
    let lead: LeadFormData = match serde_json::from_value(body.into_inner()) {
        Ok(lead) => lead,
        Err(e) => {
            return HttpResponse::BadRequest().json(ApiResponse::<LeadSubmissionData>::failure(
                "VALIDATION_ERROR",
                "Invalid form data",
                Some(serde_json::json!({ "body": e.to_string() })),
            ));
        }
    };

    if let Err(e) = validate_lead(&lead) {
        return HttpResponse::BadRequest().json(ApiResponse::<LeadSubmissionData>::failure(
            "VALIDATION_ERROR",
            "Invalid form data",
            serde_json::to_value(&e.errors).ok(),
        ));
    }

    let now = Utc::now();
    let score = lead_score(&lead, now);
    let lead_id = format!(
        "lead_{}_{}",
        now.timestamp_millis(),
        &uuid::Uuid::new_v4().simple().to_string()[..9]
    );

    state
        .leads
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .push(AcceptedLead {
            lead_id: lead_id.clone(),
            score,
            received_at: now,
            lead: lead.clone(),
        });
    log::info!("Accepted lead {lead_id} with score {score}");

    // Best-effort: the client never fails, it reports an outcome.
    let crm_submission = match &state.crm {
        Some(client) => Some(client.submit_lead(&lead).await),
        None => None,
    };

    let crm_ok = crm_submission.as_ref().is_none_or(|o| o.success);
    let message = if crm_ok {
        "Thank you for your submission. We will contact you within 24 hours.".to_string()
    } else {
        "Thank you for your submission. We will contact you within 24 hours. \
         (Note: CRM submission had issues but your lead was saved successfully)"
            .to_string()
    };

    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();
    if let Some(email) = &state.email {
        notifiers.push(Arc::clone(email));
    }
    if score > SMS_ALERT_THRESHOLD {
        if let Some(sms) = &state.sms {
            notifiers.push(Arc::clone(sms));
        }
    }
    dispatch_all(&notifiers, &lead);

    HttpResponse::Created().json(ApiResponse::ok(LeadSubmissionData {
        lead_id,
        message,
        lead_score: score,
        crm_submission,
    }))
}

/// `POST /api/submit-accident-form`
///
/// Accepts the three-step accident form. Checks run in a fixed order
/// and the first failure is returned as a single `error` message.
pub async fn submit_accident_form(
    state: web::Data<AppState>,
    body: web::Json<AccidentReport>,
    req: HttpRequest,
) -> HttpResponse {
    let report = body.into_inner();

    let required = [
        report.zip_code.as_str(),
        report.email.as_str(),
        report.phone_number.as_str(),
        report.accident_type.as_str(),
        report.role.as_str(),
        report.at_fault.as_str(),
        report.incident_date.as_str(),
        report.medical_attention.as_str(),
        report.description.as_str(),
    ];
    if required.iter().any(|v| v.trim().is_empty()) {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "All fields are required" }));
    }
    if !is_valid_zip(&report.zip_code) {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "Please enter a valid 5-digit ZIP code" }));
    }
    if !is_valid_email(&report.email) {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "Please enter a valid email address" }));
    }
    if !is_valid_phone(&report.phone_number) {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "Please enter a valid 10-digit phone number" }));
    }

    let now = Utc::now();
    let estimated_value = estimated_case_value(&report);
    let lead_id = format!("ACC-{}-{}", now.timestamp_millis(), report.zip_code);

    let ctx = request_context(&req);
    log::info!(
        "Accident form submission {lead_id}: type={} value={estimated_value:?} phone={} ip={} ua={}",
        report.accident_type,
        format_phone(&report.phone_number),
        ctx.ip.as_deref().unwrap_or("unknown"),
        ctx.user_agent.as_deref().unwrap_or("unknown"),
    );

    state
        .reports
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .push(AcceptedReport {
            lead_id: lead_id.clone(),
            estimated_value,
            received_at: now,
            report,
        });

    HttpResponse::Ok().json(AccidentFormResponse {
        success: true,
        message: "Form submitted successfully".to_string(),
        lead_id: Some(lead_id),
        estimated_contact_time: Some("24 hours".to_string()),
        next_steps: Some(vec![
            "A case manager will review your information".to_string(),
            "You will receive a call within 24 hours".to_string(),
            "We will connect you with a qualified attorney in your area".to_string(),
        ]),
    })
}

fn request_context(req: &HttpRequest) -> RequestContext {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    RequestContext {
        ip: header("x-forwarded-for").or_else(|| header("x-real-ip")),
        user_agent: header("user-agent"),
        referer: header("referer"),
    }
}

/// `POST /api/analytics`
///
/// Ingests a single event or an array of events. Valid events are
/// stored and queued for forwarding; invalid ones are reported back
/// without failing the batch unless nothing was valid.
pub async fn analytics_ingest(
    state: web::Data<AppState>,
    body: web::Json<serde_json::Value>,
    req: HttpRequest,
) -> HttpResponse {
    let raw = match body.into_inner() {
        serde_json::Value::Array(events) => events,
        other => vec![other],
    };

    let ctx = request_context(&req);
    let now = Utc::now();
    let mut processed = 0_usize;
    let mut errors = Vec::new();

    for value in raw {
        let parsed = serde_json::from_value::<TrackingEvent>(value.clone())
            .map_err(|e| e.to_string())
            .and_then(|event| {
                event
                    .validate()
                    .map(|()| event)
                    .map_err(|e| e.to_string())
            });
        match parsed {
            Ok(mut event) => {
                event.enrich(&ctx, now);
                if let Some(batcher) = &state.batcher {
                    if let Err(e) = batcher.enqueue(event.clone()) {
                        log::warn!("Dropping event for forwarding: {e}");
                    }
                }
                state.events.push(event);
                processed += 1;
            }
            Err(error) => {
                errors.push(serde_json::json!({ "event": value, "error": error }));
            }
        }
    }

    if processed == 0 && !errors.is_empty() {
        return HttpResponse::BadRequest().json(ApiResponse::<AnalyticsIngestData>::failure(
            "VALIDATION_ERROR",
            "All events failed validation",
            Some(serde_json::Value::Array(errors)),
        ));
    }

    let failed = errors.len();
    HttpResponse::Ok().json(ApiResponse::ok(AnalyticsIngestData {
        processed,
        failed,
        errors: if errors.is_empty() {
            None
        } else {
            Some(errors)
        },
    }))
}

/// `GET /api/analytics`
///
/// Returns stored events, newest first, with summary statistics over
/// the returned page.
pub async fn analytics_query(
    state: web::Data<AppState>,
    params: web::Query<AnalyticsQueryParams>,
) -> HttpResponse {
    let events = state.events.query(
        params.session_id.as_deref(),
        params.category.as_deref(),
        params.limit.unwrap_or(100),
    );
    let summary = EventSummary::from_events(&events);

    HttpResponse::Ok().json(ApiResponse::ok(AnalyticsQueryData { events, summary }))
}

/// `GET /api/google-ads-conversion`
pub async fn google_ads_status() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "message": "Google Ads conversion tracking API is active",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// `POST /api/google-ads-conversion`
///
/// Builds the enhanced-conversion record, hashing any identifiers.
/// Raw identifiers never appear in the response or logs.
pub async fn google_ads_conversion(body: web::Json<ConversionRequest>) -> HttpResponse {
    let request = body.into_inner();
    if request.conversion_label.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({ "error": "Conversion label is required" }));
    }

    let payload = ConversionPayload::from_request(&request, Utc::now());
    log::info!(
        "Google Ads conversion: label={} value={} enhanced={}",
        payload.conversion_label,
        payload.conversion_value,
        payload.enhanced_conversions.is_some(),
    );

    HttpResponse::Ok().json(ConversionResponse {
        status: "success".to_string(),
        message: "Conversion tracked successfully".to_string(),
        conversion_data: payload,
    })
}

/// `GET /api/claim-connectors/test`
///
/// Verifies CRM connectivity and credentials by submitting a fixed
/// test lead.
pub async fn crm_test(state: web::Data<AppState>) -> HttpResponse {
    let connection = match &state.crm {
        Some(client) => client.test_connection().await,
        None => CrmOutcome::failure("CRM integration is not configured"),
    };

    HttpResponse::Ok().json(serde_json::json!({
        "service": "claim-connectors-test",
        "timestamp": Utc::now().to_rfc3339(),
        "connection": connection,
    }))
}
