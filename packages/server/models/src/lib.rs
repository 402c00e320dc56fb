#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the claim funnel server.
//!
//! These types are serialized to JSON for the REST API. They are
//! separate from the domain types so the API contract can evolve
//! independently of the intake pipeline.

use chrono::Utc;
use claim_funnel_analytics::{ConversionPayload, EventSummary, TrackingEvent};
use claim_funnel_crm::CrmOutcome;
use serde::{Deserialize, Serialize};

/// API contract version reported in every response envelope.
pub const API_VERSION: &str = "1.0.0";

/// Standard response envelope wrapping every JSON endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the request was accepted.
    pub success: bool,
    /// Endpoint-specific payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Machine-readable error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    /// Per-response metadata.
    pub metadata: ResponseMetadata,
}

/// Error block in the response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Stable error code, e.g. `VALIDATION_ERROR`.
    pub code: String,
    /// Human-readable description.
    pub message: String,
    /// Structured detail, e.g. a field-to-message map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Metadata attached to every response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Server time the response was produced (ISO 8601).
    pub timestamp: String,
    /// Unique id for tracing this request in logs.
    pub request_id: String,
    /// API contract version.
    pub version: String,
}

impl ResponseMetadata {
    #[must_use]
    pub fn generate() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            request_id: uuid::Uuid::new_v4().to_string(),
            version: API_VERSION.to_string(),
        }
    }
}

impl<T> ApiResponse<T> {
    /// Successful envelope around `data`.
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: ResponseMetadata::generate(),
        }
    }

    /// Failure envelope with an error block.
    #[must_use]
    pub fn failure(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
                details,
            }),
            metadata: ResponseMetadata::generate(),
        }
    }
}

/// Payload for an accepted qualified lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmissionData {
    /// Server-assigned lead identifier.
    pub lead_id: String,
    /// Confirmation message for the visitor.
    pub message: String,
    /// Computed lead quality score, 0-100.
    pub lead_score: u8,
    /// Outcome of the best-effort CRM forward, when attempted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crm_submission: Option<CrmOutcome>,
}

/// Response body for the accident intake form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccidentFormResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_contact_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<Vec<String>>,
}

/// Query parameters for `GET /api/analytics`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQueryParams {
    pub session_id: Option<String>,
    pub category: Option<String>,
    pub limit: Option<usize>,
}

/// Payload for `GET /api/analytics`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQueryData {
    pub events: Vec<TrackingEvent>,
    pub summary: EventSummary,
}

/// Payload acknowledging an ingested analytics batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsIngestData {
    /// Events that passed validation and were stored.
    pub processed: usize,
    /// Events that failed validation.
    pub failed: usize,
    /// Per-event failure details, when any failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<serde_json::Value>>,
}

/// Response body for a tracked Google Ads conversion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    pub status: String,
    pub message: String,
    pub conversion_data: ConversionPayload,
}

/// Health check payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    pub healthy: bool,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_carries_data_and_metadata() {
        let response = ApiResponse::ok(AnalyticsIngestData {
            processed: 2,
            failed: 0,
            errors: None,
        });
        assert!(response.success);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"]["processed"], 2);
        assert!(json["data"].get("errors").is_none());
        assert!(json.get("error").is_none());
        assert_eq!(json["metadata"]["version"], API_VERSION);
        assert!(json["metadata"]["requestId"].as_str().is_some());
    }

    #[test]
    fn failure_envelope_carries_the_error_block() {
        let response: ApiResponse<AnalyticsIngestData> = ApiResponse::failure(
            "VALIDATION_ERROR",
            "Invalid lead data",
            Some(serde_json::json!({"email": "Invalid email format"})),
        );
        assert!(!response.success);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["details"]["email"], "Invalid email format");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn lead_submission_serializes_camel_case() {
        let data = LeadSubmissionData {
            lead_id: "lead-1".to_string(),
            message: "ok".to_string(),
            lead_score: 80,
            crm_submission: None,
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["leadId"], "lead-1");
        assert_eq!(json["leadScore"], 80);
        assert!(json.get("crmSubmission").is_none());
    }
}
