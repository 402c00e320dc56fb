#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Claim Connectors CRM lead forwarding client.
//!
//! Forwarding is strictly best-effort: a validated lead is already
//! accepted by the time this client runs, and nothing the CRM does may
//! flip that acceptance. Failures are captured in [`CrmOutcome`] and
//! reported inside the API response body, never as an HTTP error.

use claim_funnel_lead_models::{AccidentType, LeadFormData, format_phone};
use serde::{Deserialize, Serialize};

/// CRM connection settings, supplied via configuration.
#[derive(Debug, Clone)]
pub struct CrmConfig {
    /// Lead ingestion endpoint URL.
    pub endpoint: String,
    /// API key sent as `X-API-Key`.
    pub api_key: String,
    /// Vendor code identifying this publisher.
    pub vendor_code: String,
    /// Tracking ID for this placement.
    pub tracking_id: String,
}

/// The wire payload Claim Connectors ingests.
#[derive(Debug, Clone, Serialize)]
struct CrmLead<'a> {
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    phone_home: String,
    state: &'a str,
    incident_type: &'static str,
    vendor_code: &'a str,
    tracking_id: &'a str,
}

/// Result of one forwarding attempt, reported verbatim in the API
/// response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmOutcome {
    /// Whether the CRM accepted the lead.
    pub success: bool,
    /// The CRM's own lead identifier, when accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crm_lead_id: Option<String>,
    /// Failure description, when rejected or unreachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrmOutcome {
    /// An unsuccessful outcome carrying a failure description.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            crm_lead_id: None,
            error: Some(error.into()),
        }
    }
}

/// Maps our accident taxonomy onto the incident types the CRM accepts.
#[must_use]
pub const fn incident_type(accident_type: AccidentType) -> &'static str {
    match accident_type {
        AccidentType::CarAccident
        | AccidentType::TruckAccident
        | AccidentType::MotorcycleAccident
        | AccidentType::PedestrianAccident
        | AccidentType::Other => "auto_accident",
        AccidentType::SlipAndFall => "slip_and_fall",
        AccidentType::WorkplaceAccident => "workplace_injury",
        AccidentType::MedicalMalpractice => "medical_malpractice",
        AccidentType::ProductLiability => "product_liability",
    }
}

/// Claim Connectors API client.
pub struct CrmClient {
    config: CrmConfig,
    client: reqwest::Client,
}

impl CrmClient {
    /// Creates a client from connection settings.
    #[must_use]
    pub fn new(config: CrmConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Forwards a validated lead to the CRM.
    ///
    /// Never returns an error: any failure is folded into the returned
    /// [`CrmOutcome`] so the caller's acceptance path is unaffected.
    pub async fn submit_lead(&self, lead: &LeadFormData) -> CrmOutcome {
        let payload = CrmLead {
            first_name: &lead.first_name,
            last_name: &lead.last_name,
            email: &lead.email,
            phone_home: format_phone(&lead.phone),
            state: &lead.state,
            incident_type: incident_type(lead.accident_type),
            vendor_code: &self.config.vendor_code,
            tracking_id: &self.config.tracking_id,
        };

        log::info!(
            "Forwarding lead to CRM: incident_type={} state={} vendor_code={}",
            payload.incident_type,
            payload.state,
            payload.vendor_code,
        );

        let response = match self
            .client
            .post(&self.config.endpoint)
            .header("X-API-Key", &self.config.api_key)
            .header("X-Vendor-Code", &self.config.vendor_code)
            .header("X-Tracking-ID", &self.config.tracking_id)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::error!("CRM request failed: {e}");
                return CrmOutcome::failure("CRM submission failed");
            }
        };

        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or_default();

        if !status.is_success() {
            log::warn!("CRM rejected lead: status={status} body={body}");
            return CrmOutcome::failure(format!("API request failed: {status}"));
        }

        let crm_lead_id = body["id"]
            .as_str()
            .or_else(|| body["leadId"].as_str())
            .unwrap_or("unknown")
            .to_string();
        log::info!("Lead accepted by CRM: {crm_lead_id}");

        CrmOutcome {
            success: true,
            crm_lead_id: Some(crm_lead_id),
            error: None,
        }
    }

    /// Verifies connectivity by submitting a fixed test lead.
    pub async fn test_connection(&self) -> CrmOutcome {
        let test_lead = LeadFormData {
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: "test@example.com".to_string(),
            phone: "5551234567".to_string(),
            accident_type: AccidentType::CarAccident,
            accident_date: String::new(),
            injury_description: String::new(),
            medical_treatment: false,
            property_damage: false,
            state: "CA".to_string(),
            city: String::new(),
            zip_code: String::new(),
            has_attorney: false,
            police_report: false,
            insurance_claim: false,
            message: None,
            consent: true,
            source: None,
            utm: None,
        };
        self.submit_lead(&test_lead).await
    }
}
