//! Environment-driven server configuration.
//!
//! Integrations are capability-gated: each block is `Some` only when
//! its required variables are set, and the server runs fine with none
//! of them configured.

use claim_funnel_analytics::{FbConfig, GaConfig};
use claim_funnel_crm::CrmConfig;

/// Everything the server reads from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Google Analytics Measurement Protocol forwarding.
    pub ga: Option<GaConfig>,
    /// Facebook Conversions API forwarding.
    pub fb: Option<FbConfig>,
    /// Claim Connectors CRM forwarding.
    pub crm: Option<CrmConfig>,
    /// Recipient for lead summary emails. Requires the email service
    /// key to also be set.
    pub notification_email: Option<String>,
    /// Recipient for high-score SMS alerts.
    pub sms_alert_number: Option<String>,
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ServerConfig {
    /// Reads the configuration from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let ga = env_opt("GA_MEASUREMENT_ID").map(|measurement_id| GaConfig { measurement_id });

        let fb = match (env_opt("FB_PIXEL_ID"), env_opt("FB_CONVERSIONS_API_TOKEN")) {
            (Some(pixel_id), Some(access_token)) => Some(FbConfig {
                pixel_id,
                access_token,
            }),
            _ => None,
        };

        let crm = match (env_opt("CRM_ENDPOINT"), env_opt("CRM_API_KEY")) {
            (Some(endpoint), Some(api_key)) => Some(CrmConfig {
                endpoint,
                api_key,
                vendor_code: env_opt("CRM_VENDOR_CODE").unwrap_or_default(),
                tracking_id: env_opt("CRM_TRACKING_ID").unwrap_or_default(),
            }),
            _ => None,
        };

        Self {
            bind_addr: env_opt("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: env_opt("PORT").and_then(|p| p.parse().ok()).unwrap_or(8080),
            ga,
            fb,
            crm,
            notification_email: env_opt("EMAIL_SERVICE_API_KEY")
                .and(env_opt("NOTIFICATION_EMAIL")),
            sms_alert_number: env_opt("SMS_ALERT_NUMBER"),
        }
    }

    /// A configuration with no integrations, used by tests.
    #[must_use]
    pub fn bare() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            ga: None,
            fb: None,
            crm: None,
            notification_email: None,
            sms_alert_number: None,
        }
    }
}
