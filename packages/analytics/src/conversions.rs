use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Raw identifiers supplied with a conversion report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUserData {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Body of a Google Ads conversion report.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    /// Which conversion action fired. Required.
    #[serde(default)]
    pub conversion_label: String,
    #[serde(default)]
    pub conversion_value: Option<f64>,
    #[serde(default)]
    pub user_data: Option<RawUserData>,
    #[serde(default = "default_event_name")]
    pub event_name: String,
}

fn default_event_name() -> String {
    "conversion".to_string()
}

/// SHA-256 hex digest of a normalized identifier, per Google's
/// enhanced conversions requirements.
#[must_use]
pub fn hash_identifier(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hashed identifiers for the enhanced-conversion payload. Raw values
/// never leave this process.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EnhancedUserData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl EnhancedUserData {
    /// Normalizes then hashes: emails are lowercased, phones reduced
    /// to their digits.
    #[must_use]
    pub fn from_raw(raw: &RawUserData) -> Self {
        let email = raw
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .map(|e| hash_identifier(&e));

        let phone = raw
            .phone
            .as_deref()
            .map(|p| p.chars().filter(char::is_ascii_digit).collect::<String>())
            .filter(|p| !p.is_empty())
            .map(|p| hash_identifier(&p));

        Self { email, phone }
    }

    /// Whether either identifier survived normalization.
    #[must_use]
    pub const fn has_any(&self) -> bool {
        self.email.is_some() || self.phone.is_some()
    }
}

/// Enhanced-conversion block nested in the payload.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancedConversions {
    pub user_data: EnhancedUserData,
}

/// The conversion record handed to Google Ads.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionPayload {
    pub conversion_label: String,
    pub conversion_value: f64,
    pub currency: String,
    pub event_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced_conversions: Option<EnhancedConversions>,
    pub timestamp: String,
}

impl ConversionPayload {
    /// Builds the payload, hashing any supplied identifiers.
    #[must_use]
    pub fn from_request(request: &ConversionRequest, now: DateTime<Utc>) -> Self {
        let enhanced_conversions = request
            .user_data
            .as_ref()
            .map(EnhancedUserData::from_raw)
            .filter(EnhancedUserData::has_any)
            .map(|user_data| EnhancedConversions { user_data });

        Self {
            conversion_label: request.conversion_label.clone(),
            conversion_value: request.conversion_value.unwrap_or(1.0),
            currency: "USD".to_string(),
            event_name: request.event_name.clone(),
            enhanced_conversions,
            timestamp: now.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_is_deterministic_sha256_hex() {
        assert_eq!(
            hash_identifier("test@example.com"),
            "973dfe463ec85785f5f95af5ba3906eedb2d931c24e69824a89ea65dba4e813b"
        );
        assert_eq!(hash_identifier("a").len(), 64);
    }

    #[test]
    fn email_is_lowercased_before_hashing() {
        let data = EnhancedUserData::from_raw(&RawUserData {
            email: Some("  Test@Example.COM ".to_string()),
            phone: None,
        });
        assert_eq!(
            data.email.as_deref(),
            Some(hash_identifier("test@example.com").as_str())
        );
        assert!(data.phone.is_none());
    }

    #[test]
    fn phone_is_reduced_to_digits_before_hashing() {
        let formatted = EnhancedUserData::from_raw(&RawUserData {
            email: None,
            phone: Some("(555) 123-4567".to_string()),
        });
        let bare = EnhancedUserData::from_raw(&RawUserData {
            email: None,
            phone: Some("5551234567".to_string()),
        });
        assert_eq!(formatted, bare);
        assert_eq!(
            formatted.phone.as_deref(),
            Some(hash_identifier("5551234567").as_str())
        );
    }

    #[test]
    fn blank_identifiers_produce_nothing() {
        let data = EnhancedUserData::from_raw(&RawUserData {
            email: Some("   ".to_string()),
            phone: Some("--".to_string()),
        });
        assert!(!data.has_any());
    }

    #[test]
    fn payload_applies_defaults_and_omits_empty_user_data() {
        let request: ConversionRequest =
            serde_json::from_str(r#"{"conversionLabel":"lead_submit"}"#).unwrap();
        let payload = ConversionPayload::from_request(&request, Utc::now());
        assert_eq!(payload.conversion_label, "lead_submit");
        assert!((payload.conversion_value - 1.0).abs() < f64::EPSILON);
        assert_eq!(payload.currency, "USD");
        assert_eq!(payload.event_name, "conversion");
        assert!(payload.enhanced_conversions.is_none());
    }

    #[test]
    fn serialized_payload_never_contains_raw_identifiers() {
        let request: ConversionRequest = serde_json::from_str(
            r#"{
                "conversionLabel": "lead_submit",
                "userData": {"email": "jane@example.com", "phone": "5551234567"}
            }"#,
        )
        .unwrap();
        let payload = ConversionPayload::from_request(&request, Utc::now());
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("jane@example.com"));
        assert!(!json.contains("5551234567"));
        assert!(json.contains("enhanced_conversions"));
    }
}
