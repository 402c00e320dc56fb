#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Lead and accident intake domain types.
//!
//! This crate defines the canonical lead shapes shared across the funnel:
//! the full [`LeadFormData`] record accepted by the lead endpoint, the
//! three-step wizard payload [`AccidentReport`], and the attribution
//! parameters that travel with both.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Accident categories offered by the intake form.
///
/// Wire names match the values the marketing site has always sent
/// (`car_accident`, `slip_and_fall`, ...), so stored leads and ad-platform
/// events stay comparable across deployments.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccidentType {
    /// Passenger vehicle collision
    CarAccident,
    /// Commercial truck collision
    TruckAccident,
    /// Motorcycle collision
    MotorcycleAccident,
    /// Vehicle striking a pedestrian
    PedestrianAccident,
    /// Premises liability slip-and-fall
    SlipAndFall,
    /// Injury on the job
    WorkplaceAccident,
    /// Medical malpractice
    MedicalMalpractice,
    /// Defective product injury
    ProductLiability,
    /// Anything not covered above
    Other,
}

impl AccidentType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::CarAccident,
            Self::TruckAccident,
            Self::MotorcycleAccident,
            Self::PedestrianAccident,
            Self::SlipAndFall,
            Self::WorkplaceAccident,
            Self::MedicalMalpractice,
            Self::ProductLiability,
            Self::Other,
        ]
    }

    /// Whether this category historically produces high-value cases.
    #[must_use]
    pub const fn is_high_value(self) -> bool {
        matches!(
            self,
            Self::TruckAccident | Self::MotorcycleAccident | Self::MedicalMalpractice
        )
    }
}

/// The visitor's role in the accident (wizard step 2).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    /// Driving one of the involved vehicles
    Driver,
    /// Riding in one of the involved vehicles
    Passenger,
    /// Riding in an Uber/Lyft at the time
    RideshareCustomer,
    /// On foot
    Pedestrian,
}

/// Self-reported fault status (wizard step 2).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AtFault {
    /// The visitor was at fault
    Yes,
    /// The visitor was not at fault
    No,
    /// Fault has not been determined
    Unsure,
}

/// UTM and ad click identifiers captured from the landing URL.
///
/// Every field is optional; an all-`None` value means the visit was
/// direct. First-touch semantics are enforced by the attribution crate,
/// not here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtmParams {
    /// Campaign source (`utm_source`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    /// Campaign medium (`utm_medium`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    /// Campaign name (`utm_campaign`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    /// Paid keyword (`utm_term`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_term: Option<String>,
    /// Ad variant (`utm_content`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,
    /// Google Ads click ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gclid: Option<String>,
    /// Facebook click ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbclid: Option<String>,
    /// Microsoft Advertising click ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msclkid: Option<String>,
}

impl UtmParams {
    /// Returns `true` when no parameter was captured at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.utm_source.is_none()
            && self.utm_medium.is_none()
            && self.utm_campaign.is_none()
            && self.utm_term.is_none()
            && self.utm_content.is_none()
            && self.gclid.is_none()
            && self.fbclid.is_none()
            && self.msclkid.is_none()
    }
}

/// The full intake record accepted by `POST /api/submit-lead`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadFormData {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone, `ddd-ddd-dddd` or bare 10 digits.
    pub phone: String,
    /// Accident category.
    pub accident_type: AccidentType,
    /// When the accident happened (ISO 8601 date).
    pub accident_date: String,
    /// Free-text injury description.
    pub injury_description: String,
    /// Whether medical treatment was sought.
    pub medical_treatment: bool,
    /// Whether property was damaged.
    pub property_damage: bool,
    /// State abbreviation.
    pub state: String,
    /// City.
    pub city: String,
    /// ZIP code, `ddddd` or `ddddd-dddd`.
    pub zip_code: String,
    /// Whether the visitor already retained an attorney.
    pub has_attorney: bool,
    /// Whether a police report was filed.
    pub police_report: bool,
    /// Whether an insurance claim was filed.
    pub insurance_claim: bool,
    /// Optional free-text message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Contact consent. Must be `true` before a lead is accepted.
    pub consent: bool,
    /// Where the lead came from (defaults to `website`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Attribution captured on the landing page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm: Option<UtmParams>,
}

/// The three-step wizard payload accepted by
/// `POST /api/submit-accident-form`.
///
/// String fields default to empty so a draft can be persisted and
/// restored while partially filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccidentReport {
    /// ZIP code (step 1).
    #[serde(default)]
    pub zip_code: String,
    /// Contact email (step 1).
    #[serde(default)]
    pub email: String,
    /// Contact phone as bare digits (step 1).
    #[serde(default)]
    pub phone_number: String,
    /// Accident category (step 2).
    #[serde(default)]
    pub accident_type: String,
    /// The visitor's role (step 2).
    #[serde(default)]
    pub role: String,
    /// Self-reported fault status (step 2).
    #[serde(default)]
    pub at_fault: String,
    /// Incident date (step 2).
    #[serde(default)]
    pub incident_date: String,
    /// Whether medical attention was sought, `yes`/`no` (step 2).
    #[serde(default)]
    pub medical_attention: String,
    /// Free-text description (step 3).
    #[serde(default)]
    pub description: String,
}

/// Strips everything but ASCII digits from a phone input.
#[must_use]
pub fn phone_digits(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Formats a phone number for display as `(ddd) ddd-dddd`.
///
/// Partial inputs format progressively so the wizard can format while
/// the visitor types. Formatting an already-formatted number yields the
/// same result: the formatter only looks at the digits.
#[must_use]
pub fn format_phone(input: &str) -> String {
    let digits = phone_digits(input);
    match digits.len() {
        0..=3 => digits,
        4..=6 => format!("({}) {}", &digits[..3], &digits[3..]),
        _ => {
            let digits = &digits[..10.min(digits.len())];
            format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
        }
    }
}
