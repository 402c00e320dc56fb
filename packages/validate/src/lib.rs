#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Field and step validation rules for the intake funnel.
//!
//! The same rules run in two places: step-by-step inside the wizard
//! controller (only the current step's fields) and strictly against the
//! full payload at the HTTP boundary. Each failing field maps to a single
//! human-readable message; the first violated rule per field wins.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use claim_funnel_lead_models::{AccidentReport, AccidentType, AtFault, LeadFormData, Role};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Minimum description length required by the wizard.
pub const MIN_DESCRIPTION_LEN: usize = 20;

/// Minimum injury description length required for a full lead.
pub const MIN_INJURY_DESCRIPTION_LEN: usize = 10;

static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}$").expect("invalid ZIP regex"));
static ZIP_PLUS4_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}(-\d{4})?$").expect("invalid ZIP+4 regex"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex"));
static PHONE_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10}$").expect("invalid phone regex"));
static PHONE_DASHED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}-?\d{3}-?\d{4}$").expect("invalid dashed phone regex"));

/// Map from field name to the message of the first violated rule.
pub type FieldErrors = BTreeMap<String, String>;

/// Error returned when a payload fails strict validation.
#[derive(Debug, Clone, Error, Serialize)]
#[error("validation failed for {} field(s)", errors.len())]
pub struct ValidationError {
    /// Per-field messages.
    pub errors: FieldErrors,
}

impl ValidationError {
    fn from_errors(errors: FieldErrors) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self { errors })
        }
    }
}

/// Whether `zip` is exactly five digits.
#[must_use]
pub fn is_valid_zip(zip: &str) -> bool {
    ZIP_RE.is_match(zip)
}

/// Whether `email` matches the standard loose email pattern.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Whether `phone` is exactly ten digits after stripping formatting.
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_DIGITS_RE.is_match(&claim_funnel_lead_models::phone_digits(phone))
}

/// Validates wizard step 1 (contact info: ZIP, email, phone).
#[must_use]
pub fn validate_contact(report: &AccidentReport) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if !ZIP_RE.is_match(&report.zip_code) {
        errors.insert(
            "zipCode".to_string(),
            "Please enter a valid 5-digit ZIP code".to_string(),
        );
    }
    if !EMAIL_RE.is_match(&report.email) {
        errors.insert(
            "email".to_string(),
            "Please enter a valid email address".to_string(),
        );
    }
    if !PHONE_DIGITS_RE.is_match(&report.phone_number) {
        errors.insert(
            "phoneNumber".to_string(),
            "Please enter a valid 10-digit phone number".to_string(),
        );
    }
    errors
}

/// Validates wizard step 2 (accident details).
#[must_use]
pub fn validate_details(report: &AccidentReport) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if report.accident_type.is_empty() {
        errors.insert(
            "accidentType".to_string(),
            "Please select an accident type".to_string(),
        );
    }
    if report.role.is_empty() {
        errors.insert(
            "role".to_string(),
            "Please select your role in the accident".to_string(),
        );
    }
    if report.at_fault.is_empty() {
        errors.insert(
            "atFault".to_string(),
            "Please indicate fault status".to_string(),
        );
    }
    if report.incident_date.is_empty() {
        errors.insert(
            "incidentDate".to_string(),
            "Please enter the date of the incident".to_string(),
        );
    }
    if report.medical_attention.is_empty() {
        errors.insert(
            "medicalAttention".to_string(),
            "Please indicate if you sought medical attention".to_string(),
        );
    }
    errors
}

/// Validates wizard step 3 (free-text description).
#[must_use]
pub fn validate_description(report: &AccidentReport) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if report.description.trim().is_empty()
        || report.description.chars().count() < MIN_DESCRIPTION_LEN
    {
        errors.insert(
            "description".to_string(),
            format!(
                "Please provide more details about your accident (at least {MIN_DESCRIPTION_LEN} characters)"
            ),
        );
    }
    errors
}

/// Strictly validates an [`AccidentReport`] at the HTTP boundary.
///
/// All fields are required; ZIP/email/phone additionally run their
/// pattern checks, and the enum-like string fields must parse into
/// their domain enums.
///
/// # Errors
///
/// Returns [`ValidationError`] with one message per failing field.
pub fn validate_report(report: &AccidentReport) -> Result<(), ValidationError> {
    let mut errors = FieldErrors::new();

    let required = [
        ("zipCode", report.zip_code.as_str()),
        ("email", report.email.as_str()),
        ("phoneNumber", report.phone_number.as_str()),
        ("accidentType", report.accident_type.as_str()),
        ("role", report.role.as_str()),
        ("atFault", report.at_fault.as_str()),
        ("incidentDate", report.incident_date.as_str()),
        ("medicalAttention", report.medical_attention.as_str()),
        ("description", report.description.as_str()),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.insert(field.to_string(), format!("{field} is required"));
        }
    }

    if !report.zip_code.is_empty() && !ZIP_RE.is_match(&report.zip_code) {
        errors.insert(
            "zipCode".to_string(),
            "Please enter a valid 5-digit ZIP code".to_string(),
        );
    }
    if !report.email.is_empty() && !EMAIL_RE.is_match(&report.email) {
        errors.insert(
            "email".to_string(),
            "Please enter a valid email address".to_string(),
        );
    }
    if !report.phone_number.is_empty() && !PHONE_DIGITS_RE.is_match(&report.phone_number) {
        errors.insert(
            "phoneNumber".to_string(),
            "Please enter a valid 10-digit phone number".to_string(),
        );
    }
    if !report.accident_type.is_empty() && report.accident_type.parse::<AccidentType>().is_err() {
        errors.insert(
            "accidentType".to_string(),
            "Unknown accident type".to_string(),
        );
    }
    if !report.role.is_empty() && report.role.parse::<Role>().is_err() {
        errors.insert("role".to_string(), "Unknown role".to_string());
    }
    if !report.at_fault.is_empty() && report.at_fault.parse::<AtFault>().is_err() {
        errors.insert("atFault".to_string(), "Unknown fault status".to_string());
    }

    ValidationError::from_errors(errors)
}

/// Strictly validates a full [`LeadFormData`] payload.
///
/// Enum membership is enforced by deserialization before this runs;
/// this layer checks string shapes and the consent invariant.
///
/// # Errors
///
/// Returns [`ValidationError`] with one message per failing field.
pub fn validate_lead(lead: &LeadFormData) -> Result<(), ValidationError> {
    let mut errors = FieldErrors::new();

    if lead.first_name.trim().is_empty() {
        errors.insert(
            "firstName".to_string(),
            "First name is required".to_string(),
        );
    }
    if lead.last_name.trim().is_empty() {
        errors.insert("lastName".to_string(), "Last name is required".to_string());
    }
    if !EMAIL_RE.is_match(&lead.email) {
        errors.insert(
            "email".to_string(),
            "Please enter a valid email address".to_string(),
        );
    }
    if !PHONE_DASHED_RE.is_match(&lead.phone) {
        errors.insert(
            "phone".to_string(),
            "Please enter a valid 10-digit phone number".to_string(),
        );
    }
    if lead.accident_date.trim().is_empty() {
        errors.insert(
            "accidentDate".to_string(),
            "Accident date is required".to_string(),
        );
    }
    if lead.injury_description.chars().count() < MIN_INJURY_DESCRIPTION_LEN {
        errors.insert(
            "injuryDescription".to_string(),
            format!("Please describe your injuries (at least {MIN_INJURY_DESCRIPTION_LEN} characters)"),
        );
    }
    if lead.state.trim().len() < 2 {
        errors.insert("state".to_string(), "State is required".to_string());
    }
    if lead.city.trim().is_empty() {
        errors.insert("city".to_string(), "City is required".to_string());
    }
    if !ZIP_PLUS4_RE.is_match(&lead.zip_code) {
        errors.insert(
            "zipCode".to_string(),
            "Please enter a valid ZIP code".to_string(),
        );
    }
    if !lead.consent {
        errors.insert(
            "consent".to_string(),
            "Consent is required before we can contact you".to_string(),
        );
    }

    ValidationError::from_errors(errors)
}
