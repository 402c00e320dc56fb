#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Deterministic lead scoring and case value estimation.
//!
//! The score is a 0-100 triage heuristic computed server-side once a lead
//! validates. It decides whether the SMS alert fires; it never decides
//! whether the lead is accepted.

use chrono::{DateTime, NaiveDate, Utc};
use claim_funnel_lead_models::{AccidentReport, AccidentType, LeadFormData};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Maximum possible lead score.
pub const MAX_SCORE: u8 = 100;

/// Leads scoring above this threshold trigger the SMS alert.
pub const SMS_ALERT_THRESHOLD: u8 = 70;

/// Rough case value tier shown to intake staff.
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
pub enum CaseValue {
    /// Baseline case.
    Standard,
    /// Medical attention was sought.
    High,
    /// Truck, malpractice, or product liability case.
    Premium,
}

/// Computes the triage score for a validated lead.
///
/// Points: 30 for high-value accident types, 20 otherwise; +20 medical
/// treatment; +10 property damage; +10 police report; +20 if the accident
/// was within the last 7 days or +10 within 30; +20 if no attorney is
/// retained yet. Clamped to [`MAX_SCORE`].
#[must_use]
pub fn lead_score(lead: &LeadFormData, now: DateTime<Utc>) -> u8 {
    let mut score: u32 = if lead.accident_type.is_high_value() {
        30
    } else {
        20
    };

    if lead.medical_treatment {
        score += 20;
    }
    if lead.property_damage {
        score += 10;
    }
    if lead.police_report {
        score += 10;
    }

    if let Some(days) = days_since_accident(&lead.accident_date, now) {
        if days < 7 {
            score += 20;
        } else if days < 30 {
            score += 10;
        }
    }

    if !lead.has_attorney {
        score += 20;
    }

    u8::try_from(score.min(u32::from(MAX_SCORE))).unwrap_or(MAX_SCORE)
}

/// Estimates the case value tier for a wizard submission.
///
/// Mirrors the intake desk's manual triage: any case with medical
/// attention is at least High, and the named premium categories win
/// regardless.
#[must_use]
pub fn estimated_case_value(report: &AccidentReport) -> CaseValue {
    let premium = matches!(
        report.accident_type.parse::<AccidentType>(),
        Ok(AccidentType::TruckAccident
            | AccidentType::MedicalMalpractice
            | AccidentType::ProductLiability)
    );
    if premium {
        CaseValue::Premium
    } else if report.medical_attention == "yes" {
        CaseValue::High
    } else {
        CaseValue::Standard
    }
}

/// Whole days elapsed since the accident date, or `None` if the date
/// does not parse as `YYYY-MM-DD` or lies in the future.
fn days_since_accident(date: &str, now: DateTime<Utc>) -> Option<i64> {
    let accident = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let days = (now.date_naive() - accident).num_days();
    (days >= 0).then_some(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn base_lead() -> LeadFormData {
        LeadFormData {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "555-123-4567".to_string(),
            accident_type: AccidentType::CarAccident,
            accident_date: "2024-06-01".to_string(),
            injury_description: "Whiplash".to_string(),
            medical_treatment: false,
            property_damage: false,
            state: "CA".to_string(),
            city: "Los Angeles".to_string(),
            zip_code: "90210".to_string(),
            has_attorney: true,
            police_report: false,
            insurance_claim: false,
            message: None,
            consent: true,
            source: None,
            utm: None,
        }
    }

    fn at(date: &str) -> DateTime<Utc> {
        Utc.from_utc_datetime(
            &NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn minimal_lead_scores_base_points() {
        // Old accident, attorney retained, nothing else: just the type bonus.
        let score = lead_score(&base_lead(), at("2025-06-01"));
        assert_eq!(score, 20);
    }

    #[test]
    fn maximal_lead_clamps_to_100() {
        let lead = LeadFormData {
            accident_type: AccidentType::TruckAccident,
            medical_treatment: true,
            property_damage: true,
            police_report: true,
            accident_date: "2024-06-01".to_string(),
            has_attorney: false,
            ..base_lead()
        };
        // 30 + 20 + 10 + 10 + 20 + 20 = 110, clamped.
        assert_eq!(lead_score(&lead, at("2024-06-01")), MAX_SCORE);
    }

    #[test]
    fn recency_bonus_tiers() {
        let mut lead = base_lead();
        lead.accident_date = "2024-06-01".to_string();
        assert_eq!(lead_score(&lead, at("2024-06-05")), 40); // < 7 days
        assert_eq!(lead_score(&lead, at("2024-06-20")), 30); // < 30 days
        assert_eq!(lead_score(&lead, at("2024-08-01")), 20); // beyond
    }

    #[test]
    fn unparseable_date_earns_no_recency_bonus() {
        let mut lead = base_lead();
        lead.accident_date = "last tuesday".to_string();
        assert_eq!(lead_score(&lead, at("2024-06-05")), 20);
    }

    #[test]
    fn score_stays_in_range() {
        for accident_type in AccidentType::all() {
            for medical in [false, true] {
                for attorney in [false, true] {
                    let lead = LeadFormData {
                        accident_type: *accident_type,
                        medical_treatment: medical,
                        property_damage: medical,
                        police_report: medical,
                        has_attorney: attorney,
                        accident_date: "2024-06-01".to_string(),
                        ..base_lead()
                    };
                    let score = lead_score(&lead, at("2024-06-02"));
                    assert!(score <= MAX_SCORE);
                }
            }
        }
    }

    #[test]
    fn case_value_tiers() {
        let mut report = AccidentReport {
            accident_type: "car_accident".to_string(),
            medical_attention: "no".to_string(),
            ..AccidentReport::default()
        };
        assert_eq!(estimated_case_value(&report), CaseValue::Standard);

        report.medical_attention = "yes".to_string();
        assert_eq!(estimated_case_value(&report), CaseValue::High);

        report.accident_type = "truck_accident".to_string();
        assert_eq!(estimated_case_value(&report), CaseValue::Premium);
    }
}
