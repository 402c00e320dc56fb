#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Best-effort email and SMS lead notifications.
//!
//! Notifications are send-and-forget: the lead is already accepted when
//! they fire, so a failing channel is logged server-side and never
//! surfaced to the visitor. Real delivery services plug in behind the
//! [`Notifier`] trait; without credentials the implementations render
//! and log the notification instead.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use claim_funnel_lead_models::LeadFormData;
use thiserror::Error;

/// Errors from a notification channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The channel rejected or failed to deliver the notification.
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// A single notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logging.
    fn channel(&self) -> &'static str;

    /// Sends a notification for a freshly accepted lead.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if delivery fails.
    async fn notify(&self, lead: &LeadFormData) -> Result<(), NotifyError>;
}

/// Email channel. Without a configured delivery service this renders
/// the message and logs it, preserving the intake team's visibility in
/// development environments.
pub struct EmailNotifier {
    recipient: String,
}

impl EmailNotifier {
    /// Creates an email notifier targeting `recipient`.
    #[must_use]
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
        }
    }
}

/// Renders the intake team's lead summary email body.
#[must_use]
pub fn render_lead_email(lead: &LeadFormData) -> String {
    let yes_no = |flag: bool| if flag { "Yes" } else { "No" };

    let mut body = String::new();
    let _ = writeln!(body, "New Lead Submission");
    let _ = writeln!(body, "Name: {} {}", lead.first_name, lead.last_name);
    let _ = writeln!(body, "Email: {}", lead.email);
    let _ = writeln!(body, "Phone: {}", lead.phone);
    let _ = writeln!(body, "Accident Type: {}", lead.accident_type);
    let _ = writeln!(body, "Accident Date: {}", lead.accident_date);
    let _ = writeln!(
        body,
        "Location: {}, {} {}",
        lead.city, lead.state, lead.zip_code
    );
    let _ = writeln!(body, "Description: {}", lead.injury_description);
    if let Some(message) = &lead.message {
        let _ = writeln!(body, "Message: {message}");
    }
    let _ = writeln!(body, "Medical Treatment: {}", yes_no(lead.medical_treatment));
    let _ = writeln!(body, "Property Damage: {}", yes_no(lead.property_damage));
    let _ = writeln!(body, "Police Report: {}", yes_no(lead.police_report));
    let _ = writeln!(body, "Insurance Claim: {}", yes_no(lead.insurance_claim));
    let _ = writeln!(body, "Has Attorney: {}", yes_no(lead.has_attorney));

    let utm = lead.utm.clone().unwrap_or_default();
    let _ = writeln!(
        body,
        "UTM Source: {}",
        utm.utm_source.as_deref().unwrap_or("Direct")
    );
    let _ = writeln!(
        body,
        "UTM Campaign: {}",
        utm.utm_campaign.as_deref().unwrap_or("None")
    );
    body
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> &'static str {
        "email"
    }

    async fn notify(&self, lead: &LeadFormData) -> Result<(), NotifyError> {
        let subject = format!(
            "New Lead: {} {} - {}",
            lead.first_name, lead.last_name, lead.accident_type
        );
        log::info!(
            "Email notification to {}: {subject}\n{}",
            self.recipient,
            render_lead_email(lead)
        );
        Ok(())
    }
}

/// SMS channel for high-score leads.
pub struct SmsNotifier {
    recipient: String,
}

impl SmsNotifier {
    /// Creates an SMS notifier targeting `recipient`.
    #[must_use]
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
        }
    }
}

#[async_trait]
impl Notifier for SmsNotifier {
    fn channel(&self) -> &'static str {
        "sms"
    }

    async fn notify(&self, lead: &LeadFormData) -> Result<(), NotifyError> {
        log::info!(
            "SMS alert to {}: New lead from {} {} - {}",
            self.recipient,
            lead.first_name,
            lead.last_name,
            lead.phone
        );
        Ok(())
    }
}

/// Fires every notifier without awaiting completion.
///
/// Each channel runs on its own spawned task; failures are logged and
/// never reach the caller.
pub fn dispatch_all(notifiers: &[Arc<dyn Notifier>], lead: &LeadFormData) {
    for notifier in notifiers {
        let notifier = Arc::clone(notifier);
        let lead = lead.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&lead).await {
                log::error!("{} notification failed: {e}", notifier.channel());
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim_funnel_lead_models::{AccidentType, UtmParams};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn lead() -> LeadFormData {
        LeadFormData {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "555-123-4567".to_string(),
            accident_type: AccidentType::TruckAccident,
            accident_date: "2024-01-01".to_string(),
            injury_description: "Whiplash".to_string(),
            medical_treatment: true,
            property_damage: false,
            state: "CA".to_string(),
            city: "Los Angeles".to_string(),
            zip_code: "90210".to_string(),
            has_attorney: false,
            police_report: true,
            insurance_claim: false,
            message: Some("Call after 5pm".to_string()),
            consent: true,
            source: Some("website".to_string()),
            utm: Some(UtmParams {
                utm_source: Some("google".to_string()),
                utm_campaign: Some("injury-q3".to_string()),
                ..UtmParams::default()
            }),
        }
    }

    #[test]
    fn email_body_includes_lead_summary_and_attribution() {
        let body = render_lead_email(&lead());
        assert!(body.contains("Jane Doe"));
        assert!(body.contains("truck_accident"));
        assert!(body.contains("Los Angeles, CA 90210"));
        assert!(body.contains("Message: Call after 5pm"));
        assert!(body.contains("UTM Source: google"));
        assert!(body.contains("UTM Campaign: injury-q3"));
    }

    #[test]
    fn email_body_defaults_to_direct_without_utm() {
        let mut lead = lead();
        lead.utm = None;
        let body = render_lead_email(&lead);
        assert!(body.contains("UTM Source: Direct"));
        assert!(body.contains("UTM Campaign: None"));
    }

    struct CountingNotifier {
        count: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        fn channel(&self) -> &'static str {
            "counting"
        }

        async fn notify(&self, _lead: &LeadFormData) -> Result<(), NotifyError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(NotifyError::Delivery("boom".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn dispatch_fires_every_channel_and_swallows_failures() {
        let count = Arc::new(AtomicUsize::new(0));
        let notifiers: Vec<Arc<dyn Notifier>> = vec![
            Arc::new(CountingNotifier {
                count: Arc::clone(&count),
                fail: false,
            }),
            Arc::new(CountingNotifier {
                count: Arc::clone(&count),
                fail: true,
            }),
        ];

        dispatch_all(&notifiers, &lead());
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn dispatch_clones_the_lead_per_channel() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        struct RecordingNotifier {
            seen: Arc<Mutex<Vec<String>>>,
        }

        #[async_trait]
        impl Notifier for RecordingNotifier {
            fn channel(&self) -> &'static str {
                "recording"
            }

            async fn notify(&self, lead: &LeadFormData) -> Result<(), NotifyError> {
                self.seen.lock().unwrap().push(lead.email.clone());
                Ok(())
            }
        }

        let notifiers: Vec<Arc<dyn Notifier>> = vec![Arc::new(RecordingNotifier {
            seen: Arc::clone(&seen),
        })];
        dispatch_all(&notifiers, &lead());
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(*seen.lock().unwrap(), vec!["jane@example.com".to_string()]);
    }
}
