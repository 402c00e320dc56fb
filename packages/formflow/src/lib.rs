#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Multi-step accident intake wizard controller.
//!
//! Owns the wizard state (current step, draft report, field errors,
//! touched fields, submit flags) and drives the three-step flow:
//! contact info → accident details → description. Each step transition
//! runs only that step's validation; the draft mirrors to tiered storage
//! on every edit so an abandoned visitor can pick up where they left off.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use claim_funnel_lead_models::{AccidentReport, phone_digits};
use claim_funnel_storage::FormPersistence;
use claim_funnel_validate::{
    FieldErrors, validate_contact, validate_description, validate_details,
};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Storage key the wizard persists its draft under.
pub const DRAFT_STORAGE_KEY: &str = "accident-form";

/// How long the success screen stays up before the wizard auto-closes.
pub const AUTO_CLOSE_DELAY: Duration = Duration::from_secs(5);

/// Tracking label for this form.
pub const FORM_NAME: &str = "accident_form";

/// The wizard's three input steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormStep {
    /// ZIP, email, phone.
    ContactInfo,
    /// Accident type, role, fault, date, medical attention.
    AccidentDetails,
    /// Free-text description.
    Description,
}

impl FormStep {
    /// 1-based step number for progress display and tracking.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::ContactInfo => 1,
            Self::AccidentDetails => 2,
            Self::Description => 3,
        }
    }

    /// Total number of input steps.
    pub const COUNT: u8 = 3;

    const fn next(self) -> Option<Self> {
        match self {
            Self::ContactInfo => Some(Self::AccidentDetails),
            Self::AccidentDetails => Some(Self::Description),
            Self::Description => None,
        }
    }

    const fn prev(self) -> Option<Self> {
        match self {
            Self::ContactInfo => None,
            Self::AccidentDetails => Some(Self::ContactInfo),
            Self::Description => Some(Self::AccidentDetails),
        }
    }

    fn validate(self, report: &AccidentReport) -> FieldErrors {
        match self {
            Self::ContactInfo => validate_contact(report),
            Self::AccidentDetails => validate_details(report),
            Self::Description => validate_description(report),
        }
    }
}

/// A single editable wizard field. Names match the error-map keys.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "camelCase")]
pub enum FormField {
    /// Step 1.
    ZipCode,
    /// Step 1.
    Email,
    /// Step 1.
    PhoneNumber,
    /// Step 2.
    AccidentType,
    /// Step 2.
    Role,
    /// Step 2.
    AtFault,
    /// Step 2.
    IncidentDate,
    /// Step 2.
    MedicalAttention,
    /// Step 3.
    Description,
}

/// Receives the wizard's tracking side effects.
pub trait FormTracker: Send + Sync {
    /// A step was completed and the wizard advanced past it.
    fn step_completed(&self, form_name: &str, step: u8);
    /// The form was submitted successfully.
    fn form_submitted(&self, form_name: &str);
    /// A submission attempt failed.
    fn submit_failed(&self, form_name: &str);
}

/// Tracker that drops everything; useful when analytics is disabled.
pub struct NoopTracker;

impl FormTracker for NoopTracker {
    fn step_completed(&self, _form_name: &str, _step: u8) {}
    fn form_submitted(&self, _form_name: &str) {}
    fn submit_failed(&self, _form_name: &str) {}
}

/// Error surfaced to the visitor when a submission attempt fails.
///
/// Always retryable: the draft is still persisted, so the visitor can
/// try again (or call directly) without re-entering anything.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The request never produced a usable response.
    #[error("There was an error submitting your information. Please try again or call us directly.")]
    Transport(#[source] reqwest::Error),

    /// The server rejected the submission.
    #[error("There was an error submitting your information. Please try again or call us directly.")]
    Rejected {
        /// HTTP status returned by the server.
        status: u16,
    },

    /// A submission is already in flight.
    #[error("A submission is already in progress")]
    InFlight,

    /// The final step failed validation; no request was made.
    #[error("Please correct the highlighted fields")]
    Invalid,
}

/// Delivers a completed report to the intake endpoint.
#[async_trait]
pub trait SubmitLead: Send + Sync {
    /// Submits the report.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError`] if the request fails or is rejected.
    async fn submit(&self, report: &AccidentReport) -> Result<(), SubmitError>;
}

/// [`SubmitLead`] implementation that POSTs JSON to the intake API.
pub struct HttpSubmitter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSubmitter {
    /// Creates a submitter targeting `endpoint`
    /// (e.g. `https://example.com/api/submit-accident-form`).
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl SubmitLead for HttpSubmitter {
    async fn submit(&self, report: &AccidentReport) -> Result<(), SubmitError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(report)
            .send()
            .await
            .map_err(SubmitError::Transport)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SubmitError::Rejected {
                status: response.status().as_u16(),
            })
        }
    }
}

/// The wizard controller.
pub struct Wizard {
    step: FormStep,
    persistence: FormPersistence<AccidentReport>,
    tracker: Arc<dyn FormTracker>,
    errors: FieldErrors,
    touched: BTreeSet<FormField>,
    submitting: bool,
    complete: bool,
}

impl Wizard {
    /// Creates a wizard over a persistence holder and tracker. Call
    /// [`hydrate`] before rendering any field.
    ///
    /// [`hydrate`]: Wizard::hydrate
    #[must_use]
    pub fn new(persistence: FormPersistence<AccidentReport>, tracker: Arc<dyn FormTracker>) -> Self {
        Self {
            step: FormStep::ContactInfo,
            persistence,
            tracker,
            errors: FieldErrors::new(),
            touched: BTreeSet::new(),
            submitting: false,
            complete: false,
        }
    }

    /// Restores a persisted draft. Fields must not be rendered as
    /// controlled inputs before this runs, or defaults would clobber the
    /// restored draft on the next autosave.
    pub fn hydrate(&mut self) {
        self.persistence.load();
    }

    /// Whether hydration has completed.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.persistence.is_loaded()
    }

    /// The current step.
    #[must_use]
    pub const fn step(&self) -> FormStep {
        self.step
    }

    /// Current draft snapshot.
    #[must_use]
    pub fn report(&self) -> AccidentReport {
        self.persistence.value()
    }

    /// Current field errors.
    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Whether `field` has been edited this session.
    #[must_use]
    pub fn is_touched(&self, field: FormField) -> bool {
        self.touched.contains(&field)
    }

    /// Whether a submission is in flight.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Whether the wizard reached the terminal submitted state.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    /// Sets a field from raw input, clears its error, marks it touched,
    /// and schedules a debounced autosave.
    ///
    /// Phone input is normalized to bare digits and capped at ten, so
    /// display formatting can never leak into the stored draft.
    pub fn update_field(&mut self, field: FormField, value: &str) {
        let value = if field == FormField::PhoneNumber {
            let digits = phone_digits(value);
            if digits.len() > 10 {
                return;
            }
            digits
        } else {
            value.to_string()
        };

        self.persistence.update(|report| {
            let slot = match field {
                FormField::ZipCode => &mut report.zip_code,
                FormField::Email => &mut report.email,
                FormField::PhoneNumber => &mut report.phone_number,
                FormField::AccidentType => &mut report.accident_type,
                FormField::Role => &mut report.role,
                FormField::AtFault => &mut report.at_fault,
                FormField::IncidentDate => &mut report.incident_date,
                FormField::MedicalAttention => &mut report.medical_attention,
                FormField::Description => &mut report.description,
            };
            *slot = value;
        });

        self.errors.remove(field.as_ref());
        self.touched.insert(field);
    }

    /// Validates the current step and advances on success.
    ///
    /// Returns `true` if the wizard advanced. On failure the step stays
    /// put and the error map is populated; there is no partial advance.
    pub fn next(&mut self) -> bool {
        let errors = self.step.validate(&self.persistence.value());
        if !errors.is_empty() {
            self.errors = errors;
            return false;
        }

        let Some(next) = self.step.next() else {
            return false;
        };
        self.tracker.step_completed(FORM_NAME, self.step.number());
        self.step = next;
        self.errors.clear();
        true
    }

    /// Steps back unconditionally. No revalidation, errors untouched.
    pub fn back(&mut self) {
        if let Some(prev) = self.step.prev() {
            self.step = prev;
        }
    }

    /// Re-validates the final step and submits the assembled report.
    ///
    /// On success the wizard transitions to the terminal submitted state
    /// and the persisted draft is cleared; the caller should keep the
    /// success screen up for [`AUTO_CLOSE_DELAY`]. On failure the draft
    /// survives so the visitor can retry without re-entering data.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError`] when validation fails, a submission is
    /// already in flight, or the request fails.
    pub async fn submit(&mut self, submitter: &dyn SubmitLead) -> Result<(), SubmitError> {
        if self.submitting {
            return Err(SubmitError::InFlight);
        }

        let report = self.persistence.value();
        let errors = FormStep::Description.validate(&report);
        if !errors.is_empty() {
            self.errors = errors;
            return Err(SubmitError::Invalid);
        }

        self.submitting = true;
        // Pending autosaves must land before the draft is cleared or kept.
        self.persistence.flush();

        let result = submitter.submit(&report).await;
        self.submitting = false;

        match result {
            Ok(()) => {
                self.tracker.form_submitted(FORM_NAME);
                self.persistence.clear();
                self.complete = true;
                Ok(())
            }
            Err(e) => {
                log::warn!("Accident form submission failed: {e}");
                self.tracker.submit_failed(FORM_NAME);
                Err(e)
            }
        }
    }

    /// Resets the wizard to its initial state and discards the draft.
    pub fn reset(&mut self) {
        self.persistence.clear();
        self.step = FormStep::ContactInfo;
        self.errors.clear();
        self.touched.clear();
        self.submitting = false;
        self.complete = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim_funnel_storage::{MemoryBackend, PersistenceOptions, TieredStore};
    use std::sync::Mutex;

    struct SpyTracker {
        steps: Mutex<Vec<u8>>,
        submitted: Mutex<u32>,
        failed: Mutex<u32>,
    }

    impl SpyTracker {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(Vec::new()),
                submitted: Mutex::new(0),
                failed: Mutex::new(0),
            })
        }
    }

    impl FormTracker for SpyTracker {
        fn step_completed(&self, _form_name: &str, step: u8) {
            self.steps.lock().unwrap().push(step);
        }
        fn form_submitted(&self, _form_name: &str) {
            *self.submitted.lock().unwrap() += 1;
        }
        fn submit_failed(&self, _form_name: &str) {
            *self.failed.lock().unwrap() += 1;
        }
    }

    struct StubSubmitter {
        fail: bool,
    }

    #[async_trait]
    impl SubmitLead for StubSubmitter {
        async fn submit(&self, _report: &AccidentReport) -> Result<(), SubmitError> {
            if self.fail {
                Err(SubmitError::Rejected { status: 500 })
            } else {
                Ok(())
            }
        }
    }

    fn wizard_with(tracker: Arc<SpyTracker>) -> (Wizard, TieredStore) {
        let store = TieredStore::new(vec![Arc::new(MemoryBackend::new())]);
        let persistence = FormPersistence::new(
            DRAFT_STORAGE_KEY,
            AccidentReport::default(),
            store.clone(),
            PersistenceOptions {
                debounce: Duration::from_millis(5),
                ..PersistenceOptions::default()
            },
        );
        let mut wizard = Wizard::new(persistence, tracker);
        wizard.hydrate();
        (wizard, store)
    }

    fn fill_contact(wizard: &mut Wizard) {
        wizard.update_field(FormField::ZipCode, "90210");
        wizard.update_field(FormField::Email, "a@b.com");
        wizard.update_field(FormField::PhoneNumber, "5551234567");
    }

    fn fill_details(wizard: &mut Wizard) {
        wizard.update_field(FormField::AccidentType, "car_accident");
        wizard.update_field(FormField::Role, "driver");
        wizard.update_field(FormField::AtFault, "no");
        wizard.update_field(FormField::IncidentDate, "2024-01-01");
        wizard.update_field(FormField::MedicalAttention, "yes");
    }

    fn fill_description(wizard: &mut Wizard) {
        wizard.update_field(
            FormField::Description,
            "Rear-ended at a red light, neck pain since.",
        );
    }

    #[tokio::test]
    async fn short_zip_blocks_advancement() {
        let (mut wizard, _) = wizard_with(SpyTracker::new());
        wizard.update_field(FormField::ZipCode, "1234");
        wizard.update_field(FormField::Email, "a@b.com");
        wizard.update_field(FormField::PhoneNumber, "5551234567");

        assert!(!wizard.next());
        assert_eq!(wizard.step(), FormStep::ContactInfo);
        assert!(wizard.errors().contains_key("zipCode"));

        wizard.update_field(FormField::ZipCode, "12345");
        assert!(wizard.next());
        assert_eq!(wizard.step(), FormStep::AccidentDetails);
    }

    #[tokio::test]
    async fn editing_a_field_clears_its_error() {
        let (mut wizard, _) = wizard_with(SpyTracker::new());
        assert!(!wizard.next());
        assert!(wizard.errors().contains_key("email"));

        wizard.update_field(FormField::Email, "a@b.com");
        assert!(!wizard.errors().contains_key("email"));
        // Other errors stay until their fields change.
        assert!(wizard.errors().contains_key("zipCode"));
    }

    #[tokio::test]
    async fn back_never_validates() {
        let tracker = SpyTracker::new();
        let (mut wizard, _) = wizard_with(Arc::clone(&tracker));
        fill_contact(&mut wizard);
        assert!(wizard.next());

        wizard.back();
        assert_eq!(wizard.step(), FormStep::ContactInfo);
        wizard.back();
        assert_eq!(wizard.step(), FormStep::ContactInfo);
    }

    #[tokio::test]
    async fn phone_input_keeps_digits_only() {
        let (mut wizard, _) = wizard_with(SpyTracker::new());
        wizard.update_field(FormField::PhoneNumber, "(555) 123-4567");
        assert_eq!(wizard.report().phone_number, "5551234567");

        // Over-long input is ignored, matching the form's input cap.
        wizard.update_field(FormField::PhoneNumber, "55512345678");
        assert_eq!(wizard.report().phone_number, "5551234567");
    }

    #[tokio::test]
    async fn step_completions_are_tracked() {
        let tracker = SpyTracker::new();
        let (mut wizard, _) = wizard_with(Arc::clone(&tracker));
        fill_contact(&mut wizard);
        assert!(wizard.next());
        fill_details(&mut wizard);
        assert!(wizard.next());
        assert_eq!(*tracker.steps.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn successful_submit_clears_draft_and_completes() {
        let tracker = SpyTracker::new();
        let (mut wizard, store) = wizard_with(Arc::clone(&tracker));
        fill_contact(&mut wizard);
        wizard.next();
        fill_details(&mut wizard);
        wizard.next();
        fill_description(&mut wizard);

        wizard
            .submit(&StubSubmitter { fail: false })
            .await
            .unwrap();
        assert!(wizard.is_complete());
        assert!(!wizard.is_submitting());
        assert_eq!(*tracker.submitted.lock().unwrap(), 1);
        assert!(store.read(DRAFT_STORAGE_KEY).is_none());
    }

    #[tokio::test]
    async fn failed_submit_keeps_draft_for_retry() {
        let tracker = SpyTracker::new();
        let (mut wizard, store) = wizard_with(Arc::clone(&tracker));
        fill_contact(&mut wizard);
        wizard.next();
        fill_details(&mut wizard);
        wizard.next();
        fill_description(&mut wizard);

        let err = wizard
            .submit(&StubSubmitter { fail: true })
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Rejected { status: 500 }));
        assert!(!wizard.is_complete());
        assert_eq!(*tracker.failed.lock().unwrap(), 1);
        // Draft survives: the flush before submit wrote it out.
        assert!(store.read(DRAFT_STORAGE_KEY).is_some());

        // Retry succeeds without re-entering data.
        wizard
            .submit(&StubSubmitter { fail: false })
            .await
            .unwrap();
        assert!(wizard.is_complete());
    }

    #[tokio::test]
    async fn submit_rejects_short_description() {
        let (mut wizard, _) = wizard_with(SpyTracker::new());
        fill_contact(&mut wizard);
        wizard.next();
        fill_details(&mut wizard);
        wizard.next();
        wizard.update_field(FormField::Description, "too short");

        let err = wizard
            .submit(&StubSubmitter { fail: false })
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Invalid));
        assert!(wizard.errors().contains_key("description"));
    }

    #[tokio::test]
    async fn draft_restores_into_a_new_wizard() {
        let store = TieredStore::new(vec![Arc::new(MemoryBackend::new())]);
        let options = PersistenceOptions {
            debounce: Duration::from_millis(5),
            ..PersistenceOptions::default()
        };

        {
            let persistence = FormPersistence::new(
                DRAFT_STORAGE_KEY,
                AccidentReport::default(),
                store.clone(),
                options,
            );
            let mut wizard = Wizard::new(persistence, SpyTracker::new());
            wizard.hydrate();
            fill_contact(&mut wizard);
            tokio::time::sleep(Duration::from_millis(40)).await;
        }

        let persistence = FormPersistence::new(
            DRAFT_STORAGE_KEY,
            AccidentReport::default(),
            store,
            options,
        );
        let mut wizard = Wizard::new(persistence, SpyTracker::new());
        wizard.hydrate();
        assert_eq!(wizard.report().zip_code, "90210");
        assert_eq!(wizard.report().email, "a@b.com");
    }
}
