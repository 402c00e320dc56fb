use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::AnalyticsError;

/// A single client-reported tracking event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    /// Event grouping, e.g. `form` or `engagement`.
    pub category: String,
    /// What happened, e.g. `step_completed`.
    pub action: String,
    /// Optional qualifier, e.g. the form name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Optional numeric value, e.g. a step number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Free-form context supplied by the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    /// Client-side time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Attribution session the event belongs to.
    pub session_id: String,
    /// Stable visitor identifier, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Request properties recorded alongside each accepted event.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

impl TrackingEvent {
    /// Checks the fields the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidEvent`] naming the first field
    /// that failed.
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.category.trim().is_empty() {
            return Err(AnalyticsError::InvalidEvent("category".to_string()));
        }
        if self.action.trim().is_empty() {
            return Err(AnalyticsError::InvalidEvent("action".to_string()));
        }
        if self.session_id.trim().is_empty() {
            return Err(AnalyticsError::InvalidEvent("sessionId".to_string()));
        }
        if self.timestamp <= 0 {
            return Err(AnalyticsError::InvalidEvent("timestamp".to_string()));
        }
        Ok(())
    }

    /// Folds server-observed request properties into the event
    /// metadata. Server values overwrite client-supplied keys, so a
    /// client cannot spoof its own IP or user agent.
    pub fn enrich(&mut self, ctx: &RequestContext, received_at: DateTime<Utc>) {
        let metadata = self.metadata.get_or_insert_with(Map::new);
        metadata.insert(
            "serverTimestamp".to_string(),
            Value::String(received_at.to_rfc3339()),
        );
        metadata.insert(
            "ip".to_string(),
            Value::String(ctx.ip.clone().unwrap_or_else(|| "unknown".to_string())),
        );
        metadata.insert(
            "userAgent".to_string(),
            Value::String(
                ctx.user_agent
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
            ),
        );
        metadata.insert(
            "referer".to_string(),
            Value::String(ctx.referer.clone().unwrap_or_else(|| "direct".to_string())),
        );
    }

    /// Event time in whole seconds, as the Conversions API expects.
    #[must_use]
    pub const fn timestamp_secs(&self) -> i64 {
        self.timestamp / 1000
    }
}

/// Oldest and newest event times in a result set, in epoch millis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

/// Aggregate statistics over a set of stored events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub total_events: usize,
    pub unique_sessions: usize,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
}

impl EventSummary {
    /// Summarizes a slice of events.
    #[must_use]
    pub fn from_events(events: &[TrackingEvent]) -> Self {
        let mut sessions = std::collections::BTreeSet::new();
        let mut categories = std::collections::BTreeSet::new();
        let mut start = i64::MAX;
        let mut end = i64::MIN;

        for event in events {
            sessions.insert(event.session_id.as_str());
            categories.insert(event.category.clone());
            start = start.min(event.timestamp);
            end = end.max(event.timestamp);
        }

        Self {
            total_events: events.len(),
            unique_sessions: sessions.len(),
            categories: categories.into_iter().collect(),
            time_range: if events.is_empty() {
                None
            } else {
                Some(TimeRange { start, end })
            },
        }
    }
}
