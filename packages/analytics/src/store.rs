use std::sync::Mutex;

use crate::event::{EventSummary, TrackingEvent};

/// In-process event log.
///
/// Events are held in arrival order; queries return newest first.
/// The store is the system of record for reporting even when
/// third-party forwarding is configured.
#[derive(Debug, Default)]
pub struct EventStore {
    events: Mutex<Vec<TrackingEvent>>,
}

impl EventStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an accepted event.
    pub fn push(&self, event: TrackingEvent) {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(event);
    }

    /// Number of stored events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns matching events, newest first, capped at `limit`.
    ///
    /// `session_id` and `category` filter when present; a `limit` of
    /// zero is treated as no cap.
    #[must_use]
    pub fn query(
        &self,
        session_id: Option<&str>,
        category: Option<&str>,
        limit: usize,
    ) -> Vec<TrackingEvent> {
        let events = self
            .events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut matched: Vec<TrackingEvent> = events
            .iter()
            .filter(|e| session_id.is_none_or(|s| e.session_id == s))
            .filter(|e| category.is_none_or(|c| e.category == c))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if limit > 0 {
            matched.truncate(limit);
        }
        matched
    }

    /// Summarizes the events a query would return (unlimited).
    #[must_use]
    pub fn summarize(&self, session_id: Option<&str>, category: Option<&str>) -> EventSummary {
        EventSummary::from_events(&self.query(session_id, category, 0))
    }
}
