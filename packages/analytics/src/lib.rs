#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! First-party tracking events.
//!
//! Events land in an in-process [`EventStore`] immediately and are the
//! source of truth for reporting. Forwarding to Google Analytics and
//! the Facebook Conversions API is best-effort and batched: a
//! [`EventBatcher`] flushes once ten events accumulate or five seconds
//! pass, whichever comes first, and forwarding failures are logged but
//! never surfaced to the client that sent the event.

mod batch;
mod conversions;
mod event;
mod forward;
mod store;

pub use batch::{BatchConfig, EventBatcher};
pub use conversions::{
    ConversionPayload, ConversionRequest, EnhancedConversions, EnhancedUserData, RawUserData,
    hash_identifier,
};
pub use event::{EventSummary, RequestContext, TimeRange, TrackingEvent};
pub use forward::{FbConfig, ForwardEvents, GaConfig, ThirdPartyForwarder};
pub use store::EventStore;

use thiserror::Error;

/// Errors from the analytics pipeline.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The event failed structural validation.
    #[error("Invalid event data: {0}")]
    InvalidEvent(String),
    /// The batcher's channel is closed.
    #[error("Event pipeline is shut down")]
    PipelineClosed,
}
