use async_trait::async_trait;
use serde_json::{Value, json};

use crate::event::TrackingEvent;

/// Google Analytics Measurement Protocol settings.
#[derive(Debug, Clone)]
pub struct GaConfig {
    /// The `UA-`/`G-` property the hits are attributed to.
    pub measurement_id: String,
}

/// Facebook Conversions API settings.
#[derive(Debug, Clone)]
pub struct FbConfig {
    pub pixel_id: String,
    pub access_token: String,
}

/// Destination for flushed event batches.
#[async_trait]
pub trait ForwardEvents: Send + Sync {
    /// Forwards a batch. Implementations absorb their own failures;
    /// by the time a batch reaches a forwarder the events are already
    /// durable in the store.
    async fn forward(&self, events: &[TrackingEvent]);
}

/// Forwards events to whichever third parties are configured.
///
/// Each destination is independent: a Google Analytics failure does
/// not stop the Facebook send, and vice versa.
pub struct ThirdPartyForwarder {
    client: reqwest::Client,
    ga: Option<GaConfig>,
    fb: Option<FbConfig>,
}

const GA_COLLECT_URL: &str = "https://www.google-analytics.com/collect";
const FB_GRAPH_URL: &str = "https://graph.facebook.com/v13.0";

/// Builds the Measurement Protocol form fields for one event.
#[must_use]
pub fn ga_collect_params(config: &GaConfig, event: &TrackingEvent) -> Vec<(String, String)> {
    let mut params = vec![
        ("v".to_string(), "1".to_string()),
        ("tid".to_string(), config.measurement_id.clone()),
        ("cid".to_string(), event.session_id.clone()),
        ("t".to_string(), "event".to_string()),
        ("ec".to_string(), event.category.clone()),
        ("ea".to_string(), event.action.clone()),
    ];
    if let Some(label) = &event.label {
        params.push(("el".to_string(), label.clone()));
    }
    if let Some(value) = event.value {
        #[allow(clippy::cast_possible_truncation)]
        params.push(("ev".to_string(), (value.round() as i64).to_string()));
    }
    params
}

/// Builds the Conversions API body for one event.
///
/// `user_data` comes from the server-enriched metadata so the hit can
/// be matched even when the browser pixel was blocked.
#[must_use]
pub fn fb_events_payload(event: &TrackingEvent) -> Value {
    let metadata = event.metadata.clone().unwrap_or_default();
    let mut custom_data = serde_json::Map::new();
    custom_data.insert("category".to_string(), Value::String(event.category.clone()));
    if let Some(label) = &event.label {
        custom_data.insert("label".to_string(), Value::String(label.clone()));
    }
    if let Some(value) = event.value {
        custom_data.insert("value".to_string(), json!(value));
    }
    custom_data.extend(metadata.clone());

    json!({
        "data": [{
            "event_name": event.action,
            "event_time": event.timestamp_secs(),
            "event_id": format!("{}_{}", event.session_id, event.timestamp),
            "user_data": {
                "client_user_agent": metadata.get("userAgent"),
                "client_ip_address": metadata.get("ip"),
            },
            "custom_data": custom_data,
        }]
    })
}

impl ThirdPartyForwarder {
    #[must_use]
    pub fn new(ga: Option<GaConfig>, fb: Option<FbConfig>) -> Self {
        Self {
            client: reqwest::Client::new(),
            ga,
            fb,
        }
    }

    /// Whether any destination is configured.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.ga.is_some() || self.fb.is_some()
    }

    async fn send_ga(&self, config: &GaConfig, event: &TrackingEvent) {
        let params = ga_collect_params(config, event);
        match self.client.post(GA_COLLECT_URL).form(&params).send().await {
            Ok(response) if !response.status().is_success() => {
                log::warn!("GA rejected event: status={}", response.status());
            }
            Ok(_) => {}
            Err(e) => log::warn!("GA forwarding failed: {e}"),
        }
    }

    async fn send_fb(&self, config: &FbConfig, event: &TrackingEvent) {
        let url = format!("{FB_GRAPH_URL}/{}/events", config.pixel_id);
        let payload = fb_events_payload(event);
        match self
            .client
            .post(&url)
            .bearer_auth(&config.access_token)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) if !response.status().is_success() => {
                log::warn!("FB Conversions API rejected event: status={}", response.status());
            }
            Ok(_) => {}
            Err(e) => log::warn!("FB forwarding failed: {e}"),
        }
    }
}

#[async_trait]
impl ForwardEvents for ThirdPartyForwarder {
    async fn forward(&self, events: &[TrackingEvent]) {
        for event in events {
            if let Some(ga) = &self.ga {
                self.send_ga(ga, event).await;
            }
            if let Some(fb) = &self.fb {
                self.send_fb(fb, event).await;
            }
        }
    }
}
