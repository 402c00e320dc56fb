#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! First-touch UTM capture and visitor session tracking.
//!
//! On each page load the landing URL's query string is inspected for UTM
//! and ad click-id parameters. Fresh parameters win and are written to
//! every storage tier; absent parameters fall back to whatever was stored
//! before, so a returning visitor keeps their original attribution for
//! the full cookie lifetime. Storage trouble degrades to "no data" — the
//! page never fails because attribution could not be read.

use std::time::Duration;

use chrono::{DateTime, Utc};
use claim_funnel_lead_models::UtmParams;
use claim_funnel_storage::TieredStore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storage key for the captured UTM context.
pub const UTM_STORAGE_KEY: &str = "cf_utm";

/// Storage key for the visitor session.
pub const SESSION_STORAGE_KEY: &str = "cf_session";

/// How long first-touch attribution persists.
pub const ATTRIBUTION_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Idle gap after which a session is rotated.
pub const SESSION_TIMEOUT: chrono::Duration = chrono::Duration::minutes(30);

/// A visitor session: rotated after 30 idle minutes, kept alive by
/// tracked interactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier.
    pub id: String,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// Last tracked activity.
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Starts a fresh session at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: now,
            last_activity: now,
        }
    }

    /// Whether the idle gap since the last activity exceeds the session
    /// timeout.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.last_activity > SESSION_TIMEOUT
    }

    /// Records activity at `now`, keeping the session alive.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }
}

/// Everything the funnel knows about where a visitor came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionContext {
    /// First-touch UTM and click-id parameters.
    pub utm: UtmParams,
    /// Document referrer at capture time.
    pub referrer: String,
    /// Path the visitor landed on.
    pub landing_page: String,
    /// Visitor user agent.
    pub user_agent: String,
    /// Active session id.
    pub session_id: String,
}

/// Extracts UTM and click-id parameters from a URL or bare query string.
///
/// Unknown parameters are ignored; empty values count as absent.
#[must_use]
pub fn extract_utm_params(url: &str) -> UtmParams {
    let query = url.split_once('?').map_or(url, |(_, q)| q);
    let query = query.split('#').next().unwrap_or_default();

    let mut utm = UtmParams::default();
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = decode_component(value);
        if value.is_empty() {
            continue;
        }
        match key {
            "utm_source" => utm.utm_source = Some(value),
            "utm_medium" => utm.utm_medium = Some(value),
            "utm_campaign" => utm.utm_campaign = Some(value),
            "utm_term" => utm.utm_term = Some(value),
            "utm_content" => utm.utm_content = Some(value),
            "gclid" => utm.gclid = Some(value),
            "fbclid" => utm.fbclid = Some(value),
            "msclkid" => utm.msclkid = Some(value),
            _ => {}
        }
    }
    utm
}

/// Minimal percent-decoding for query parameter values.
///
/// Decoded bytes are collected first and converted as UTF-8 at the
/// end, so multi-byte sequences like `%C3%A9` come out intact.
fn decode_component(value: &str) -> String {
    let mut out = Vec::with_capacity(value.len());
    let mut bytes = value.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'+' => out.push(b' '),
            b'%' => {
                let hi = bytes.next();
                let lo = bytes.next();
                let decoded = hi.zip(lo).and_then(|(hi, lo)| {
                    let hex = [hi, lo];
                    let hex = std::str::from_utf8(&hex).ok()?;
                    u8::from_str_radix(hex, 16).ok()
                });
                match decoded {
                    Some(byte) => out.push(byte),
                    None => out.push(b'%'),
                }
            }
            _ => out.push(b),
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Resumes the stored session or starts a new one, then persists it.
#[must_use]
pub fn resume_or_start_session(store: &TieredStore, now: DateTime<Utc>) -> Session {
    let mut session = store
        .read(SESSION_STORAGE_KEY)
        .and_then(|raw| serde_json::from_str::<Session>(&raw).ok())
        .filter(|s| !s.is_expired(now))
        .unwrap_or_else(|| Session::new(now));

    session.touch(now);
    persist_session(store, &session);
    session
}

/// Records visitor activity, extending the current session's life.
pub fn record_activity(store: &TieredStore, now: DateTime<Utc>) {
    if let Some(mut session) = store
        .read(SESSION_STORAGE_KEY)
        .and_then(|raw| serde_json::from_str::<Session>(&raw).ok())
    {
        session.touch(now);
        persist_session(store, &session);
    }
}

fn persist_session(store: &TieredStore, session: &Session) {
    match serde_json::to_string(session) {
        Ok(json) => store.write(SESSION_STORAGE_KEY, &json, Some(ATTRIBUTION_TTL)),
        Err(e) => log::warn!("Failed to serialize session: {e}"),
    }
}

/// Captures attribution for a page load.
///
/// Fresh UTM parameters in the URL become the active context and are
/// written to every storage tier; otherwise the previously stored
/// first-touch context is reused.
#[must_use]
pub fn capture(
    store: &TieredStore,
    url: &str,
    referrer: &str,
    user_agent: &str,
    now: DateTime<Utc>,
) -> AttributionContext {
    let session = resume_or_start_session(store, now);

    let fresh = extract_utm_params(url);
    let utm = if fresh.is_empty() {
        store
            .read(UTM_STORAGE_KEY)
            .and_then(|raw| serde_json::from_str::<UtmParams>(&raw).ok())
            .unwrap_or_default()
    } else {
        match serde_json::to_string(&fresh) {
            Ok(json) => store.write(UTM_STORAGE_KEY, &json, Some(ATTRIBUTION_TTL)),
            Err(e) => log::warn!("Failed to serialize UTM context: {e}"),
        }
        fresh
    };

    let landing_page = url
        .split_once("://")
        .map_or(url, |(_, rest)| rest)
        .split_once('/')
        .map_or("/", |(_, path)| path.split('?').next().unwrap_or(""))
        .to_string();
    let landing_page = if landing_page.starts_with('/') {
        landing_page
    } else {
        format!("/{landing_page}")
    };

    AttributionContext {
        utm,
        referrer: referrer.to_string(),
        landing_page,
        user_agent: user_agent.to_string(),
        session_id: session.id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim_funnel_storage::MemoryBackend;
    use std::sync::Arc;

    fn fresh_store() -> TieredStore {
        TieredStore::new(vec![Arc::new(MemoryBackend::new())])
    }

    #[test]
    fn extracts_utm_and_click_ids() {
        let utm = extract_utm_params(
            "https://example.com/?utm_source=google&utm_medium=cpc&utm_campaign=injury%20q3&gclid=abc123",
        );
        assert_eq!(utm.utm_source.as_deref(), Some("google"));
        assert_eq!(utm.utm_medium.as_deref(), Some("cpc"));
        assert_eq!(utm.utm_campaign.as_deref(), Some("injury q3"));
        assert_eq!(utm.gclid.as_deref(), Some("abc123"));
        assert!(utm.fbclid.is_none());
    }

    #[test]
    fn empty_values_count_as_absent() {
        let utm = extract_utm_params("utm_source=&utm_medium=email");
        assert!(utm.utm_source.is_none());
        assert_eq!(utm.utm_medium.as_deref(), Some("email"));
    }

    #[test]
    fn plus_and_percent_decoding() {
        let utm = extract_utm_params("utm_term=car+accident%2Blawyer");
        assert_eq!(utm.utm_term.as_deref(), Some("car accident+lawyer"));
    }

    #[test]
    fn multi_byte_percent_encoding_decodes_intact() {
        let utm = extract_utm_params("utm_campaign=%C3%A9t%C3%A9&utm_term=fianc%C3%A9");
        assert_eq!(utm.utm_campaign.as_deref(), Some("été"));
        assert_eq!(utm.utm_term.as_deref(), Some("fiancé"));
    }

    #[test]
    fn first_touch_survives_second_visit() {
        let store = fresh_store();
        let now = Utc::now();

        let first = capture(
            &store,
            "https://example.com/?utm_source=facebook&fbclid=xyz",
            "https://facebook.com",
            "test-agent",
            now,
        );
        assert_eq!(first.utm.utm_source.as_deref(), Some("facebook"));

        // Second visit in the same cookie lifetime, no parameters.
        let second = capture(&store, "https://example.com/", "", "test-agent", now);
        assert_eq!(second.utm, first.utm);
    }

    #[test]
    fn fresh_parameters_overwrite_stored_context() {
        let store = fresh_store();
        let now = Utc::now();

        capture(
            &store,
            "https://example.com/?utm_source=google",
            "",
            "ua",
            now,
        );
        let second = capture(
            &store,
            "https://example.com/?utm_source=bing&msclkid=m1",
            "",
            "ua",
            now,
        );
        assert_eq!(second.utm.utm_source.as_deref(), Some("bing"));
        assert_eq!(second.utm.msclkid.as_deref(), Some("m1"));
    }

    #[test]
    fn session_rotates_after_idle_timeout() {
        let store = fresh_store();
        let start = Utc::now();

        let first = resume_or_start_session(&store, start);
        let resumed = resume_or_start_session(&store, start + chrono::Duration::minutes(10));
        assert_eq!(resumed.id, first.id);

        let rotated = resume_or_start_session(&store, start + chrono::Duration::minutes(45));
        assert_ne!(rotated.id, first.id);
    }

    #[test]
    fn activity_keeps_session_alive() {
        let store = fresh_store();
        let start = Utc::now();

        let first = resume_or_start_session(&store, start);
        record_activity(&store, start + chrono::Duration::minutes(25));
        // 50 minutes after start but only 25 after the last activity.
        let resumed = resume_or_start_session(&store, start + chrono::Duration::minutes(50));
        assert_eq!(resumed.id, first.id);
    }

    #[test]
    fn landing_page_is_path_only() {
        let store = fresh_store();
        let ctx = capture(
            &store,
            "https://example.com/landing?utm_source=x",
            "",
            "ua",
            Utc::now(),
        );
        assert_eq!(ctx.landing_page, "/landing");
    }
}
