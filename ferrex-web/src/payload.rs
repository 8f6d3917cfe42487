//! Transportable payload and its codec
//!
//! Wire format (`v` = [`PAYLOAD_VERSION`]):
//!
//! ```text
//! { "v": 1, "payload": { "queryState": …, "ssrError": …, "token": …,
//!                        "randomItems": …, "account": …, "theme": …,
//!                        "pageProps": … } }
//! ```
//!
//! - dates are RFC 3339 strings and decode back into `DateTime<Utc>`
//! - errors are `{ "kind", "message", "occurredAt" }` objects
//! - an absent value is an omitted key, never `null`; a `null` inside
//!   cached data is kept as `null`
//!
//! In the document the envelope sits in a `<script type="application/json">`
//! element with `<`, `>`, `&`, U+2028 and U+2029 written as `\uXXXX`
//! escapes, which JSON decodes back to the same characters.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    account::{Account, AccountToken},
    cache::CacheSnapshot,
    error::{PayloadError, TokenError},
    random::RandomItemAssignment,
    theme::ThemePreference,
};

pub const PAYLOAD_VERSION: u32 = 1;
pub const PAYLOAD_SCRIPT_ID: &str = "__FERREX_DATA__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SsrErrorKind {
    /// The refresh endpoint could not be reached or failed unexpectedly
    RefreshFailed,
    /// The session is gone; the client should send the user to login
    SessionExpired,
}

impl fmt::Display for SsrErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RefreshFailed => "refresh_failed",
            Self::SessionExpired => "session_expired",
        })
    }
}

/// Wire-safe description of an auth failure during SSR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{kind}: {message}")]
pub struct SsrFailure {
    pub kind: SsrErrorKind,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

impl SsrFailure {
    pub fn from_token_error(err: &TokenError) -> Self {
        let kind = if err.is_session_expired() {
            SsrErrorKind::SessionExpired
        } else {
            SsrErrorKind::RefreshFailed
        };
        Self {
            kind,
            message: err.to_string(),
            occurred_at: Utc::now(),
        }
    }
}

/// Everything the server hands to the client for one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportablePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_state: Option<CacheSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssr_error: Option<SsrFailure>,
    /// Token refreshed on the server during this request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<AccountToken>,
    #[serde(default, skip_serializing_if = "RandomItemAssignment::is_empty")]
    pub random_items: RandomItemAssignment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
    #[serde(default)]
    pub theme: ThemePreference,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub page_props: Map<String, Value>,
}

impl TransportablePayload {
    /// Payload for a render without SSR data. The random-item assignment
    /// and theme are kept; they never depend on the failed steps.
    pub fn degraded(random_items: RandomItemAssignment, theme: ThemePreference) -> Self {
        Self {
            random_items,
            theme,
            ..Self::default()
        }
    }

    pub fn has_cache_entries(&self) -> bool {
        self.query_state
            .as_ref()
            .is_some_and(|snapshot| !snapshot.is_empty())
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    v: u32,
    payload: &'a TransportablePayload,
}

#[derive(Deserialize)]
struct Envelope {
    v: u32,
    payload: Value,
}

/// Shared encoder/decoder used by both ends of the boundary
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadCodec;

impl PayloadCodec {
    pub fn encode(&self, payload: &TransportablePayload) -> Result<String, PayloadError> {
        serde_json::to_string(&EnvelopeRef {
            v: PAYLOAD_VERSION,
            payload,
        })
        .map_err(PayloadError::Encode)
    }

    pub fn decode(&self, raw: &str) -> Result<TransportablePayload, PayloadError> {
        let envelope: Envelope = serde_json::from_str(raw).map_err(PayloadError::Decode)?;
        if envelope.v != PAYLOAD_VERSION {
            return Err(PayloadError::Version {
                found: envelope.v,
                expected: PAYLOAD_VERSION,
            });
        }
        serde_json::from_value(envelope.payload).map_err(PayloadError::Decode)
    }

    /// `<script>` element embedding the payload in a document.
    pub fn script_tag(&self, payload: &TransportablePayload) -> Result<String, PayloadError> {
        let encoded = self.encode(payload)?;
        Ok(format!(
            r#"<script id="{PAYLOAD_SCRIPT_ID}" type="application/json">{}</script>"#,
            escape_script_json(&encoded)
        ))
    }

    /// Recover the payload embedded by [`Self::script_tag`].
    pub fn extract(&self, html: &str) -> Result<TransportablePayload, PayloadError> {
        let marker = format!(r#"id="{PAYLOAD_SCRIPT_ID}""#);
        let start = html.find(&marker).ok_or(PayloadError::MissingScript)?;
        let after_marker = &html[start..];
        let open_end = after_marker.find('>').ok_or(PayloadError::MissingScript)?;
        let body = &after_marker[open_end + 1..];
        let close = body.find("</script>").ok_or(PayloadError::MissingScript)?;
        self.decode(&body[..close])
    }
}

fn escape_script_json(json: &str) -> String {
    let mut escaped = String::with_capacity(json.len());
    for ch in json.chars() {
        match ch {
            '<' => escaped.push_str("\\u003c"),
            '>' => escaped.push_str("\\u003e"),
            '&' => escaped.push_str("\\u0026"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            other => escaped.push(other),
        }
    }
    escaped
}
