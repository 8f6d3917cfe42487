//! Authenticated identity and the store contract around it

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// Bearer credential sent with API requests
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Token pair stored with an account
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountToken {
    pub access_token: AccessToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl AccountToken {
    /// Whether the access token stays valid for at least `skew` after `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        self.expires_at - skew > now
    }
}

impl fmt::Debug for AccountToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountToken")
            .field("access_token", &self.access_token)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Logged-in identity.
///
/// Profile fields are kept as an open map: the web client renders whatever
/// the API returns for `/users/me` and only relies on `id` and `token`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub token: AccountToken,
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl Account {
    pub fn new(id: impl Into<String>, token: AccountToken) -> Self {
        Self {
            id: id.into(),
            token,
            profile: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.profile.insert(name.into(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.profile.get(name)
    }

    /// Overlay a freshly fetched profile on this account.
    ///
    /// Fields present in `profile` win; fields only this account has are
    /// kept. `id` and `token` always come from this account unless the
    /// profile carries them, in which case they must still decode.
    pub fn merge_profile(&self, profile: &Value) -> Result<Account, serde_json::Error> {
        let mut merged = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if let Value::Object(fields) = profile {
            for (name, value) in fields {
                merged.insert(name.clone(), value.clone());
            }
        }
        serde_json::from_value(Value::Object(merged))
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, patch: AccountPatch) {
        if let Some(token) = patch.token {
            self.token = token;
        }
        self.profile.extend(patch.profile);
    }
}

/// Partial account update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountPatch {
    pub token: Option<AccountToken>,
    pub profile: Map<String, Value>,
}

impl AccountPatch {
    pub fn token(token: AccountToken) -> Self {
        Self {
            token: Some(token),
            profile: Map::new(),
        }
    }
}

/// Client-side persisted accounts.
///
/// The bootstrap layer only reads the current account and patches its
/// token; creating and removing accounts belongs to the login flow.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn current_account(&self) -> Result<Option<Account>, StoreError>;

    async fn update_account(&self, id: &str, patch: AccountPatch) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token(access: &str) -> AccountToken {
        AccountToken {
            access_token: AccessToken::new(access),
            refresh_token: Some("refresh".into()),
            expires_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0)
                .expect("valid timestamp"),
        }
    }

    #[test]
    fn merge_prefers_fetched_fields_and_keeps_identity() {
        let account = Account::new("42", token("T0")).with_field("name", json!("old"));
        let merged = account
            .merge_profile(&json!({ "name": "Alice" }))
            .expect("merge");

        assert_eq!(merged.id, "42");
        assert_eq!(merged.token, token("T0"));
        assert_eq!(merged.field("name"), Some(&json!("Alice")));
    }

    #[test]
    fn merge_keeps_fields_missing_from_profile() {
        let account = Account::new("42", token("T0")).with_field("avatar", json!("a.png"));
        let merged = account
            .merge_profile(&json!({ "name": "Alice" }))
            .expect("merge");
        assert_eq!(merged.field("avatar"), Some(&json!("a.png")));
        assert_eq!(merged.field("name"), Some(&json!("Alice")));
    }

    #[test]
    fn patch_replaces_token_in_place() {
        let mut account = Account::new("42", token("T0")).with_field("name", json!("Alice"));
        account.apply(AccountPatch::token(token("T1")));
        assert_eq!(account.token.access_token.as_str(), "T1");
        assert_eq!(account.field("name"), Some(&json!("Alice")));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let rendered = format!("{:?}", token("super-secret"));
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("has_refresh_token: true"));
    }
}
