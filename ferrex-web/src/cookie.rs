//! Signed account cookie
//!
//! The server never sees the client's account store; it reconstructs a
//! read-only [`Account`] from a cookie set at login and rotated after SSR
//! token refreshes. Cookie value:
//!
//! ```text
//! base64url(json(account)) "." base64url(hmac_sha256(secret, json(account)))
//! ```

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{account::Account, error::CookieError};

type HmacSha256 = Hmac<Sha256>;

/// Split a `Cookie` header into name/value pairs.
pub fn parse_cookie_header(header: &str) -> impl Iterator<Item = (&str, &str)> {
    header.split(';').filter_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some((name, value.trim().trim_matches('"')))
    })
}

/// First cookie with the given name.
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    parse_cookie_header(header)
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, value)| value)
}

/// Decodes an account from a raw cookie value, rejecting anything it
/// cannot vouch for.
pub trait CookieValidator: Send + Sync {
    fn validate(&self, value: &str) -> Result<Account, CookieError>;
}

/// HMAC-SHA256 signer for account cookies
#[derive(Clone)]
pub struct SignedCookie {
    secret: Vec<u8>,
}

impl SignedCookie {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, CookieError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(CookieError::EmptySecret);
        }
        Ok(Self {
            secret: secret.to_vec(),
        })
    }

    fn mac(&self) -> Result<HmacSha256, CookieError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| CookieError::EmptySecret)
    }

    pub fn sign(&self, account: &Account) -> Result<String, CookieError> {
        let body = serde_json::to_vec(account)?;
        let mut mac = self.mac()?;
        mac.update(&body);
        let signature = mac.finalize().into_bytes();
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&body),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    pub fn verify(&self, value: &str) -> Result<Account, CookieError> {
        let (body, signature) = value.split_once('.').ok_or(CookieError::Malformed)?;
        let body = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|_| CookieError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| CookieError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(&body);
        mac.verify_slice(&signature)
            .map_err(|_| CookieError::Signature)?;

        Ok(serde_json::from_slice(&body)?)
    }

    /// `Set-Cookie` header value carrying the signed account.
    pub fn issue(
        &self,
        name: &str,
        account: &Account,
        secure: bool,
    ) -> Result<String, CookieError> {
        Ok(issue_auth_cookie(name, &self.sign(account)?, secure))
    }
}

impl std::fmt::Debug for SignedCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedCookie").finish_non_exhaustive()
    }
}

impl CookieValidator for SignedCookie {
    fn validate(&self, value: &str) -> Result<Account, CookieError> {
        self.verify(value)
    }
}

/// Account from the request cookies, if a valid one is present.
///
/// Absence and rejection both read as "guest".
pub fn read_auth_cookie(
    cookie_header: Option<&str>,
    key: &str,
    validator: &dyn CookieValidator,
) -> Option<Account> {
    let value = find_cookie(cookie_header?, key)?;
    match validator.validate(value) {
        Ok(account) => Some(account),
        Err(err) => {
            tracing::debug!(cookie = key, error = %err, "ignoring account cookie");
            None
        }
    }
}

/// Build a `Set-Cookie` header value for an already signed account cookie.
pub fn issue_auth_cookie(name: &str, value: &str, secure: bool) -> String {
    let mut header = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        header.push_str("; Secure");
    }
    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccessToken, AccountToken};
    use chrono::{DateTime, Utc};
    use serde_json::json;

    fn alice() -> Account {
        Account::new(
            "42",
            AccountToken {
                access_token: AccessToken::new("T0"),
                refresh_token: Some("R0".into()),
                expires_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0)
                    .expect("valid timestamp"),
            },
        )
        .with_field("name", json!("old"))
    }

    #[test]
    fn finds_named_cookie_among_others() {
        let header = "theme=dark; ferrex_account=abc.def ; other=1";
        assert_eq!(find_cookie(header, "ferrex_account"), Some("abc.def"));
        assert_eq!(find_cookie(header, "missing"), None);
    }

    #[test]
    fn signed_cookie_round_trips_through_header() {
        let signer = SignedCookie::new("secret").expect("signer");
        let value = signer.sign(&alice()).expect("sign");
        let header = format!("theme=dark; ferrex_account={value}");

        let account = read_auth_cookie(Some(&header), "ferrex_account", &signer);
        assert_eq!(account, Some(alice()));
    }

    #[test]
    fn tampered_or_foreign_cookies_are_guests() {
        let signer = SignedCookie::new("secret").expect("signer");
        let other = SignedCookie::new("another-secret").expect("signer");
        let value = other.sign(&alice()).expect("sign");

        assert!(matches!(signer.verify(&value), Err(CookieError::Signature)));
        assert!(matches!(signer.verify("no-dot"), Err(CookieError::Malformed)));

        let header = format!("ferrex_account={value}");
        assert!(read_auth_cookie(Some(&header), "ferrex_account", &signer).is_none());
        assert!(read_auth_cookie(None, "ferrex_account", &signer).is_none());
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(SignedCookie::new(""), Err(CookieError::EmptySecret)));
    }

    #[test]
    fn issued_header_carries_attributes() {
        let header = issue_auth_cookie("ferrex_account", "v", true);
        assert_eq!(
            header,
            "ferrex_account=v; Path=/; HttpOnly; SameSite=Lax; Secure"
        );
    }
}
