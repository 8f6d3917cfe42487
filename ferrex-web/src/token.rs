use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    account::{AccessToken, Account, AccountToken},
    api_routes::v1,
    context::RequestContext,
    descriptor::ResourcePath,
    error::TokenError,
};

/// Outcome of resolving the access token for one request
#[derive(Debug)]
pub enum TokenResolution {
    /// No account; requests go out unauthenticated.
    Guest,
    /// The stored access token is still good.
    Current(AccessToken),
    /// The access token was refreshed during this request. The new token
    /// must reach the client so it can patch its stored account.
    Refreshed(AccountToken),
    Failed(TokenError),
}

impl TokenResolution {
    /// `(token to fetch with, refreshed token to hand back, error)`
    pub fn into_parts(self) -> (Option<AccessToken>, Option<AccountToken>, Option<TokenError>) {
        match self {
            Self::Guest => (None, None, None),
            Self::Current(token) => (Some(token), None, None),
            Self::Refreshed(token) => (Some(token.access_token.clone()), Some(token), None),
            Self::Failed(err) => (None, None, Some(err)),
        }
    }
}

#[async_trait]
pub trait TokenResolver: Send + Sync {
    async fn resolve(&self, cx: &RequestContext, account: Option<&Account>) -> TokenResolution;
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: u32,
}

/// Uses the stored token while it is valid, refreshes it otherwise.
#[derive(Debug, Clone)]
pub struct RefreshingTokenResolver {
    client: reqwest::Client,
    skew: Duration,
}

impl RefreshingTokenResolver {
    pub const DEFAULT_SKEW_SECS: i64 = 30;

    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            skew: Duration::seconds(Self::DEFAULT_SKEW_SECS),
        }
    }

    pub fn with_skew(mut self, skew: Duration) -> Self {
        self.skew = skew;
        self
    }

    async fn refresh(
        &self,
        cx: &RequestContext,
        current: &AccountToken,
    ) -> Result<AccountToken, TokenError> {
        let refresh_token = current
            .refresh_token
            .as_deref()
            .ok_or(TokenError::RefreshTokenMissing)?;
        let url = cx.api_url(&ResourcePath::parse(v1::auth::REFRESH))?;

        let response = self
            .client
            .post(url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(TokenError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TokenError::Rejected(status.as_u16()));
        }

        let body: RefreshResponse = response.json().await.map_err(TokenError::Transport)?;
        Ok(AccountToken {
            access_token: AccessToken::new(body.access_token),
            // Servers that do not rotate refresh tokens omit the field
            refresh_token: body.refresh_token.or_else(|| current.refresh_token.clone()),
            expires_at: Utc::now() + Duration::seconds(i64::from(body.expires_in)),
        })
    }
}

#[async_trait]
impl TokenResolver for RefreshingTokenResolver {
    async fn resolve(&self, cx: &RequestContext, account: Option<&Account>) -> TokenResolution {
        let Some(account) = account else {
            return TokenResolution::Guest;
        };

        if account.token.is_valid_at(Utc::now(), self.skew) {
            return TokenResolution::Current(account.token.access_token.clone());
        }

        match self.refresh(cx, &account.token).await {
            Ok(token) => {
                tracing::debug!(account_id = %account.id, "access token refreshed");
                TokenResolution::Refreshed(token)
            }
            Err(err) => TokenResolution::Failed(err),
        }
    }
}
