//! Client-side hydration bootstrap
//!
//! Runs once per document load. Rebuilds the query cache from the
//! payload, reconciles a token the server refreshed mid-request into the
//! persisted account, and resolves the theme the same way the server did.

use std::{fmt, sync::Arc};

use crate::{
    account::{AccountPatch, AccountStore, AccountToken},
    cache::QueryCache,
    client::ClientRuntime,
    error::PayloadError,
    payload::{PayloadCodec, TransportablePayload},
    theme::ThemeResolver,
};

pub struct HydrationBootstrap {
    store: Arc<dyn AccountStore>,
    theme_resolver: Arc<dyn ThemeResolver>,
    codec: PayloadCodec,
}

impl fmt::Debug for HydrationBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HydrationBootstrap").finish_non_exhaustive()
    }
}

impl HydrationBootstrap {
    pub fn new(store: Arc<dyn AccountStore>, theme_resolver: Arc<dyn ThemeResolver>) -> Self {
        Self {
            store,
            theme_resolver,
            codec: PayloadCodec,
        }
    }

    /// Extract the embedded payload from a server document and hydrate it.
    pub async fn hydrate_document(&self, html: &str) -> Result<ClientRuntime, PayloadError> {
        let payload = self.codec.extract(html)?;
        Ok(self.hydrate(payload).await)
    }

    /// Store failures are logged; hydration itself cannot fail.
    pub async fn hydrate(&self, payload: TransportablePayload) -> ClientRuntime {
        let TransportablePayload {
            query_state,
            ssr_error,
            token,
            random_items,
            account,
            theme,
            page_props: _,
        } = payload;

        let cache = query_state.map(QueryCache::hydrate).unwrap_or_default();

        if let Some(token) = token {
            self.reconcile_token(token).await;
        }

        let theme = self.theme_resolver.resolve(theme);
        tracing::debug!(
            cached = cache.len(),
            %theme,
            ssr_error = ssr_error.is_some(),
            "hydrated"
        );

        ClientRuntime::new(cache, random_items, theme)
            .with_account(account)
            .with_ssr_error(ssr_error)
    }

    /// Patch the refreshed token into the locally stored account. Without
    /// a local account there is nothing to attach it to.
    async fn reconcile_token(&self, token: AccountToken) {
        let account = match self.store.current_account().await {
            Ok(Some(account)) => account,
            Ok(None) => {
                tracing::debug!("refreshed token ignored, no local account");
                return;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to read local account");
                return;
            }
        };

        if let Err(err) = self
            .store
            .update_account(&account.id, AccountPatch::token(token))
            .await
        {
            tracing::warn!(
                account_id = %account.id,
                error = %err,
                "failed to store refreshed token"
            );
        }
    }
}
