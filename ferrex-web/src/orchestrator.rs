//! Server-side fetch orchestration
//!
//! [`SsrOrchestrator::render_payload`] runs once per server-rendered
//! request, in this order:
//!
//! 1. shuffle the page's random items
//! 2. read the signed account cookie (absent or invalid means guest)
//! 3. resolve descriptors, adding the current-user profile for accounts
//! 4. resolve the access token; on failure the payload carries `ssrError`
//!    and nothing is fetched
//! 5. run the batched fetch; on failure the payload is degraded
//! 6. merge the fetched profile into the cookie account
//! 7. read the theme cookie and assemble the payload
//!
//! It never returns an error. Every failure, panics included, ends in a
//! payload the client can still render.

use std::{any::Any, fmt, panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use serde_json::Map;
use tracing::Span;

use crate::{
    account::Account,
    api_routes::v1,
    cache::{QueryCache, QueryClient},
    context::RequestContext,
    cookie::{CookieValidator, read_auth_cookie},
    descriptor::ResourcePath,
    error::SsrAbort,
    page::Page,
    payload::{SsrFailure, TransportablePayload},
    random::RandomItemAssignment,
    resolver::{current_user_descriptor, resolve_descriptors},
    theme::{ThemePreference, read_theme_cookie},
    token::TokenResolver,
};

/// Cookie names the orchestrator reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieNames {
    pub account: String,
    pub theme: String,
}

impl Default for CookieNames {
    fn default() -> Self {
        Self {
            account: "ferrex_account".into(),
            theme: "ferrex_theme".into(),
        }
    }
}

#[derive(Clone)]
pub struct SsrOrchestrator {
    query_client: Arc<dyn QueryClient>,
    token_resolver: Arc<dyn TokenResolver>,
    validator: Arc<dyn CookieValidator>,
    cookies: CookieNames,
}

impl fmt::Debug for SsrOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsrOrchestrator")
            .field("cookies", &self.cookies)
            .finish_non_exhaustive()
    }
}

impl SsrOrchestrator {
    pub fn new(
        query_client: Arc<dyn QueryClient>,
        token_resolver: Arc<dyn TokenResolver>,
        validator: Arc<dyn CookieValidator>,
    ) -> Self {
        Self {
            query_client,
            token_resolver,
            validator,
            cookies: CookieNames::default(),
        }
    }

    pub fn with_cookie_names(mut self, cookies: CookieNames) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn cookie_names(&self) -> &CookieNames {
        &self.cookies
    }

    #[tracing::instrument(
        name = "ssr",
        skip_all,
        fields(page = page.display_name(), guest = tracing::field::Empty)
    )]
    pub async fn render_payload(
        &self,
        cx: &RequestContext,
        page: &dyn Page,
    ) -> TransportablePayload {
        let theme = read_theme_cookie(cx.cookie_header(), &self.cookies.theme);
        let mut random_items = RandomItemAssignment::new();

        let outcome = AssertUnwindSafe(self.orchestrate(cx, page, &mut random_items, theme))
            .catch_unwind()
            .await;

        let abort = match outcome {
            Ok(Ok(payload)) => return payload,
            Ok(Err(abort)) => abort,
            Err(panic) => SsrAbort::Panicked(panic_message(panic.as_ref())),
        };

        tracing::error!(
            failure = "ssr_aborted",
            error = %abort,
            "server-side fetch aborted, rendering without SSR data"
        );
        TransportablePayload::degraded(random_items, theme)
    }

    async fn orchestrate(
        &self,
        cx: &RequestContext,
        page: &dyn Page,
        random_items: &mut RandomItemAssignment,
        theme: ThemePreference,
    ) -> Result<TransportablePayload, SsrAbort> {
        random_items.assign_page(page);

        let account = read_auth_cookie(
            cx.cookie_header(),
            &self.cookies.account,
            self.validator.as_ref(),
        );
        Span::current().record("guest", account.is_none());

        let mut descriptors = resolve_descriptors(page, cx.route_params(), random_items)?;
        if account.is_some() {
            descriptors.push(current_user_descriptor());
        }

        let (token, refreshed, token_error) = self
            .token_resolver
            .resolve(cx, account.as_ref())
            .await
            .into_parts();

        if let Some(err) = token_error {
            let failure = SsrFailure::from_token_error(&err);
            tracing::warn!(
                failure = "auth_refresh_failed",
                kind = %failure.kind,
                error = %err,
                "token resolution failed, skipping fetch"
            );
            return Ok(TransportablePayload {
                ssr_error: Some(failure),
                ..TransportablePayload::degraded(random_items.clone(), theme)
            });
        }

        let cache = match self
            .query_client
            .fetch_batch(cx, &descriptors, token.as_ref())
            .await
        {
            Ok(cache) => cache,
            Err(err) => {
                tracing::error!(
                    failure = "batch_fetch_failed",
                    descriptor_count = descriptors.len(),
                    error = %err,
                    "batched fetch failed, rendering without SSR data"
                );
                return Ok(TransportablePayload::degraded(random_items.clone(), theme));
            }
        };

        tracing::debug!(
            descriptor_count = descriptors.len(),
            cached = cache.len(),
            refreshed = refreshed.is_some(),
            "SSR fetch complete"
        );

        Ok(TransportablePayload {
            query_state: Some(cache.dehydrate()),
            ssr_error: None,
            token: refreshed,
            random_items: random_items.clone(),
            account: account.map(|account| merge_current_user(account, &cache)),
            theme,
            page_props: Map::new(),
        })
    }
}

/// Cookie account overlaid with the fetched `/users/me` profile. Keeps the
/// cookie account unchanged if the profile is missing or unusable.
fn merge_current_user(account: Account, cache: &QueryCache) -> Account {
    let Some(profile) = cache.get(&ResourcePath::parse(v1::users::CURRENT)) else {
        return account;
    };
    match account.merge_profile(profile) {
        Ok(merged) => merged,
        Err(err) => {
            tracing::warn!(
                account_id = %account.id,
                error = %err,
                "profile does not merge into account, keeping cookie copy"
            );
            account
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
