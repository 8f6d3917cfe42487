use chrono::{Duration, Utc};

use crate::{
    account::{AccessToken, Account},
    cache::{QueryCache, QueryClient},
    context::RequestContext,
    error::NavigationError,
    page::{Page, PageContext, RouteParams},
    payload::SsrFailure,
    random::RandomItemAssignment,
    resolver::resolve_descriptors,
    theme::Theme,
};

/// Browser-side state left behind by hydration.
///
/// Lives for the whole document. Client-side navigations reuse its cache
/// and only fetch what is missing or stale.
#[derive(Debug, Clone)]
pub struct ClientRuntime {
    cache: QueryCache,
    random_items: RandomItemAssignment,
    theme: Theme,
    account: Option<Account>,
    ssr_error: Option<SsrFailure>,
    stale_after: Option<Duration>,
}

impl ClientRuntime {
    pub fn new(cache: QueryCache, random_items: RandomItemAssignment, theme: Theme) -> Self {
        Self {
            cache,
            random_items,
            theme,
            account: None,
            ssr_error: None,
            stale_after: None,
        }
    }

    pub fn with_account(mut self, account: Option<Account>) -> Self {
        self.account = account;
        self
    }

    pub fn with_ssr_error(mut self, error: Option<SsrFailure>) -> Self {
        self.ssr_error = error;
        self
    }

    /// Refetch cached entries older than `max_age` on navigation. Entries
    /// never go stale by default.
    pub fn with_stale_after(mut self, max_age: Duration) -> Self {
        self.stale_after = Some(max_age);
        self
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn random_items(&self) -> &RandomItemAssignment {
        &self.random_items
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    pub fn ssr_error(&self) -> Option<&SsrFailure> {
        self.ssr_error.as_ref()
    }

    pub fn page_context<'a>(&'a self, params: &'a RouteParams) -> PageContext<'a> {
        PageContext {
            params,
            cache: &self.cache,
            random_items: &self.random_items,
            account: self.account.as_ref(),
            theme: self.theme,
        }
    }

    /// Prepare a client-side navigation to `page`.
    ///
    /// Pages shuffled on the server keep that order; pages first seen here
    /// are shuffled once for the rest of the runtime. Returns how many
    /// resources were fetched.
    pub async fn navigate(
        &mut self,
        client: &dyn QueryClient,
        cx: &RequestContext,
        page: &dyn Page,
        token: Option<&AccessToken>,
    ) -> Result<usize, NavigationError> {
        self.random_items.assign_page(page);

        let descriptors = resolve_descriptors(page, cx.route_params(), &self.random_items)?;
        let missing = self.cache.missing(&descriptors, self.stale_after, Utc::now());
        if missing.is_empty() {
            tracing::debug!(page = page.display_name(), "navigation served from cache");
            return Ok(0);
        }

        let fetched = client.fetch_batch(cx, &missing, token).await?;
        let count = fetched.len();
        self.cache.merge(fetched);
        tracing::debug!(page = page.display_name(), fetched = count, "navigation fetched");
        Ok(count)
    }
}
