use std::{fmt, sync::Arc};

use anyhow::Context;
use ferrex_web::{
    ConnectionMonitor, HttpQueryClient, PayloadCodec, RefreshingTokenResolver, SignedCookie,
    SsrOrchestrator,
};

use crate::{config::WebConfig, pages::PageRegistry};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WebConfig>,
    pub orchestrator: Arc<SsrOrchestrator>,
    pub pages: Arc<PageRegistry>,
    pub connection: ConnectionMonitor,
    pub cookie_signer: Arc<SignedCookie>,
    pub codec: PayloadCodec,
    /// Shared HTTP client for the token resolver and the connection probe
    pub http: reqwest::Client,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("pages", &self.pages)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire the SSR pipeline from configuration with the standard pages.
    pub fn from_config(config: WebConfig) -> anyhow::Result<Self> {
        Self::with_pages(config, PageRegistry::standard())
    }

    pub fn with_pages(config: WebConfig, pages: PageRegistry) -> anyhow::Result<Self> {
        let query_client = HttpQueryClient::new(config.api.request_timeout)
            .context("failed to build API client")?;
        let http = query_client.client().clone();

        let cookie_signer = Arc::new(
            SignedCookie::new(&config.cookies.signing_secret)
                .context("invalid cookie signing secret")?,
        );

        let orchestrator = SsrOrchestrator::new(
            Arc::new(query_client),
            Arc::new(RefreshingTokenResolver::new(http.clone())),
            cookie_signer.clone(),
        )
        .with_cookie_names(config.cookies.names());

        Ok(Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            pages: Arc::new(pages),
            connection: ConnectionMonitor::new(),
            cookie_signer,
            codec: PayloadCodec,
            http,
        })
    }
}
