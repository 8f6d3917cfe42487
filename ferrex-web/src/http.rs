use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::{Client, header};
use serde_json::Value;

use crate::{
    account::AccessToken,
    cache::{QueryCache, QueryClient},
    context::RequestContext,
    descriptor::ResourceDescriptor,
    error::FetchError,
};

/// [`QueryClient`] over reqwest.
///
/// One GET per distinct path, issued concurrently. The first failure wins
/// and the rest of the batch is dropped.
#[derive(Debug, Clone)]
pub struct HttpQueryClient {
    client: Client,
}

impl HttpQueryClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn fetch_one(
        &self,
        cx: &RequestContext,
        descriptor: &ResourceDescriptor,
        token: Option<&AccessToken>,
    ) -> Result<Value, FetchError> {
        let path = descriptor.path();
        let url = cx.api_url(path)?;
        tracing::trace!(%url, "GET");

        let mut request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token.as_str());
        }

        let response = request.send().await.map_err(|source| FetchError::Transport {
            path: path.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                path: path.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let raw: Value = response.json().await.map_err(|source| FetchError::Transport {
            path: path.clone(),
            source,
        })?;

        descriptor
            .parser()
            .parse(raw)
            .map_err(|source| FetchError::Parse {
                path: path.clone(),
                source,
            })
    }
}

#[async_trait]
impl QueryClient for HttpQueryClient {
    async fn fetch_batch(
        &self,
        cx: &RequestContext,
        descriptors: &[ResourceDescriptor],
        token: Option<&AccessToken>,
    ) -> Result<QueryCache, FetchError> {
        let mut seen = HashSet::new();
        let unique: Vec<&ResourceDescriptor> = descriptors
            .iter()
            .filter(|descriptor| seen.insert(descriptor.path()))
            .collect();

        tracing::debug!(
            descriptor_count = descriptors.len(),
            request_count = unique.len(),
            authenticated = token.is_some(),
            "fetching batch"
        );

        let bodies = try_join_all(
            unique
                .iter()
                .map(|descriptor| self.fetch_one(cx, descriptor, token)),
        )
        .await?;

        let mut cache = QueryCache::new();
        for (descriptor, body) in unique.into_iter().zip(bodies) {
            cache.insert(descriptor.path().clone(), body);
        }
        Ok(cache)
    }
}
