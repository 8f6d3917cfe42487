#![allow(dead_code)]

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ferrex_web::{
    AccessToken, Account, AccountToken, FetchError, Layout, LayoutComponent,
    Page, PageContext, QueryCache, QueryClient, RequestContext,
    ResourceDescriptor, ResourcePath, ResponseParser, RouteParams,
    TokenError, TokenResolution, TokenResolver, View,
    api_routes::v1,
    page::{DescriptorResult, LayoutProps},
    random::RandomItemAssignment,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use url::Url;

pub const ACCOUNT_COOKIE: &str = "ferrex_account";
pub const SECRET: &str = "test-secret";

pub fn api_base() -> Url {
    Url::parse("http://ferrex-server.test/").expect("valid url")
}

pub fn request(cookie_header: Option<String>) -> RequestContext {
    RequestContext::new(api_base()).with_cookie_header(cookie_header)
}

pub fn token(access: &str, expires_at: DateTime<Utc>) -> AccountToken {
    AccountToken {
        access_token: AccessToken::new(access),
        refresh_token: Some(format!("{access}-refresh")),
        expires_at,
    }
}

pub fn fresh_token(access: &str) -> AccountToken {
    token(access, Utc::now() + Duration::hours(1))
}

/// `{ id: "42", name: "old", token: T0 }`
pub fn alice() -> Account {
    Account::new("42", fresh_token("T0")).with_field("name", json!("old"))
}

/// One recorded `fetch_batch` call
#[derive(Debug, Clone, PartialEq)]
pub struct FetchCall {
    pub paths: Vec<String>,
    pub token: Option<String>,
}

/// Serves canned bodies per path and records every batch.
#[derive(Debug, Default)]
pub struct RecordingQueryClient {
    bodies: HashMap<String, Value>,
    fail_with_status: Option<u16>,
    calls: Mutex<Vec<FetchCall>>,
}

impl RecordingQueryClient {
    pub fn new() -> Self {
        Self::default()
            .with_body(
                v1::server::INFO,
                json!({ "name": "Ferrex", "version": "0.1.0", "guest_access": true }),
            )
            .with_body(
                v1::libraries::COLLECTION,
                json!([{ "id": "1", "name": "Movies", "media_count": 3 }]),
            )
            .with_body(v1::users::CURRENT, json!({ "name": "Alice" }))
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_with_status: Some(status),
            ..Self::new()
        }
    }

    pub fn with_body(mut self, path: &str, body: Value) -> Self {
        self.bodies.insert(ResourcePath::parse(path).to_string(), body);
        self
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl QueryClient for RecordingQueryClient {
    async fn fetch_batch(
        &self,
        _cx: &RequestContext,
        descriptors: &[ResourceDescriptor],
        token: Option<&AccessToken>,
    ) -> Result<QueryCache, FetchError> {
        self.calls.lock().push(FetchCall {
            paths: descriptors.iter().map(|d| d.path().to_string()).collect(),
            token: token.map(|t| t.as_str().to_owned()),
        });

        let mut cache = QueryCache::new();
        for descriptor in descriptors {
            let path = descriptor.path();
            if let Some(status) = self.fail_with_status {
                return Err(FetchError::Status {
                    path: path.clone(),
                    status,
                    body: "upstream unavailable".into(),
                });
            }
            let body = self.bodies.get(&path.to_string()).cloned().unwrap_or(Value::Null);
            let parsed = descriptor
                .parser()
                .parse(body)
                .map_err(|source| FetchError::Parse {
                    path: path.clone(),
                    source,
                })?;
            cache.insert(path.clone(), parsed);
        }
        Ok(cache)
    }
}

#[derive(Debug, Clone)]
pub enum TokenScript {
    /// Behave like a real resolver with valid tokens
    PassThrough,
    Refresh(AccountToken),
    Reject(u16),
}

#[derive(Debug)]
pub struct ScriptedTokenResolver {
    script: TokenScript,
    seen: Mutex<Vec<Option<String>>>,
}

impl ScriptedTokenResolver {
    pub fn new(script: TokenScript) -> Self {
        Self {
            script,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Account ids the resolver was asked about
    pub fn seen(&self) -> Vec<Option<String>> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl TokenResolver for ScriptedTokenResolver {
    async fn resolve(&self, _cx: &RequestContext, account: Option<&Account>) -> TokenResolution {
        self.seen.lock().push(account.map(|a| a.id.clone()));
        let Some(account) = account else {
            return TokenResolution::Guest;
        };
        match &self.script {
            TokenScript::PassThrough => {
                TokenResolution::Current(account.token.access_token.clone())
            }
            TokenScript::Refresh(token) => TokenResolution::Refreshed(token.clone()),
            TokenScript::Reject(status) => TokenResolution::Failed(TokenError::Rejected(*status)),
        }
    }
}

/// Home-like page with featured items and a library list
pub struct FeaturedPage;

impl Page for FeaturedPage {
    fn display_name(&self) -> &str {
        "Home"
    }

    fn fetch_urls(
        &self,
        _params: &RouteParams,
        _random: &RandomItemAssignment,
    ) -> DescriptorResult {
        Ok(Some(vec![ResourceDescriptor::new(
            v1::libraries::COLLECTION,
            ResponseParser::any(),
        )]))
    }

    fn random_items(&self) -> Option<Vec<Value>> {
        Some((1..=12).map(|n| json!({ "id": n })).collect())
    }

    fn render(&self, cx: &PageContext<'_>) -> View {
        let ids: Vec<String> = cx
            .random_items_for(self.display_name())
            .iter()
            .map(|item| item["id"].to_string())
            .collect();
        View::element("ol").child(View::text(ids.join(",")))
    }
}

/// Page whose descriptor function panics
pub struct ExplodingPage;

impl Page for ExplodingPage {
    fn display_name(&self) -> &str {
        "Exploding"
    }

    fn fetch_urls(
        &self,
        _params: &RouteParams,
        _random: &RandomItemAssignment,
    ) -> DescriptorResult {
        panic!("descriptor function blew up");
    }

    fn render(&self, _cx: &PageContext<'_>) -> View {
        View::empty()
    }
}

pub struct Sidebar;

impl LayoutComponent for Sidebar {
    fn name(&self) -> &str {
        "Sidebar"
    }

    fn fetch_urls(
        &self,
        _params: &RouteParams,
        _random: &RandomItemAssignment,
    ) -> DescriptorResult {
        Ok(Some(vec![ResourceDescriptor::new(
            v1::libraries::COLLECTION,
            ResponseParser::any(),
        )]))
    }

    fn render(&self, page: View, _props: &LayoutProps, _cx: &PageContext<'_>) -> View {
        View::element("aside").child(page)
    }
}

/// Library detail page using the sidebar layout
pub struct LibraryPage;

impl Page for LibraryPage {
    fn display_name(&self) -> &str {
        "Library"
    }

    fn fetch_urls(&self, params: &RouteParams, _random: &RandomItemAssignment) -> DescriptorResult {
        let id = params.get("id").cloned().unwrap_or_default();
        Ok(Some(vec![ResourceDescriptor::new(
            ResourcePath::parse(v1::libraries::ITEM).with_param("id", id),
            ResponseParser::any(),
        )]))
    }

    fn layout(&self) -> Option<Layout> {
        Some(Layout::bare(Sidebar))
    }

    fn render(&self, _cx: &PageContext<'_>) -> View {
        View::empty()
    }
}
