//! # Ferrex Web
//!
//! Bootstrap layer of the Ferrex web client. Every page request passes
//! through here twice: once on the server, where the data a page needs is
//! fetched and serialized into a transportable payload, and once in the
//! browser, where that payload is turned back into a warm query cache.
//!
//! ## Overview
//!
//! - [`resolver`] works out which API resources a page (and its layout)
//!   needs.
//! - [`orchestrator::SsrOrchestrator`] runs once per server render: it reads
//!   the signed account cookie, resolves or refreshes the access token,
//!   performs the batched fetch and builds a
//!   [`payload::TransportablePayload`]. It never fails; problems degrade to a
//!   payload the client can still render.
//! - [`hydration::HydrationBootstrap`] runs once per document load in the
//!   client: it rehydrates the cache, reconciles a token refreshed during SSR
//!   into the local account store and resolves the theme.
//! - [`shell`] wraps the page in the provider tree shared by both sides.
//!
//! Collaborators that live elsewhere (HTTP transport, account persistence,
//! theme computation) are consumed through the traits in [`cache`],
//! [`account`], [`token`] and [`theme`], each shipped with a concrete
//! implementation the server host uses.

pub mod account;
pub mod api_routes;
pub mod cache;
pub mod client;
pub mod connection;
pub mod context;
pub mod cookie;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod http;
pub mod hydration;
pub mod models;
pub mod orchestrator;
pub mod page;
pub mod payload;
pub mod random;
pub mod resolver;
pub mod shell;
pub mod store;
pub mod theme;
pub mod token;
pub mod view;

pub use account::{AccessToken, Account, AccountPatch, AccountStore, AccountToken};
pub use cache::{CacheSnapshot, QueryCache, QueryClient};
pub use client::ClientRuntime;
pub use connection::{ConnectionError, ConnectionErrorState, ConnectionMonitor};
pub use context::RequestContext;
pub use cookie::{CookieValidator, SignedCookie, read_auth_cookie};
pub use descriptor::{ResourceDescriptor, ResourcePath, ResponseParser};
pub use error::{
    CookieError, DescriptorError, FetchError, NavigationError, ParseError, PayloadError, StoreError,
    TokenError,
};
pub use http::HttpQueryClient;
pub use hydration::HydrationBootstrap;
pub use orchestrator::{CookieNames, SsrOrchestrator};
pub use page::{Layout, LayoutComponent, Page, PageContext, RouteParams};
pub use payload::{PayloadCodec, SsrErrorKind, SsrFailure, TransportablePayload};
pub use random::RandomItemAssignment;
pub use store::{FileAccountStore, MemoryAccountStore};
pub use theme::{SystemThemeResolver, Theme, ThemePreference, ThemeResolver};
pub use token::{RefreshingTokenResolver, TokenResolution, TokenResolver};
pub use view::View;
