//! Render composition shell
//!
//! Wraps a page in the providers shared by server render and hydrated
//! client, outermost first:
//!
//! style registry, head, query cache, account, hydration boundary, theme,
//! portal host, snackbar host, connection gate, then the page (inside its
//! layout) followed by the tooltip host.

use crate::{
    account::Account,
    cache::QueryCache,
    client::ClientRuntime,
    connection::{ConnectionError, ConnectionErrorState},
    page::{Page, PageContext, RouteParams, resolve_layout},
    payload::SsrFailure,
    random::RandomItemAssignment,
    theme::Theme,
    view::{HeadMeta, Provider, View},
};

/// Inputs of one shell composition
#[derive(Debug, Clone, Copy)]
pub struct AppProps<'a> {
    pub head: &'a HeadMeta,
    pub params: &'a RouteParams,
    pub cache: &'a QueryCache,
    pub random_items: &'a RandomItemAssignment,
    pub account: Option<&'a Account>,
    pub ssr_error: Option<&'a SsrFailure>,
    pub theme: Theme,
    pub connection: &'a ConnectionErrorState,
}

impl<'a> AppProps<'a> {
    /// Props for a page rendered from a hydrated client runtime.
    pub fn from_runtime(
        runtime: &'a ClientRuntime,
        head: &'a HeadMeta,
        params: &'a RouteParams,
        connection: &'a ConnectionErrorState,
    ) -> Self {
        Self {
            head,
            params,
            cache: runtime.cache(),
            random_items: runtime.random_items(),
            account: runtime.account(),
            ssr_error: runtime.ssr_error(),
            theme: runtime.theme(),
            connection,
        }
    }

    fn page_context(&self) -> PageContext<'a> {
        PageContext {
            params: self.params,
            cache: self.cache,
            random_items: self.random_items,
            account: self.account,
            theme: self.theme,
        }
    }
}

pub fn compose(page: &dyn Page, props: &AppProps<'_>) -> View {
    let public = page.is_public();
    let error = props.connection.error.clone();

    let content = match &error {
        Some(error) if !public => connection_error_view(error),
        _ => {
            let cx = props.page_context();
            let layout = page.layout();
            resolve_layout(layout.as_ref(), page.render(&cx), &cx)
        }
    };

    let gated = View::provider(
        Provider::ConnectionGate { error, public },
        View::Fragment(vec![content, tooltip_host()]),
    );

    [
        Provider::SnackbarHost,
        Provider::PortalHost,
        Provider::Theme(props.theme),
        Provider::Hydration {
            snapshot: props.cache.dehydrate(),
        },
        Provider::Account {
            account: props.account.cloned(),
            ssr_error: props.ssr_error.cloned(),
        },
        Provider::QueryCache {
            entries: props.cache.len(),
        },
        Provider::Head(props.head.clone()),
        Provider::StyleRegistry,
    ]
    .into_iter()
    .fold(gated, |inner, provider| View::provider(provider, inner))
}

fn tooltip_host() -> View {
    View::element("div").attr("id", "tooltip-root")
}

fn connection_error_view(error: &ConnectionError) -> View {
    View::element("main")
        .attr("class", "connection-error")
        .attr("role", "alert")
        .children([
            View::element("h1").child(View::text("Unable to reach the Ferrex server")),
            View::element("p").child(View::text(error.message.clone())),
            View::element("p").child(View::text(format!(
                "Offline since {}",
                error.since.format("%Y-%m-%d %H:%M UTC")
            ))),
        ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct Dashboard {
        public: bool,
    }

    impl Page for Dashboard {
        fn display_name(&self) -> &str {
            "Dashboard"
        }

        fn is_public(&self) -> bool {
            self.public
        }

        fn render(&self, _cx: &PageContext<'_>) -> View {
            View::element("main").child(View::text("dashboard content"))
        }
    }

    fn compose_with(page: &dyn Page, connection: &ConnectionErrorState) -> View {
        let head = HeadMeta::default();
        let params = RouteParams::new();
        let cache = QueryCache::new();
        let random_items = RandomItemAssignment::new();
        compose(
            page,
            &AppProps {
                head: &head,
                params: &params,
                cache: &cache,
                random_items: &random_items,
                account: None,
                ssr_error: None,
                theme: Theme::Dark,
                connection,
            },
        )
    }

    fn broken() -> ConnectionErrorState {
        ConnectionErrorState {
            error: Some(ConnectionError {
                message: "connection refused".into(),
                since: Utc::now(),
            }),
        }
    }

    #[test]
    fn providers_nest_in_fixed_order() {
        let view = compose_with(&Dashboard { public: false }, &ConnectionErrorState::default());
        let names: Vec<_> = view.provider_chain().iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            [
                "style-registry",
                "head",
                "query-cache",
                "account",
                "hydration",
                "theme",
                "portal-host",
                "snackbar-host",
                "connection-gate",
            ]
        );
        assert!(view.text_content().contains("dashboard content"));
    }

    #[test]
    fn private_page_is_replaced_while_disconnected() {
        let view = compose_with(&Dashboard { public: false }, &broken());
        let text = view.text_content();
        assert!(text.contains("Unable to reach the Ferrex server"));
        assert!(!text.contains("dashboard content"));
    }

    #[test]
    fn public_page_renders_while_disconnected() {
        let view = compose_with(&Dashboard { public: true }, &broken());
        let text = view.text_content();
        assert!(text.contains("dashboard content"));
        assert!(!text.contains("Unable to reach"));
    }
}
