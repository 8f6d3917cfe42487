//! Minimal view tree rendered to HTML on the server
//!
//! Pages and layouts return [`View`] values; the shell wraps them in
//! [`Provider`] nodes. Providers are transparent in the markup except for
//! the hosts that own a mount point (portals, snackbars) and the theme,
//! which tags its subtree.

use std::fmt::Write as _;

use crate::{
    account::Account,
    cache::CacheSnapshot,
    connection::ConnectionError,
    payload::SsrFailure,
    theme::Theme,
};

/// Document head metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadMeta {
    pub title: String,
    pub description: Option<String>,
}

/// Cross-cutting wrappers placed around every page
#[derive(Debug, Clone, PartialEq)]
pub enum Provider {
    StyleRegistry,
    Head(HeadMeta),
    QueryCache {
        entries: usize,
    },
    Account {
        account: Option<Account>,
        ssr_error: Option<SsrFailure>,
    },
    Hydration {
        snapshot: CacheSnapshot,
    },
    Theme(Theme),
    PortalHost,
    SnackbarHost,
    ConnectionGate {
        error: Option<ConnectionError>,
        public: bool,
    },
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StyleRegistry => "style-registry",
            Self::Head(_) => "head",
            Self::QueryCache { .. } => "query-cache",
            Self::Account { .. } => "account",
            Self::Hydration { .. } => "hydration",
            Self::Theme(_) => "theme",
            Self::PortalHost => "portal-host",
            Self::SnackbarHost => "snackbar-host",
            Self::ConnectionGate { .. } => "connection-gate",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Element {
        tag: &'static str,
        attrs: Vec<(String, String)>,
        children: Vec<View>,
    },
    Text(String),
    Fragment(Vec<View>),
    Provider(Provider, Box<View>),
}

impl View {
    pub fn element(tag: &'static str) -> Self {
        Self::Element {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn empty() -> Self {
        Self::Fragment(Vec::new())
    }

    pub fn provider(provider: Provider, child: View) -> Self {
        Self::Provider(provider, Box::new(child))
    }

    /// Add an attribute. No-op on anything but an element.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Element { attrs, .. } = &mut self {
            attrs.push((name.into(), value.into()));
        }
        self
    }

    /// Append a child. Fragments grow, elements nest, anything else is
    /// turned into a fragment.
    pub fn child(self, child: View) -> Self {
        match self {
            Self::Element {
                tag,
                attrs,
                mut children,
            } => {
                children.push(child);
                Self::Element {
                    tag,
                    attrs,
                    children,
                }
            }
            Self::Fragment(mut children) => {
                children.push(child);
                Self::Fragment(children)
            }
            other => Self::Fragment(vec![other, child]),
        }
    }

    pub fn children(self, children: impl IntoIterator<Item = View>) -> Self {
        children.into_iter().fold(self, Self::child)
    }

    /// Providers from the outermost inwards, following the single-child
    /// provider spine.
    pub fn provider_chain(&self) -> Vec<&Provider> {
        let mut chain = Vec::new();
        let mut node = self;
        while let Self::Provider(provider, child) = node {
            chain.push(provider);
            node = child;
        }
        chain
    }

    /// Concatenated text content, for assertions and summaries.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Element { children, .. } | Self::Fragment(children) => {
                for child in children {
                    child.collect_text(out);
                }
            }
            Self::Provider(_, child) => child.collect_text(out),
        }
    }

    pub fn find_provider(&self, name: &str) -> Option<&Provider> {
        match self {
            Self::Provider(provider, child) => {
                if provider.name() == name {
                    Some(provider)
                } else {
                    child.find_provider(name)
                }
            }
            Self::Element { children, .. } | Self::Fragment(children) => {
                children.iter().find_map(|child| child.find_provider(name))
            }
            Self::Text(_) => None,
        }
    }
}

/// Render a view tree to HTML markup.
pub fn render_html(view: &View) -> String {
    let mut out = String::new();
    write_view(view, &mut out);
    out
}

fn write_view(view: &View, out: &mut String) {
    match view {
        View::Text(text) => out.push_str(&escape_html(text)),
        View::Fragment(children) => {
            for child in children {
                write_view(child, out);
            }
        }
        View::Element {
            tag,
            attrs,
            children,
        } => {
            let _ = write!(out, "<{tag}");
            for (name, value) in attrs {
                let _ = write!(out, " {}=\"{}\"", name, escape_html(value));
            }
            out.push('>');
            if is_void(tag) {
                return;
            }
            for child in children {
                write_view(child, out);
            }
            let _ = write!(out, "</{tag}>");
        }
        View::Provider(provider, child) => match provider {
            Provider::Theme(theme) => {
                let _ = write!(out, "<div data-theme=\"{theme}\">");
                write_view(child, out);
                out.push_str("</div>");
            }
            Provider::PortalHost => {
                write_view(child, out);
                out.push_str("<div id=\"portal-root\"></div>");
            }
            Provider::SnackbarHost => {
                write_view(child, out);
                out.push_str(
                    "<div id=\"snackbar-root\" role=\"status\" aria-live=\"polite\"></div>",
                );
            }
            _ => write_view(child, out),
        },
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "br" | "hr" | "img" | "input" | "link" | "meta")
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
