//! Page and layout capability interfaces
//!
//! Every capability a page may declare is an explicit trait method with a
//! default meaning "not declared", so callers test for presence instead of
//! probing the page's shape.

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{
    account::Account,
    cache::QueryCache,
    descriptor::{ResourceDescriptor, ResourcePath},
    error::DescriptorError,
    random::RandomItemAssignment,
    theme::Theme,
    view::View,
};

/// Captured route parameters, e.g. `{"id": "7"}` for `/library/{id}`
pub type RouteParams = BTreeMap<String, String>;

/// `Ok(None)` means the component does not declare any resources.
pub type DescriptorResult = Result<Option<Vec<ResourceDescriptor>>, DescriptorError>;

/// A routable page.
pub trait Page: Send + Sync {
    /// Stable identifier; also keys the page's random-item ordering.
    fn display_name(&self) -> &str;

    /// Resources the page needs before it can render.
    fn fetch_urls(
        &self,
        _params: &RouteParams,
        _random_items: &RandomItemAssignment,
    ) -> DescriptorResult {
        Ok(None)
    }

    fn layout(&self) -> Option<Layout> {
        None
    }

    /// Public pages keep rendering while the connection gate is engaged.
    fn is_public(&self) -> bool {
        false
    }

    /// Items shown in a randomized order, shuffled once per render pass.
    fn random_items(&self) -> Option<Vec<Value>> {
        None
    }

    fn render(&self, cx: &PageContext<'_>) -> View;
}

/// Wrapper shared by several pages
pub trait LayoutComponent: Send + Sync {
    fn name(&self) -> &str;

    fn fetch_urls(
        &self,
        _params: &RouteParams,
        _random_items: &RandomItemAssignment,
    ) -> DescriptorResult {
        Ok(None)
    }

    fn render(&self, page: View, props: &LayoutProps, cx: &PageContext<'_>) -> View;
}

/// Layout declared by a page: either the bare layout, or the layout with
/// static props merged into its input.
#[derive(Clone)]
pub enum Layout {
    Bare(Arc<dyn LayoutComponent>),
    WithProps {
        layout: Arc<dyn LayoutComponent>,
        props: Map<String, Value>,
    },
}

impl Layout {
    pub fn bare(layout: impl LayoutComponent + 'static) -> Self {
        Self::Bare(Arc::new(layout))
    }

    pub fn with_props(layout: impl LayoutComponent + 'static, props: Map<String, Value>) -> Self {
        Self::WithProps {
            layout: Arc::new(layout),
            props,
        }
    }

    pub fn component(&self) -> &dyn LayoutComponent {
        match self {
            Self::Bare(layout) | Self::WithProps { layout, .. } => layout.as_ref(),
        }
    }

    pub fn fetch_urls(
        &self,
        params: &RouteParams,
        random_items: &RandomItemAssignment,
    ) -> DescriptorResult {
        self.component().fetch_urls(params, random_items)
    }

    /// Wrap a rendered page. The layout input is the route params
    /// overlaid with the static props.
    pub fn wrap(&self, page: View, cx: &PageContext<'_>) -> View {
        let mut props = LayoutProps::default();
        for (name, value) in cx.params {
            props.insert(name.clone(), Value::String(value.clone()));
        }
        if let Self::WithProps { props: fixed, .. } = self {
            for (name, value) in fixed {
                props.insert(name.clone(), value.clone());
            }
        }
        self.component().render(page, &props, cx)
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bare(layout) => f.debug_tuple("Bare").field(&layout.name()).finish(),
            Self::WithProps { layout, props } => f
                .debug_struct("WithProps")
                .field("layout", &layout.name())
                .field("props", props)
                .finish(),
        }
    }
}

/// Props a layout renders with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutProps(Map<String, Value>);

impl LayoutProps {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn insert(&mut self, name: String, value: Value) {
        self.0.insert(name, value);
    }
}

/// What a page sees while rendering
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub params: &'a RouteParams,
    pub cache: &'a QueryCache,
    pub random_items: &'a RandomItemAssignment,
    pub account: Option<&'a Account>,
    pub theme: Theme,
}

impl PageContext<'_> {
    /// Typed cache lookup.
    pub fn query<T: DeserializeOwned>(&self, path: &ResourcePath) -> Option<T> {
        self.cache.get_as(path)
    }

    /// The ordering assigned to a page, or nothing if it has none.
    pub fn random_items_for(&self, display_name: &str) -> &[Value] {
        self.random_items.get(display_name).unwrap_or_default()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Apply the page's layout, or return the page unchanged when it has none.
pub fn resolve_layout(layout: Option<&Layout>, page: View, cx: &PageContext<'_>) -> View {
    match layout {
        Some(layout) => layout.wrap(page, cx),
        None => page,
    }
}
