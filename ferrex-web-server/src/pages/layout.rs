use ferrex_web::{
    DescriptorError, ResourceDescriptor, ResourcePath,
    api_routes::v1,
    models::LibrarySummary,
    page::{DescriptorResult, LayoutComponent, LayoutProps, PageContext, RouteParams},
    random::RandomItemAssignment,
    view::View,
};

/// Navigation chrome around the library pages: a sidebar listing every
/// library the account can see.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowseLayout;

impl LayoutComponent for BrowseLayout {
    fn name(&self) -> &str {
        "browse"
    }

    fn fetch_urls(
        &self,
        _params: &RouteParams,
        _random_items: &RandomItemAssignment,
    ) -> DescriptorResult {
        Ok(Some(vec![ResourceDescriptor::of::<Vec<LibrarySummary>>(
            v1::libraries::COLLECTION,
        )]))
    }

    fn render(&self, page: View, props: &LayoutProps, cx: &PageContext<'_>) -> View {
        let libraries: Vec<LibrarySummary> = cx
            .query(&ResourcePath::parse(v1::libraries::COLLECTION))
            .unwrap_or_default();
        let active = props.get_str("id");

        let links = libraries.into_iter().map(|library| {
            let mut link = View::element("a").attr("href", format!("/library/{}", library.id));
            if active == Some(library.id.as_str()) {
                link = link.attr("aria-current", "page");
            }
            View::element("li").child(link.child(View::text(library.name)))
        });

        let mut shell = View::element("div").attr("class", "browse");
        if let Some(section) = props.get_str("section") {
            shell = shell.attr("data-section", section);
        }

        shell.children([
            View::element("nav")
                .attr("class", "sidebar")
                .child(View::element("ul").children(links)),
            page,
        ])
    }
}

/// `{id}` from the route, or the error naming it.
pub(crate) fn required_param<'a>(
    params: &'a RouteParams,
    name: &str,
) -> Result<&'a str, DescriptorError> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| DescriptorError::MissingParam(name.to_owned()))
}
