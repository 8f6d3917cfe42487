use ferrex_web::{
    ResourceDescriptor, ResourcePath,
    api_routes::v1,
    models::LibrarySummary,
    page::{DescriptorResult, Layout, Page, PageContext, RouteParams},
    random::RandomItemAssignment,
    view::View,
};
use serde_json::{Value, json};

use super::layout::BrowseLayout;

/// Discovery rows on the landing page. Their order is shuffled per visit.
const FEATURED_ROWS: &[(&str, &str)] = &[
    ("recently-added", "Recently Added"),
    ("continue-watching", "Continue Watching"),
    ("top-rated", "Top Rated"),
    ("unwatched", "Unwatched"),
    ("by-genre", "Browse by Genre"),
    ("new-episodes", "New Episodes"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct HomePage;

impl Page for HomePage {
    fn display_name(&self) -> &str {
        "Home"
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

    fn layout(&self) -> Option<Layout> {
        Some(Layout::bare(BrowseLayout))
    }

    fn random_items(&self) -> Option<Vec<Value>> {
        Some(
            FEATURED_ROWS
                .iter()
                .map(|(id, title)| json!({ "id": id, "title": title }))
                .collect(),
        )
    }

    fn render(&self, cx: &PageContext<'_>) -> View {
        let greeting = cx
            .account
            .and_then(|account| account.field("name"))
            .and_then(Value::as_str)
            .map(|name| format!("Welcome back, {name}"))
            .unwrap_or_else(|| "Welcome to Ferrex".to_owned());

        let rows = cx.random_items_for(self.display_name()).iter().map(|row| {
            View::element("section")
                .attr("class", "featured-row")
                .attr("data-row", row["id"].as_str().unwrap_or_default())
                .child(
                    View::element("h2")
                        .child(View::text(row["title"].as_str().unwrap_or_default())),
                )
        });

        let library_count = cx
            .query::<Vec<LibrarySummary>>(&ResourcePath::parse(v1::libraries::COLLECTION))
            .map(|libraries| libraries.len())
            .unwrap_or_default();

        View::element("main").attr("class", "home").children(
            [
                View::element("h1").child(View::text(greeting)),
                View::element("p")
                    .attr("class", "library-count")
                    .child(View::text(format!("{library_count} libraries"))),
            ]
            .into_iter()
            .chain(rows),
        )
    }
}
