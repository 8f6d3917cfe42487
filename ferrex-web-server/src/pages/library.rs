use ferrex_web::{
    ResourceDescriptor, ResourcePath,
    api_routes::v1,
    models::{LibrarySummary, MediaSummary},
    page::{DescriptorResult, Layout, Page, PageContext, RouteParams},
    random::RandomItemAssignment,
    view::View,
};
use serde_json::{Map, Value};

use super::layout::{BrowseLayout, required_param};

/// One library and its media, at `/library/{id}`
#[derive(Debug, Clone, Copy, Default)]
pub struct LibraryPage;

fn library_paths(id: &str) -> (ResourcePath, ResourcePath) {
    (
        ResourcePath::parse(v1::libraries::ITEM).with_param("id", id),
        ResourcePath::parse(v1::libraries::MEDIA).with_param("id", id),
    )
}

impl Page for LibraryPage {
    fn display_name(&self) -> &str {
        "Library"
    }

    fn fetch_urls(
        &self,
        params: &RouteParams,
        _random_items: &RandomItemAssignment,
    ) -> DescriptorResult {
        let (item, media) = library_paths(required_param(params, "id")?);
        Ok(Some(vec![
            ResourceDescriptor::of::<LibrarySummary>(item),
            ResourceDescriptor::of::<Vec<MediaSummary>>(media),
        ]))
    }

    fn layout(&self) -> Option<Layout> {
        let mut props = Map::new();
        props.insert("section".into(), Value::String("library".into()));
        Some(Layout::with_props(BrowseLayout, props))
    }

    fn render(&self, cx: &PageContext<'_>) -> View {
        let Some(id) = cx.param("id") else {
            return View::element("main").child(View::text("Library not found"));
        };
        let (item, media) = library_paths(id);

        let title = cx
            .query::<LibrarySummary>(&item)
            .map(|library| library.name)
            .unwrap_or_else(|| "Library".to_owned());
        let entries = cx.query::<Vec<MediaSummary>>(&media).unwrap_or_default();

        let list = View::element("ul").attr("class", "media-grid").children(
            entries.into_iter().map(|entry| {
                let label = match entry.year {
                    Some(year) => format!("{} ({year})", entry.title),
                    None => entry.title,
                };
                View::element("li")
                    .attr("data-media", entry.id)
                    .child(View::text(label))
            }),
        );

        View::element("main")
            .attr("class", "library")
            .children([View::element("h1").child(View::text(title)), list])
    }
}
