//! Resource descriptor resolution
//!
//! Turns a page and its optional layout into the ordered list of resources
//! one render needs: page descriptors, then layout descriptors, then the
//! instance metadata every page gets.

use crate::{
    api_routes::v1,
    descriptor::{ResourceDescriptor, ResponseParser},
    error::DescriptorError,
    models::ServerInfo,
    page::{Page, RouteParams},
    random::RandomItemAssignment,
};

/// Instance metadata, needed to evaluate guest permissions.
pub fn server_info_descriptor() -> ResourceDescriptor {
    ResourceDescriptor::of::<ServerInfo>(v1::server::INFO)
}

/// Profile of the logged-in user. Kept as an open object so every field
/// can be merged into the account.
pub fn current_user_descriptor() -> ResourceDescriptor {
    ResourceDescriptor::new(v1::users::CURRENT, ResponseParser::object())
}

/// Descriptors for `page` and its layout, metadata last.
///
/// Duplicate paths are kept; the query client fetches each path once.
pub fn resolve_descriptors(
    page: &dyn Page,
    params: &RouteParams,
    random_items: &RandomItemAssignment,
) -> Result<Vec<ResourceDescriptor>, DescriptorError> {
    let mut descriptors = page.fetch_urls(params, random_items)?.unwrap_or_default();

    if let Some(layout) = page.layout()
        && let Some(layout_descriptors) = layout.fetch_urls(params, random_items)?
    {
        descriptors.extend(layout_descriptors);
    }

    descriptors.push(server_info_descriptor());
    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        page::{Layout, LayoutComponent, LayoutProps, PageContext},
        view::View,
    };

    struct Bare;

    impl Page for Bare {
        fn display_name(&self) -> &str {
            "Bare"
        }

        fn render(&self, _cx: &PageContext<'_>) -> View {
            View::empty()
        }
    }

    struct Sidebar;

    impl LayoutComponent for Sidebar {
        fn name(&self) -> &str {
            "Sidebar"
        }

        fn fetch_urls(
            &self,
            _params: &RouteParams,
            _random_items: &RandomItemAssignment,
        ) -> crate::page::DescriptorResult {
            Ok(Some(vec![ResourceDescriptor::new(
                v1::libraries::COLLECTION,
                ResponseParser::any(),
            )]))
        }

        fn render(&self, page: View, _props: &LayoutProps, _cx: &PageContext<'_>) -> View {
            page
        }
    }

    struct Detail;

    impl Page for Detail {
        fn display_name(&self) -> &str {
            "Detail"
        }

        fn fetch_urls(
            &self,
            params: &RouteParams,
            _random_items: &RandomItemAssignment,
        ) -> crate::page::DescriptorResult {
            let id = params
                .get("id")
                .ok_or_else(|| DescriptorError::MissingParam("id".into()))?;
            Ok(Some(vec![
                ResourceDescriptor::new(
                    crate::descriptor::ResourcePath::parse(v1::libraries::ITEM)
                        .with_param("id", id.as_str()),
                    ResponseParser::object(),
                ),
                ResourceDescriptor::new(
                    crate::descriptor::ResourcePath::parse(v1::libraries::MEDIA)
                        .with_param("id", id.as_str()),
                    ResponseParser::any(),
                ),
            ]))
        }

        fn layout(&self) -> Option<Layout> {
            Some(Layout::bare(Sidebar))
        }

        fn render(&self, _cx: &PageContext<'_>) -> View {
            View::empty()
        }
    }

    fn paths(descriptors: &[ResourceDescriptor]) -> Vec<String> {
        descriptors.iter().map(|d| d.path().to_string()).collect()
    }

    #[test]
    fn page_without_needs_gets_only_metadata() {
        let descriptors =
            resolve_descriptors(&Bare, &RouteParams::new(), &RandomItemAssignment::new())
                .expect("resolve");
        assert_eq!(paths(&descriptors), [v1::server::INFO]);
    }

    #[test]
    fn page_then_layout_then_metadata() {
        let params = RouteParams::from([("id".to_owned(), "7".to_owned())]);
        let random = RandomItemAssignment::new();
        let first = resolve_descriptors(&Detail, &params, &random).expect("resolve");
        assert_eq!(
            paths(&first),
            [
                "/api/v1/libraries/7",
                "/api/v1/libraries/7/media",
                "/api/v1/libraries",
                "/api/v1/server/info",
            ]
        );

        let again = resolve_descriptors(&Detail, &params, &random).expect("resolve");
        assert_eq!(paths(&again), paths(&first));
    }

    #[test]
    fn descriptor_errors_propagate() {
        let err = resolve_descriptors(&Detail, &RouteParams::new(), &RandomItemAssignment::new())
            .unwrap_err();
        assert_eq!(err, DescriptorError::MissingParam("id".into()));
    }
}
