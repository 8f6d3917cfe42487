//! Pages served by the host and the route table that finds them

pub mod home;
pub mod layout;
pub mod library;
pub mod login;

use std::{fmt, sync::Arc};

use ferrex_web::{Page, RouteParams, view::HeadMeta};
use percent_encoding::percent_decode_str;

pub use home::HomePage;
pub use layout::BrowseLayout;
pub use library::LibraryPage;
pub use login::LoginPage;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

fn parse_pattern(pattern: &str) -> Vec<Segment> {
    pattern
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => Segment::Param(name.to_owned()),
                None => Segment::Literal(segment.to_owned()),
            }
        })
        .collect()
}

struct Route {
    pattern: String,
    segments: Vec<Segment>,
    page: Arc<dyn Page>,
}

impl Route {
    fn matches(&self, path: &str) -> Option<RouteParams> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = RouteParams::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            let part = percent_decode_str(part).decode_utf8().ok()?;
            match segment {
                Segment::Literal(literal) if *literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.into_owned());
                }
            }
        }
        Some(params)
    }
}

/// A page matched against a request path
#[derive(Clone)]
pub struct MatchedPage {
    pub pattern: String,
    pub page: Arc<dyn Page>,
    pub params: RouteParams,
}

impl fmt::Debug for MatchedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchedPage")
            .field("pattern", &self.pattern)
            .field("page", &self.page.display_name())
            .field("params", &self.params)
            .finish()
    }
}

impl MatchedPage {
    pub fn head(&self) -> HeadMeta {
        HeadMeta {
            title: format!("{} | Ferrex", self.page.display_name()),
            description: Some("Your Ferrex media library".to_owned()),
        }
    }
}

/// Ordered route table; the first matching pattern wins.
#[derive(Default)]
pub struct PageRegistry {
    routes: Vec<Route>,
}

impl fmt::Debug for PageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|route| &route.pattern))
            .finish()
    }
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pages bundled with the host.
    pub fn standard() -> Self {
        Self::new()
            .route("/", HomePage)
            .route("/login", LoginPage)
            .route("/library/{id}", LibraryPage)
    }

    pub fn route(mut self, pattern: &str, page: impl Page + 'static) -> Self {
        self.routes.push(Route {
            pattern: pattern.to_owned(),
            segments: parse_pattern(pattern),
            page: Arc::new(page),
        });
        self
    }

    pub fn find(&self, path: &str) -> Option<MatchedPage> {
        self.routes.iter().find_map(|route| {
            route.matches(path).map(|params| MatchedPage {
                pattern: route.pattern.clone(),
                page: Arc::clone(&route.page),
                params,
            })
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_literals_and_captures_params() {
        let registry = PageRegistry::standard();

        let home = registry.find("/").expect("home");
        assert_eq!(home.page.display_name(), "Home");
        assert!(home.params.is_empty());

        let library = registry.find("/library/7/").expect("library");
        assert_eq!(library.pattern, "/library/{id}");
        assert_eq!(library.params.get("id").map(String::as_str), Some("7"));

        assert!(registry.find("/library").is_none());
        assert!(registry.find("/library/7/extra").is_none());
        assert!(registry.find("/nope").is_none());
    }

    #[test]
    fn captured_segments_are_percent_decoded() {
        use ferrex_web::{RequestContext, ResourcePath, api_routes::v1};
        use url::Url;

        let registry = PageRegistry::standard();
        let library = registry.find("/library/a%20b").expect("library");
        let id = library.params.get("id").expect("id param");
        assert_eq!(id, "a b");

        let cx = RequestContext::new(Url::parse("http://api:3000/").expect("valid url"));
        let url = cx
            .api_url(&ResourcePath::parse(v1::libraries::ITEM).with_param("id", id.as_str()))
            .expect("url");
        assert_eq!(url.as_str(), "http://api:3000/api/v1/libraries/a%20b");

        assert!(registry.find("/library/%FF").is_none());
    }

    #[test]
    fn head_title_names_the_page() {
        let login = PageRegistry::standard().find("/login").expect("login");
        assert_eq!(login.head().title, "Login | Ferrex");
    }
}
