use url::Url;

use crate::{descriptor::ResourcePath, page::RouteParams, theme::Theme};

/// Everything one render needs to know about its request.
///
/// The API base URL travels with the request instead of living in process
/// state: the server passes its internal URL, the browser runtime passes
/// the public one.
#[derive(Debug, Clone)]
pub struct RequestContext {
    api_base_url: Url,
    cookie_header: Option<String>,
    route_params: RouteParams,
    color_scheme_hint: Option<Theme>,
}

impl RequestContext {
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            cookie_header: None,
            route_params: RouteParams::new(),
            color_scheme_hint: None,
        }
    }

    pub fn with_cookie_header(mut self, header: Option<String>) -> Self {
        self.cookie_header = header;
        self
    }

    pub fn with_route_params(mut self, params: RouteParams) -> Self {
        self.route_params = params;
        self
    }

    pub fn with_color_scheme_hint(mut self, hint: Option<Theme>) -> Self {
        self.color_scheme_hint = hint;
        self
    }

    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    /// Raw `Cookie` header of the incoming request, if any
    pub fn cookie_header(&self) -> Option<&str> {
        self.cookie_header.as_deref()
    }

    pub fn route_params(&self) -> &RouteParams {
        &self.route_params
    }

    pub fn color_scheme_hint(&self) -> Option<Theme> {
        self.color_scheme_hint
    }

    /// Absolute URL of a resource under the API base.
    pub fn api_url(&self, path: &ResourcePath) -> Result<Url, url::ParseError> {
        let mut url = self.api_base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(path.segments());
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_appends_segments_to_base_path() {
        let cx = RequestContext::new(Url::parse("http://ferrex-server:3000/").expect("valid url"));
        let url = cx
            .api_url(&ResourcePath::parse("/api/v1/users/me"))
            .expect("url");
        assert_eq!(url.as_str(), "http://ferrex-server:3000/api/v1/users/me");
    }

    #[test]
    fn api_url_keeps_base_prefix_and_encodes_segments() {
        let cx = RequestContext::new(Url::parse("https://example.com/ferrex").expect("valid url"));
        let path = ResourcePath::new(["api", "v1", "libraries", "a b"]);
        let url = cx.api_url(&path).expect("url");
        assert_eq!(
            url.as_str(),
            "https://example.com/ferrex/api/v1/libraries/a%20b"
        );
    }
}
