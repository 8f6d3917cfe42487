use ferrex_web::{
    ResourcePath,
    api_routes::v1,
    models::ServerInfo,
    page::{Page, PageContext},
    view::View,
};

/// Sign-in form. Stays reachable while the Ferrex server is unreachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoginPage;

impl Page for LoginPage {
    fn display_name(&self) -> &str {
        "Login"
    }

    fn is_public(&self) -> bool {
        true
    }

    fn render(&self, cx: &PageContext<'_>) -> View {
        let info = cx.query::<ServerInfo>(&ResourcePath::parse(v1::server::INFO));
        let heading = match &info {
            Some(info) => format!("Sign in to {}", info.name),
            None => "Sign in".to_owned(),
        };

        let mut form = View::element("form")
            .attr("method", "post")
            .attr("action", "/login")
            .children([
                View::element("input").attr("name", "username").attr("autocomplete", "username"),
                View::element("input")
                    .attr("name", "password")
                    .attr("type", "password")
                    .attr("autocomplete", "current-password"),
                View::element("button").attr("type", "submit").child(View::text("Sign in")),
            ]);
        if info.is_some_and(|info| info.registration_open) {
            form = form.child(
                View::element("a").attr("href", "/register").child(View::text("Create an account")),
            );
        }

        View::element("main")
            .attr("class", "login")
            .children([View::element("h1").child(View::text(heading)), form])
    }
}
