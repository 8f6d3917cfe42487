use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use ferrex_web::{
    AccountPatch, QueryCache, RequestContext, SsrErrorKind, SystemThemeResolver, Theme,
    ThemeResolver, TransportablePayload,
    document::render_document,
    shell::{AppProps, compose},
    theme::COLOR_SCHEME_HINT_HEADER,
};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::{
    errors::{AppError, AppResult},
    state::AppState,
};

const ACCEPT_CH: HeaderName = HeaderName::from_static("accept-ch");

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(render_page))
        .route("/{*path}", get(render_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(State(state): State<AppState>) -> Json<Value> {
    let connection = state.connection.current();
    Json(json!({
        "status": "ok",
        "upstream": match &connection.error {
            Some(error) => json!({
                "reachable": false,
                "message": error.message,
                "since": error.since,
            }),
            None => json!({ "reachable": true }),
        },
    }))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Server-render one page: orchestrate the SSR fetch, compose the shell and
/// embed the payload. Fetch and auth failures still produce a 200 page; only
/// unknown routes and encoding failures are errors.
async fn render_page(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> AppResult<Response> {
    let path = uri.path();
    let matched = state
        .pages
        .find(path)
        .ok_or_else(|| AppError::not_found(format!("no page at {path}")))?;

    let hint = header_str(&headers, COLOR_SCHEME_HINT_HEADER).and_then(Theme::from_client_hint);
    let cx = RequestContext::new(state.config.api.internal_url.clone())
        .with_cookie_header(header_str(&headers, header::COOKIE.as_str()).map(str::to_owned))
        .with_route_params(matched.params.clone())
        .with_color_scheme_hint(hint);

    let mut payload = state
        .orchestrator
        .render_payload(&cx, matched.page.as_ref())
        .await;
    payload
        .page_props
        .insert("path".into(), Value::String(path.to_owned()));
    payload
        .page_props
        .insert("route".into(), Value::String(matched.pattern.clone()));
    payload.page_props.insert(
        "apiBaseUrl".into(),
        Value::String(state.config.api.public_url.to_string()),
    );

    let set_cookie = account_cookie_update(&state, &payload)?;

    let theme = SystemThemeResolver::new(state.config.theme.fallback)
        .with_system(hint)
        .resolve(payload.theme);
    let cache = payload
        .query_state
        .clone()
        .map(QueryCache::hydrate)
        .unwrap_or_default();
    let connection = state.connection.current();
    let head = matched.head();

    let body = compose(
        matched.page.as_ref(),
        &AppProps {
            head: &head,
            params: &matched.params,
            cache: &cache,
            random_items: &payload.random_items,
            account: payload.account.as_ref(),
            ssr_error: payload.ssr_error.as_ref(),
            theme,
            connection: &connection,
        },
    );
    let script = state.codec.script_tag(&payload)?;
    let html = render_document(&body, &head, theme, &script);

    let mut response = Html(html).into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(
        ACCEPT_CH,
        HeaderValue::from_static("Sec-CH-Prefers-Color-Scheme"),
    );
    if let Some(cookie) = set_cookie {
        let value = HeaderValue::from_str(&cookie)
            .map_err(|err| AppError::internal(format!("invalid Set-Cookie value: {err}")))?;
        response_headers.insert(header::SET_COOKIE, value);
    }
    Ok(response)
}

/// `Set-Cookie` for the account cookie after this render, if it changed:
/// re-signed with a token refreshed during SSR, or cleared once the session
/// has expired.
fn account_cookie_update(
    state: &AppState,
    payload: &TransportablePayload,
) -> AppResult<Option<String>> {
    let cookies = &state.config.cookies;

    if let (Some(token), Some(account)) = (&payload.token, &payload.account) {
        let mut account = account.clone();
        account.apply(AccountPatch::token(token.clone()));
        let cookie = state
            .cookie_signer
            .issue(&cookies.account_cookie, &account, cookies.secure)?;
        tracing::debug!(account_id = %account.id, "rotated account cookie");
        return Ok(Some(cookie));
    }

    if payload
        .ssr_error
        .as_ref()
        .is_some_and(|failure| failure.kind == SsrErrorKind::SessionExpired)
    {
        return Ok(Some(format!(
            "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
            cookies.account_cookie
        )));
    }

    Ok(None)
}
