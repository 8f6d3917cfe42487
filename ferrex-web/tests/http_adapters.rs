use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    routing::{get, post},
};
use chrono::Utc;
use ferrex_web::{
    Account, AccountToken, AccessToken, FetchError, HttpQueryClient, QueryClient,
    RefreshingTokenResolver, RequestContext, ResourceDescriptor, ResourcePath,
    ResponseParser, TokenError, TokenResolution, TokenResolver, api_routes::v1,
    models::{LibrarySummary, ServerInfo},
};
use serde_json::{Value, json};
use url::Url;

#[derive(Clone, Default)]
struct Hits {
    libraries: Arc<AtomicUsize>,
}

async fn server_info() -> Json<Value> {
    Json(json!({ "name": "Ferrex", "version": "0.1.0", "guest_access": false }))
}

async fn libraries(State(hits): State<Hits>) -> Json<Value> {
    hits.libraries.fetch_add(1, Ordering::SeqCst);
    Json(json!([
        { "id": "1", "name": "Movies", "media_count": 12 },
        { "id": "2", "name": "Shows", "media_count": 4 },
    ]))
}

async fn current_user(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some("Bearer T0") => Ok(Json(json!({ "name": "Alice" }))),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn refresh(Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    match body["refresh_token"].as_str() {
        Some("good-refresh") => Ok(Json(json!({ "access_token": "T1", "expires_in": 900 }))),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn spawn_api() -> (Url, Hits) {
    let hits = Hits::default();
    let router = Router::new()
        .route(v1::server::INFO, get(server_info))
        .route(v1::libraries::COLLECTION, get(libraries))
        .route(v1::users::CURRENT, get(current_user))
        .route(v1::auth::REFRESH, post(refresh))
        .route("/api/v1/broken", get(|| async { Json(json!("not an object")) }))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake API");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve fake API");
    });
    (Url::parse(&format!("http://{addr}/")).expect("valid url"), hits)
}

fn query_client() -> HttpQueryClient {
    HttpQueryClient::new(Duration::from_secs(5)).expect("client")
}

fn account_with(token: AccountToken) -> Account {
    Account::new("42", token)
}

#[tokio::test]
async fn batch_parses_each_body_and_dedupes_paths() {
    let (base, hits) = spawn_api().await;
    let cx = RequestContext::new(base);
    let descriptors = [
        ResourceDescriptor::of::<Vec<LibrarySummary>>(v1::libraries::COLLECTION),
        ResourceDescriptor::of::<ServerInfo>(v1::server::INFO),
        ResourceDescriptor::of::<Vec<LibrarySummary>>(v1::libraries::COLLECTION),
    ];

    let cache = query_client()
        .fetch_batch(&cx, &descriptors, None)
        .await
        .expect("batch");

    assert_eq!(cache.len(), 2);
    assert_eq!(hits.libraries.load(Ordering::SeqCst), 1);

    let info: ServerInfo = cache
        .get_as(&ResourcePath::parse(v1::server::INFO))
        .expect("server info");
    assert_eq!(info.name, "Ferrex");
    assert!(!info.registration_open);

    let libraries: Vec<LibrarySummary> = cache
        .get_as(&ResourcePath::parse(v1::libraries::COLLECTION))
        .expect("libraries");
    assert_eq!(libraries.len(), 2);
}

#[tokio::test]
async fn bearer_token_is_sent() {
    let (base, _) = spawn_api().await;
    let cx = RequestContext::new(base);
    let descriptors = [ResourceDescriptor::new(v1::users::CURRENT, ResponseParser::object())];

    let cache = query_client()
        .fetch_batch(&cx, &descriptors, Some(&AccessToken::new("T0")))
        .await
        .expect("batch");
    assert_eq!(
        cache.get(&ResourcePath::parse(v1::users::CURRENT)),
        Some(&json!({ "name": "Alice" }))
    );
}

#[tokio::test]
async fn one_failed_status_fails_the_batch() {
    let (base, _) = spawn_api().await;
    let cx = RequestContext::new(base);
    let descriptors = [
        ResourceDescriptor::of::<ServerInfo>(v1::server::INFO),
        ResourceDescriptor::new(v1::users::CURRENT, ResponseParser::object()),
    ];

    let err = query_client()
        .fetch_batch(&cx, &descriptors, None)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 401, .. }));
}

#[tokio::test]
async fn parser_rejection_fails_the_batch() {
    let (base, _) = spawn_api().await;
    let cx = RequestContext::new(base);
    let descriptors = [ResourceDescriptor::new("/api/v1/broken", ResponseParser::object())];

    let err = query_client()
        .fetch_batch(&cx, &descriptors, None)
        .await
        .unwrap_err();
    match err {
        FetchError::Parse { path, source } => {
            assert_eq!(path.to_string(), "/api/v1/broken");
            assert_eq!(source.message, "found string");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_api_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let cx = RequestContext::new(Url::parse(&format!("http://{addr}/")).expect("url"));
    let descriptors = [ResourceDescriptor::of::<ServerInfo>(v1::server::INFO)];
    let err = query_client()
        .fetch_batch(&cx, &descriptors, None)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }));
}

#[tokio::test]
async fn guest_and_valid_tokens_need_no_refresh() {
    let (base, _) = spawn_api().await;
    let cx = RequestContext::new(base);
    let resolver = RefreshingTokenResolver::new(reqwest::Client::new());

    assert!(matches!(resolver.resolve(&cx, None).await, TokenResolution::Guest));

    let account = account_with(AccountToken {
        access_token: AccessToken::new("T0"),
        refresh_token: None,
        expires_at: Utc::now() + chrono::Duration::minutes(10),
    });
    match resolver.resolve(&cx, Some(&account)).await {
        TokenResolution::Current(token) => assert_eq!(token.as_str(), "T0"),
        other => panic!("expected current token, got {other:?}"),
    }
}

#[tokio::test]
async fn expired_token_is_refreshed() {
    let (base, _) = spawn_api().await;
    let cx = RequestContext::new(base);
    let resolver = RefreshingTokenResolver::new(reqwest::Client::new());
    let account = account_with(AccountToken {
        access_token: AccessToken::new("T0"),
        refresh_token: Some("good-refresh".into()),
        // inside the skew window counts as expired
        expires_at: Utc::now() + chrono::Duration::seconds(5),
    });

    match resolver.resolve(&cx, Some(&account)).await {
        TokenResolution::Refreshed(token) => {
            assert_eq!(token.access_token.as_str(), "T1");
            assert_eq!(token.refresh_token.as_deref(), Some("good-refresh"));
            assert!(token.expires_at > Utc::now() + chrono::Duration::minutes(14));
        }
        other => panic!("expected refreshed token, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_or_missing_refresh_fails() {
    let (base, _) = spawn_api().await;
    let cx = RequestContext::new(base);
    let resolver = RefreshingTokenResolver::new(reqwest::Client::new());
    let expired = Utc::now() - chrono::Duration::minutes(1);

    let revoked = account_with(AccountToken {
        access_token: AccessToken::new("T0"),
        refresh_token: Some("revoked".into()),
        expires_at: expired,
    });
    match resolver.resolve(&cx, Some(&revoked)).await {
        TokenResolution::Failed(err) => {
            assert!(matches!(err, TokenError::Rejected(401)));
            assert!(err.is_session_expired());
        }
        other => panic!("expected failure, got {other:?}"),
    }

    let no_refresh = account_with(AccountToken {
        access_token: AccessToken::new("T0"),
        refresh_token: None,
        expires_at: expired,
    });
    assert!(matches!(
        resolver.resolve(&cx, Some(&no_refresh)).await,
        TokenResolution::Failed(TokenError::RefreshTokenMissing)
    ));
}
