use config::ExportConfig;
use reqwest::Client;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use testing::{PlatformMock, reference, token_body, unique_id};
use user_export::pagination::PaginatedFetcher;
use user_export::reference::{ReferenceEntity, ReferenceResolver, ResourceKind};
use user_export::token::TokenProvider;
use user_export::ExportError;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

const SKILLS: &str = "routing/skills";

fn fetcher(config: &ExportConfig) -> PaginatedFetcher {
    let client = Client::new();
    let tokens = Arc::new(TokenProvider::new(client.clone(), &config.platform));
    PaginatedFetcher::new(
        client,
        config.platform.api_base_url(),
        tokens,
        config.api.retry.clone()
    )
}

async fn setup() -> (PlatformMock, ExportConfig, TempDir) {
    let mock = PlatformMock::start().await;
    let dir = TempDir::new().unwrap();
    let config = mock.export_config(dir.path());
    (mock, config, dir)
}

fn ids(elements: &[ReferenceEntity]) -> Vec<&str> {
    elements.iter().map(|e| e.id.as_str()).collect()
}

#[tokio::test]
async fn test_fetch_all_walks_every_page_in_order() {
    let (mock, config, _dir) = setup().await;
    mock.mount_token("t1", 3600).await;
    mock.mount_pages(
        SKILLS,
        vec![
            vec![reference("s1", "Billing"), reference("s2", "Sales")],
            vec![reference("s3", "Spanish")],
        ]
    )
    .await;

    let elements: Vec<ReferenceEntity> = fetcher(&config).fetch_all(SKILLS, 2).await.unwrap();

    assert_eq!(ids(&elements), vec!["s1", "s2", "s3"]);
    assert_eq!(mock.request_count(SKILLS).await, 2);
}

#[tokio::test]
async fn test_fetch_all_stops_on_empty_page() {
    let (mock, config, _dir) = setup().await;
    mock.mount_token("t1", 3600).await;
    mock.mount_pages_until_empty(
        SKILLS,
        vec![vec![reference("s1", "Billing")], vec![reference("s2", "Sales")]]
    )
    .await;

    let elements: Vec<ReferenceEntity> = fetcher(&config).fetch_all(SKILLS, 1).await.unwrap();

    assert_eq!(ids(&elements), vec!["s1", "s2"]);
    assert_eq!(mock.request_count(SKILLS).await, 3);
}

#[tokio::test]
async fn test_requests_carry_bearer_and_page_size() {
    let (mock, config, _dir) = setup().await;
    mock.mount_token("scoped-token", 3600).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/routing/queues"))
        .and(header("Authorization", "Bearer scoped-token"))
        .and(query_param("pageSize", "25"))
        .and(query_param("pageNumber", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entities": [{ "id": "q1", "name": "Support" }],
            "pageNumber": 1,
            "pageCount": 1
        })))
        .expect(1)
        .mount(mock.server())
        .await;

    let elements: Vec<ReferenceEntity> = fetcher(&config)
        .fetch_all("routing/queues", 25)
        .await
        .unwrap();
    assert_eq!(ids(&elements), vec!["q1"]);
}

#[tokio::test]
async fn test_token_is_cached_across_requests() {
    let (mock, config, _dir) = setup().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("cached", 3600)))
        .expect(1)
        .mount(mock.server())
        .await;
    mock.mount_pages(
        SKILLS,
        vec![vec![reference("s1", "Billing")], vec![reference("s2", "Sales")]]
    )
    .await;

    let fetcher = fetcher(&config);
    let _: Vec<ReferenceEntity> = fetcher.fetch_all(SKILLS, 1).await.unwrap();
    let _: Vec<ReferenceEntity> = fetcher.fetch_all(SKILLS, 1).await.unwrap();
}

#[tokio::test]
async fn test_token_inside_expiry_margin_is_replaced() {
    let (mock, config, _dir) = setup().await;
    // Lifetime shorter than the expiry margin: never reusable.
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("short", 10)))
        .expect(2)
        .mount(mock.server())
        .await;
    mock.mount_pages(
        SKILLS,
        vec![vec![reference("s1", "Billing")], vec![reference("s2", "Sales")]]
    )
    .await;

    let _: Vec<ReferenceEntity> = fetcher(&config).fetch_all(SKILLS, 1).await.unwrap();
}

#[tokio::test]
async fn test_rate_limit_honors_retry_after() {
    let (mock, config, _dir) = setup().await;
    mock.mount_token("t1", 3600).await;
    mock.mount_failures(SKILLS, 1, 429, Some("2"), 1).await;
    mock.mount_pages(SKILLS, vec![vec![reference("s1", "Billing")]])
        .await;

    let started = Instant::now();
    let elements: Vec<ReferenceEntity> = fetcher(&config).fetch_all(SKILLS, 100).await.unwrap();

    assert!(started.elapsed() >= Duration::from_secs(2));
    assert_eq!(ids(&elements), vec!["s1"]);
    assert_eq!(mock.request_count(SKILLS).await, 2);
}

#[tokio::test]
async fn test_rate_limit_without_header_waits_default() {
    let (mock, mut config, _dir) = setup().await;
    config.api.retry.rate_limit_default_secs = 1;
    mock.mount_token("t1", 3600).await;
    mock.mount_failures(SKILLS, 1, 429, None, 1).await;
    mock.mount_pages(SKILLS, vec![vec![reference("s1", "Billing")]])
        .await;

    let started = Instant::now();
    let elements: Vec<ReferenceEntity> = fetcher(&config).fetch_all(SKILLS, 100).await.unwrap();

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(ids(&elements), vec!["s1"]);
    assert_eq!(mock.request_count(SKILLS).await, 2);
}

#[tokio::test]
async fn test_rate_limit_budget_exhausted() {
    let (mock, mut config, _dir) = setup().await;
    config.api.retry.max_rate_limit_retries = 2;
    mock.mount_token("t1", 3600).await;
    mock.mount_failures(SKILLS, 1, 429, Some("0"), 10).await;

    let result: Result<Vec<ReferenceEntity>, _> = fetcher(&config).fetch_all(SKILLS, 100).await;

    match result {
        Err(ExportError::RateLimitExceeded {
            endpoint,
            page,
            attempts,
            ..
        }) => {
            assert_eq!(endpoint, SKILLS);
            assert_eq!(page, 1);
            assert_eq!(attempts, 2);
        }
        other => panic!("expected RateLimitExceeded, got {:?}", other)
    }
    assert_eq!(mock.request_count(SKILLS).await, 3);
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let (mock, config, _dir) = setup().await;
    mock.mount_token("t1", 3600).await;
    mock.mount_failures(SKILLS, 1, 503, None, 2).await;
    mock.mount_pages(SKILLS, vec![vec![reference("s1", "Billing")]])
        .await;

    let elements: Vec<ReferenceEntity> = fetcher(&config).fetch_all(SKILLS, 100).await.unwrap();

    assert_eq!(ids(&elements), vec!["s1"]);
    assert_eq!(mock.request_count(SKILLS).await, 3);
}

#[tokio::test]
async fn test_server_error_budget_exhausted() {
    let (mock, config, _dir) = setup().await;
    mock.mount_token("t1", 3600).await;
    mock.mount_failures(SKILLS, 1, 500, None, 10).await;

    let err = fetcher(&config)
        .fetch_all::<ReferenceEntity>(SKILLS, 100)
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::FetchError { status: 500, .. }));
    // Initial attempt plus max_retries.
    assert_eq!(
        mock.request_count(SKILLS).await,
        config.api.retry.max_retries as usize + 1
    );
}

#[tokio::test]
async fn test_client_error_fails_immediately() {
    let (mock, config, _dir) = setup().await;
    mock.mount_token("t1", 3600).await;
    mock.mount_failures(SKILLS, 1, 404, None, 10).await;

    let err = fetcher(&config)
        .fetch_all::<ReferenceEntity>(SKILLS, 100)
        .await
        .unwrap_err();

    match err {
        ExportError::FetchError {
            status, message, ..
        } => {
            assert_eq!(status, 404);
            assert!(message.contains("mock status 404"));
        }
        other => panic!("expected FetchError, got {:?}", other)
    }
    assert_eq!(mock.request_count(SKILLS).await, 1);
}

#[tokio::test]
async fn test_unauthorized_refreshes_once_then_succeeds() {
    let (mock, config, _dir) = setup().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("t1", 3600)))
        .expect(2)
        .mount(mock.server())
        .await;
    mock.mount_failures(SKILLS, 1, 401, None, 1).await;
    mock.mount_pages(SKILLS, vec![vec![reference("s1", "Billing")]])
        .await;

    let elements: Vec<ReferenceEntity> = fetcher(&config).fetch_all(SKILLS, 100).await.unwrap();

    assert_eq!(ids(&elements), vec!["s1"]);
    assert_eq!(mock.request_count(SKILLS).await, 2);
}

#[tokio::test]
async fn test_second_unauthorized_is_fatal() {
    let (mock, config, _dir) = setup().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("t1", 3600)))
        .expect(2)
        .mount(mock.server())
        .await;
    mock.mount_failures(SKILLS, 1, 401, None, 5).await;

    let err = fetcher(&config)
        .fetch_all::<ReferenceEntity>(SKILLS, 100)
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::FetchError { status: 401, .. }));
    assert_eq!(mock.request_count(SKILLS).await, 2);
}

#[tokio::test]
async fn test_rejected_credentials_are_auth_error() {
    let (mock, config, _dir) = setup().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid_client" }))
        )
        .mount(mock.server())
        .await;

    let err = fetcher(&config)
        .fetch_all::<ReferenceEntity>(SKILLS, 100)
        .await
        .unwrap_err();

    match err {
        ExportError::AuthError(message) => assert!(message.contains("invalid_client")),
        other => panic!("expected AuthError, got {:?}", other)
    }
    assert_eq!(mock.request_count(SKILLS).await, 0);
}

#[tokio::test]
async fn test_token_response_without_expiry_is_auth_error() {
    let (mock, config, _dir) = setup().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "access_token": "t1" }))
        )
        .mount(mock.server())
        .await;

    let client = Client::new();
    let tokens = TokenProvider::new(client, &config.platform);
    let err = tokens.get_token().await.unwrap_err();
    assert!(matches!(err, ExportError::AuthError(_)));
}

#[tokio::test]
async fn test_unparseable_page_is_serialization_error() {
    let (mock, config, _dir) = setup().await;
    mock.mount_token("t1", 3600).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/routing/skills"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(mock.server())
        .await;

    let err = fetcher(&config)
        .fetch_all::<ReferenceEntity>(SKILLS, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::SerializationError(_)));
}

#[tokio::test]
async fn test_unreachable_api_is_http_error() {
    let (mock, mut config, _dir) = setup().await;
    mock.mount_token("t1", 3600).await;
    config.platform.api_base_url = Some("http://127.0.0.1:9/api/v2".to_string());
    config.api.retry.max_retries = 1;

    let err = fetcher(&config)
        .fetch_all::<ReferenceEntity>(SKILLS, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::HttpError(_)));
}

#[tokio::test]
async fn test_reference_resolver_keeps_last_duplicate() {
    let (mock, config, _dir) = setup().await;
    mock.mount_token(&unique_id("token"), 3600).await;
    mock.mount_pages(
        SKILLS,
        vec![
            vec![reference("s1", "Billing"), reference("s2", "Sales")],
            vec![reference("s1", "Billing (renamed)")],
        ]
    )
    .await;

    let fetcher = fetcher(&config);
    let map = ReferenceResolver::new(ResourceKind::Skill, &fetcher, 2)
        .resolve_all()
        .await
        .unwrap();

    assert_eq!(map.len(), 2);
    assert_eq!(map.get("s1"), Some("Billing (renamed)"));
    assert_eq!(map.resolve("s404"), "Unknown Skill");
}

#[tokio::test]
async fn test_extra_query_is_sent_on_every_page() {
    let (mock, config, _dir) = setup().await;
    mock.mount_token("t1", 3600).await;
    for number in 1..=2u32 {
        Mock::given(method("GET"))
            .and(path("/api/v2/users"))
            .and(query_param("expand", "skills,queues"))
            .and(query_param("pageNumber", number.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entities": [{ "id": format!("u{}", number) }],
                "pageNumber": number,
                "pageCount": 2
            })))
            .expect(1)
            .mount(mock.server())
            .await;
    }

    let users: Vec<Value> = fetcher(&config)
        .fetch_all_with("users", 1, &[("expand", "skills,queues")])
        .await
        .unwrap();
    assert_eq!(users.len(), 2);
}
