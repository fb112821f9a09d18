//! Integration tests for the HTTP fetcher.
//!
//! These tests verify headers, status handling and retries against a mock
//! HTTP server.

use std::time::Duration;

use fontgrab_core::Config;
use fontgrab_core::download::{DownloadError, HttpClient, RetryPolicy};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config() -> Config {
    Config {
        retries: 0,
        timeout_secs: 5,
        ..Config::default()
    }
}

fn fast_retries(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(5), 2.0)
}

#[tokio::test]
async fn test_fetch_text_sends_configured_user_agent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/css"))
        .and(header("User-Agent", "fontgrab-test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("@font-face{}"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new(&Config {
        user_agent: "fontgrab-test/1.0".to_string(),
        ..config()
    })
    .expect("client should build");
    let fetched = client
        .fetch_text(&format!("{}/css", mock_server.uri()))
        .await
        .expect("fetch should succeed");

    assert_eq!(fetched.status, 200);
    assert_eq!(fetched.body, "@font-face{}");
}

#[tokio::test]
async fn test_fetch_text_reports_final_url_after_redirect() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("Location", format!("{}/new/css", mock_server.uri())),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new/css"))
        .respond_with(ResponseTemplate::new(200).set_body_string("body{}"))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new(&config()).expect("client should build");
    let fetched = client
        .fetch_text(&format!("{}/old", mock_server.uri()))
        .await
        .expect("fetch should succeed");

    assert_eq!(fetched.url.path(), "/new/css");
}

#[tokio::test]
async fn test_fetch_binary_returns_bytes_and_content_type() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.ttf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "font/ttf")
                .set_body_bytes(vec![0_u8, 1, 0, 0, 0]),
        )
        .mount(&mock_server)
        .await;

    let client = HttpClient::new(&config()).expect("client should build");
    let asset = client
        .fetch_binary(&format!("{}/a.ttf", mock_server.uri()))
        .await
        .expect("fetch should succeed");

    assert_eq!(asset.bytes, vec![0_u8, 1, 0, 0, 0]);
    assert_eq!(asset.content_type, "font/ttf");
}

#[tokio::test]
async fn test_fetch_binary_defaults_content_type() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.woff2"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new(&config()).expect("client should build");
    let asset = client
        .fetch_binary(&format!("{}/a.woff2", mock_server.uri()))
        .await
        .expect("fetch should succeed");

    assert_eq!(asset.content_type, "font/woff2");
}

#[tokio::test]
async fn test_fetch_not_found_is_not_retried() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.woff2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client =
        HttpClient::with_retry_policy(&config(), fast_retries(3)).expect("client should build");
    let error = client
        .fetch_binary(&format!("{}/missing.woff2", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(
        matches!(error, DownloadError::HttpStatus { status: 404, .. }),
        "Expected HttpStatus 404, got: {error:?}"
    );
}

#[tokio::test]
async fn test_fetch_retries_transient_failure_then_succeeds() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/css"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/css"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client =
        HttpClient::with_retry_policy(&config(), fast_retries(3)).expect("client should build");
    let fetched = client
        .fetch_text(&format!("{}/css", mock_server.uri()))
        .await
        .expect("retry should recover");

    assert_eq!(fetched.body, "ok");
}

#[tokio::test]
async fn test_fetch_gives_up_after_max_attempts() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/css"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client =
        HttpClient::with_retry_policy(&config(), fast_retries(2)).expect("client should build");
    let error = client
        .fetch_text(&format!("{}/css", mock_server.uri()))
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(500));
}

#[tokio::test]
async fn test_fetch_times_out() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.woff2"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new(&Config {
        timeout_secs: 1,
        ..config()
    })
    .expect("client should build");
    let error = client
        .fetch_binary(&format!("{}/slow.woff2", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(
        matches!(error, DownloadError::Timeout { .. }),
        "Expected Timeout, got: {error:?}"
    );
}
