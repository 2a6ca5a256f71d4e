use std::time::Duration;

use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use serde_json::json;

use reach_poster::error::{ReachPosterError, UpstreamKind};
use reach_poster::instagram::InstagramClient;
use reach_poster::interfaces::publishing::MediaPublisher;

fn client(server: &MockServer) -> InstagramClient {
    InstagramClient::new(
        "token-123".to_string(),
        "1784".to_string(),
        Some(server.base_url()),
    )
    .with_polling(3, Duration::from_millis(10))
}

#[tokio::test]
async fn publishes_after_container_finishes() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/1784/media")
                .body_includes("access_token=token-123")
                .body_includes("image_url=https");
            then.status(200).json_body(json!({"id": "c-1"}));
        })
        .await;
    let status = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/c-1")
                .query_param("fields", "status_code");
            then.status(200).json_body(json!({"status_code": "FINISHED", "id": "c-1"}));
        })
        .await;
    let publish = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/1784/media_publish")
                .body_includes("creation_id=c-1");
            then.status(200).json_body(json!({"id": 17895}));
        })
        .await;

    let published = client(&server)
        .publish("https://img.example/post.jpg", "Hope lives here")
        .await
        .unwrap();
    assert_eq!(published.container_id, "c-1");
    assert_eq!(published.media_id, "17895");

    create.assert_calls(1);
    status.assert_calls(1);
    publish.assert_calls(1);
}

#[tokio::test]
async fn container_error_stops_before_publishing() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/1784/media");
            then.status(200).json_body(json!({"id": "c-2"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/c-2");
            then.status(200).json_body(json!({"status_code": "ERROR"}));
        })
        .await;
    let publish = server
        .mock_async(|when, then| {
            when.method(POST).path("/1784/media_publish");
            then.status(200).json_body(json!({"id": "never"}));
        })
        .await;

    let err = client(&server)
        .publish("https://img.example/post.jpg", "caption")
        .await
        .unwrap_err();
    assert!(matches!(err, ReachPosterError::Upstream(_)));
    publish.assert_calls(0);
}

#[tokio::test]
async fn container_that_never_finishes_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/1784/media");
            then.status(200).json_body(json!({"id": "c-3"}));
        })
        .await;
    let status = server
        .mock_async(|when, then| {
            when.method(GET).path("/c-3");
            then.status(200).json_body(json!({"status_code": "IN_PROGRESS"}));
        })
        .await;

    let err = client(&server)
        .publish("https://img.example/post.jpg", "caption")
        .await
        .unwrap_err();
    match err {
        ReachPosterError::Upstream(upstream) => assert_eq!(upstream.kind, UpstreamKind::Timeout),
        other => panic!("unexpected error: {other}"),
    }
    status.assert_calls(3);
}

#[tokio::test]
async fn rejected_token_is_an_authentication_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/1784/media");
            then.status(400).json_body(json!({
                "error": {"message": "Invalid OAuth access token.", "type": "OAuthException", "code": 190}
            }));
        })
        .await;

    let err = client(&server)
        .create_container("https://img.example/post.jpg", "caption")
        .await
        .unwrap_err();
    assert_eq!(err.status(), axum::http::StatusCode::BAD_GATEWAY);
    assert_eq!(err.body().title, "API Key Error");
}
