use httpmock::Method::POST;
use httpmock::MockServer;
use serde_json::json;

use reach_poster::error::{ReachPosterError, UpstreamKind};
use reach_poster::interfaces::providers::{CompletionRequest, ImageGenerator, TextGenerator};
use reach_poster::providers::openai::SAFE_FALLBACK_PROMPTS;
use reach_poster::providers::OpenAiProvider;

fn provider(server: &MockServer) -> OpenAiProvider {
    OpenAiProvider::new(
        "sk-test".to_string(),
        Some("gpt-4o-mini".to_string()),
        None,
        Some(server.base_url()),
    )
}

#[tokio::test]
async fn chat_completion_returns_trimmed_text() {
    let server = MockServer::start_async().await;
    let chat = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer sk-test")
                .body_includes("\"model\":\"gpt-4o-mini\"");
            then.status(200).json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": "  You are not alone.  "}}]
            }));
        })
        .await;

    let text = provider(&server)
        .complete(&CompletionRequest::new("system", "Write about hope"))
        .await
        .unwrap();
    assert_eq!(text, "You are not alone.");
    chat.assert_calls(1);
}

#[tokio::test]
async fn quota_errors_are_classified() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429).json_body(json!({
                "error": {"message": "You exceeded your current quota", "type": "insufficient_quota"}
            }));
        })
        .await;

    let err = provider(&server)
        .complete(&CompletionRequest::new("", "hi"))
        .await
        .unwrap_err();
    match &err {
        ReachPosterError::Upstream(upstream) => assert_eq!(upstream.kind, UpstreamKind::Quota),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.body().title, "Quota Exceeded");
}

#[tokio::test]
async fn content_policy_rejection_retries_with_a_safe_prompt() {
    let server = MockServer::start_async().await;
    let rejected = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/images/generations")
                .body_includes("a bruised face");
            then.status(400).json_body(json!({
                "error": {"code": "content_policy_violation", "message": "Your request was rejected"}
            }));
        })
        .await;
    let accepted = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/images/generations")
                .body_includes("photograph");
            then.status(200).json_body(json!({
                "data": [{"url": "https://images.example/render.png", "revised_prompt": "a candle"}]
            }));
        })
        .await;

    let image = provider(&server).generate("a bruised face").await.unwrap();
    assert_eq!(image.url, "https://images.example/render.png");
    assert!(SAFE_FALLBACK_PROMPTS.contains(&image.prompt.as_str()));
    assert_eq!(image.revised_prompt.as_deref(), Some("a candle"));
    rejected.assert_calls(1);
    accepted.assert_calls(1);
}

#[tokio::test]
async fn repeated_policy_rejections_give_up() {
    let server = MockServer::start_async().await;
    let rejected = server
        .mock_async(|when, then| {
            when.method(POST).path("/images/generations");
            then.status(400).json_body(json!({
                "error": {"code": "content_policy_violation", "message": "rejected"}
            }));
        })
        .await;

    let err = provider(&server).generate("anything").await.unwrap_err();
    assert_eq!(err.body().title, "Content Policy");
    rejected.assert_calls(3);
}
