//! Completion client behaviour against a mock HTTP server.

use ai_synth::config::{ApiStyle, ProviderConfig};
use ai_synth::{CompletionClient, CompletionClientBuilder, CompletionRequest, FailureKind, Message};
use mockito::Matcher;
use serde_json::json;

use crate::mock_server::{MockServerFixture, API_KEY};

fn request(model: &str) -> CompletionRequest {
    CompletionRequest::builder(model)
        .message(Message::system("Answer tersely"))
        .message(Message::user("What is 2 + 2?"))
        .temperature(0.7)
        .max_tokens(64)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_openai_success_sends_expected_body() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/chat/completions")
            .match_header("authorization", format!("Bearer {}", API_KEY).as_str())
            .match_header("x-ai-synth-request-id", Matcher::Any)
            .match_body(Matcher::PartialJson(json!({
                "model": "test-model",
                "temperature": 0.7,
                "max_tokens": 64,
                "stream": false,
                "messages": [
                    {"role": "system", "content": "Answer tersely"},
                    {"role": "user", "content": "What is 2 + 2?"}
                ]
            })))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"4"}}]}"#)
            .create_async()
            .await
    };

    let result = fixture.openai_client().complete(&request("test-model")).await;
    assert_eq!(result, Ok("4".to_string()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_client_error_surfaces_vendor_message_without_retry() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_error_response("/chat/completions", 401, "Invalid API key provided", 1)
        .await;

    let failure = fixture
        .openai_client_with_retry()
        .complete(&request("test-model"))
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::Protocol);
    assert_eq!(failure.status, Some(401));
    assert_eq!(failure.reason, "Invalid API key provided");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_retried_once() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_error_response("/chat/completions", 503, "overloaded", 2)
        .await;

    let failure = fixture
        .openai_client_with_retry()
        .complete(&request("test-model"))
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::Protocol);
    assert_eq!(failure.status, Some(503));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_no_retry_by_default() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_error_response("/chat/completions", 500, "boom", 1)
        .await;

    let failure = fixture
        .openai_client()
        .complete(&request("test-model"))
        .await
        .unwrap_err();
    assert_eq!(failure.status, Some(500));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_without_message_gets_generic_reason() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json_response("/chat/completions", Matcher::Any, 404, "not found", 1)
        .await;

    let failure = fixture
        .openai_client()
        .complete(&request("test-model"))
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Protocol);
    assert!(failure.reason.contains("404"), "reason: {}", failure.reason);
}

#[tokio::test]
async fn test_missing_content_is_a_contract_failure() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json_response("/chat/completions", Matcher::Any, 200, r#"{"choices":[]}"#, 1)
        .await;

    let failure = fixture
        .openai_client_with_retry()
        .complete(&request("test-model"))
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Contract);
    assert_eq!(failure.status, Some(200));
}

#[tokio::test]
async fn test_non_json_body_is_a_contract_failure() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json_response("/chat/completions", Matcher::Any, 200, "<html>oops</html>", 1)
        .await;

    let failure = fixture
        .openai_client()
        .complete(&request("test-model"))
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Contract);
}

#[tokio::test]
async fn test_unreachable_host_is_a_transport_failure() {
    let cfg = ProviderConfig::new("mock", ApiStyle::OpenAiCompatible, "test-model")
        .with_base_url("http://127.0.0.1:1")
        .with_api_key(API_KEY)
        .with_timeout(5);
    let client = CompletionClientBuilder::new(cfg).build().unwrap();

    let failure = client.complete(&request("test-model")).await.unwrap_err();
    assert_eq!(failure.kind, FailureKind::Transport);
    assert_eq!(failure.status, None);
}

#[tokio::test]
async fn test_anthropic_messages_round_trip() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", API_KEY)
            .match_header("anthropic-version", Matcher::Any)
            .match_body(Matcher::PartialJson(json!({
                "model": "claude-test",
                "system": "Answer tersely",
                "max_tokens": 64,
                "messages": [{
                    "role": "user",
                    "content": [{"type": "text", "text": "What is 2 + 2?"}]
                }]
            })))
            .with_status(200)
            .with_body(
                r#"{"content":[{"type":"text","text":"4"}],"stop_reason":"end_turn","usage":{"input_tokens":10,"output_tokens":1}}"#,
            )
            .create_async()
            .await
    };

    let client = CompletionClientBuilder::new(
        fixture.provider(ApiStyle::AnthropicMessages, "claude-test"),
    )
    .build()
    .unwrap();
    let result = client.complete(&request("claude-test")).await;
    assert_eq!(result, Ok("4".to_string()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_generate_round_trip() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/v1beta/models/gemini-test:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), API_KEY.into()))
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": {"temperature": 0.7, "maxOutputTokens": 64}
            })))
            .with_status(200)
            .with_body(
                r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"4"}]},"finishReason":"STOP"}]}"#,
            )
            .create_async()
            .await
    };

    let client = CompletionClientBuilder::new(
        fixture.provider(ApiStyle::GeminiGenerate, "gemini-test"),
    )
    .build()
    .unwrap();
    let result = client.complete(&request("gemini-test")).await;
    assert_eq!(result, Ok("4".to_string()));
    mock.assert_async().await;
}
