//! End-to-end best-of-n runs over HTTP.

use ai_synth::telemetry::InMemoryRunSink;
use ai_synth::types::NO_SUCCESSFUL_CANDIDATES;
use ai_synth::{
    BestOfN, BestOfNConfig, CompletionRequest, FailureKind, Message, ResponseMode, SynthConfig,
};
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;

use crate::mock_server::{temperature, MockServerFixture};

fn request() -> CompletionRequest {
    CompletionRequest::new("test-model", vec![Message::user("Write a haiku about rust")]).unwrap()
}

#[tokio::test]
async fn test_candidates_then_synthesis() {
    let fixture = MockServerFixture::new().await;
    let candidates = fixture
        .mock_chat_content(temperature(0.9), "rust never sleeps", 3)
        .await;
    let synthesis = fixture
        .mock_chat_content(
            Matcher::AllOf(vec![
                temperature(0.2),
                Matcher::PartialJson(json!({"max_tokens": 3000})),
                Matcher::Regex("rust never sleeps".into()),
            ]),
            "iron turns to red",
            1,
        )
        .await;

    let sink = Arc::new(InMemoryRunSink::new(10));
    let pipeline = BestOfN::new(Arc::new(fixture.openai_client()), BestOfNConfig::default()).unwrap()
        .with_sink(sink.clone());
    let outcome = pipeline.best_of_n(&request(), 3).await;

    assert_eq!(outcome.final_answer, Ok("iron turns to red".to_string()));
    assert_eq!(outcome.candidates.len(), 3);
    assert_eq!(outcome.candidates.success_count(), 3);
    assert_eq!(sink.get_events_by_run(outcome.run_id).len(), 2);
    candidates.assert_async().await;
    synthesis.assert_async().await;
}

#[tokio::test]
async fn test_all_candidates_failing_skips_synthesis_call() {
    let fixture = MockServerFixture::new().await;
    let failing = fixture
        .mock_json_response(
            "/chat/completions",
            temperature(0.9),
            500,
            r#"{"error":{"message":"upstream unavailable"}}"#,
            4,
        )
        .await;
    let synthesis = fixture.mock_chat_content(temperature(0.2), "never", 0).await;

    let pipeline = BestOfN::new(Arc::new(fixture.openai_client()), BestOfNConfig::default()).unwrap();
    let outcome = pipeline.best_of_n(&request(), 4).await;

    let failure = outcome.final_answer.unwrap_err();
    assert_eq!(failure.kind, FailureKind::NoCandidates);
    assert_eq!(failure.reason, NO_SUCCESSFUL_CANDIDATES);
    assert_eq!(outcome.candidates.len(), 4);
    for (_, f) in outcome.candidates.failures() {
        assert_eq!(f.reason, "upstream unavailable");
    }
    failing.assert_async().await;
    synthesis.assert_async().await;
}

#[tokio::test]
async fn test_standard_mode_uses_request_temperature() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_chat_content(temperature(0.7), "a single answer", 1)
        .await;

    let pipeline = BestOfN::new(Arc::new(fixture.openai_client()), BestOfNConfig::default()).unwrap();
    let outcome = pipeline.respond(&request(), ResponseMode::Standard).await;

    assert_eq!(outcome.final_answer, Ok("a single answer".to_string()));
    assert!(outcome.candidates.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_pipeline_from_yaml_config() {
    let fixture = MockServerFixture::new().await;
    let _candidates = fixture.mock_chat_content(temperature(0.8), "draft", 2).await;
    let synthesis = fixture.mock_chat_content(temperature(0.1), "final", 1).await;

    let yaml = format!(
        r#"
provider:
  id: mock
  api_style: openai_compatible
  base_url: {}
  model: test-model
  api_key: sk-test
best_of_n:
  default_candidates: 2
  candidate_temperature: 0.8
  synthesis_temperature: 0.1
"#,
        fixture.base_url
    );
    let config = SynthConfig::from_yaml_str(&yaml).unwrap();
    let pipeline = BestOfN::from_config(&config).unwrap();
    let outcome = pipeline.best_of_default(&request()).await;

    assert_eq!(outcome.final_answer, Ok("final".to_string()));
    assert_eq!(outcome.candidates.len(), 2);
    synthesis.assert_async().await;
}
