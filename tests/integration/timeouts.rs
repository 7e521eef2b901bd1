//! Per-call deadlines and responses that break off mid-body.

use ai_synth::config::{ApiStyle, ProviderConfig};
use ai_synth::pipeline::FanOutExecutor;
use ai_synth::{
    BestOfNConfig, CompletionClient, CompletionClientBuilder, CompletionRequest, FailureKind,
    HttpCompletionClient, Message,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::mock_server::{chat_body, RawHttpServer, RawReply, API_KEY};

fn request() -> CompletionRequest {
    CompletionRequest::new("test-model", vec![Message::user("Name a colour")]).unwrap()
}

fn client(base_url: &str, timeout_secs: u64) -> HttpCompletionClient {
    let cfg = ProviderConfig::new("raw", ApiStyle::OpenAiCompatible, "test-model")
        .with_base_url(base_url)
        .with_api_key(API_KEY)
        .with_timeout(timeout_secs);
    CompletionClientBuilder::new(cfg).build().unwrap()
}

#[tokio::test]
async fn test_silent_branches_time_out_without_blocking_siblings() {
    let server = RawHttpServer::start(vec![RawReply::Complete(chat_body("teal"))]).await;
    let fan_out = FanOutExecutor::new(
        Arc::new(client(&server.base_url, 1)),
        BestOfNConfig::default(),
    )
    .unwrap();

    let started = Instant::now();
    let set = fan_out.generate_candidates(&request(), 3, 0.9).await;
    let elapsed = started.elapsed();

    assert_eq!(set.len(), 3);
    assert_eq!(server.accepted(), 3);
    assert_eq!(set.success_count(), 1);
    assert_eq!(set.successes().collect::<Vec<_>>(), vec!["teal"]);

    let failures: Vec<_> = set.failures().collect();
    assert_eq!(failures.len(), 2);
    for (_, failure) in failures {
        assert_eq!(failure.kind, FailureKind::Transport);
        assert_eq!(failure.status, None);
        assert_eq!(failure.reason, "request timed out after 1s");
    }

    assert!(elapsed >= Duration::from_millis(900), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_timeout_reason_is_stable_for_a_single_call() {
    let server = RawHttpServer::start(vec![RawReply::Silent]).await;
    let client = client(&server.base_url, 1);

    for _ in 0..2 {
        let failure = client.complete(&request()).await.unwrap_err();
        assert_eq!(failure.kind, FailureKind::Transport);
        assert_eq!(failure.reason, "request timed out after 1s");
    }
}

#[tokio::test]
async fn test_body_cut_off_after_ok_status_is_a_contract_failure() {
    let server = RawHttpServer::start(vec![RawReply::Truncated(r#"{"choices":[{"#.into())]).await;
    let client = client(&server.base_url, 5);

    let failure = client.complete(&request()).await.unwrap_err();
    assert_eq!(failure.kind, FailureKind::Contract);
    assert_eq!(failure.status, Some(200));
    assert!(failure.reason.contains("HTTP 200"), "{}", failure.reason);
    assert!(!failure.is_transient());
    assert_eq!(server.accepted(), 1);
}
