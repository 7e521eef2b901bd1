//! Mock HTTP server setup for integration tests

use ai_synth::config::{ApiStyle, ProviderConfig, RetryConfig};
use ai_synth::{CompletionClientBuilder, HttpCompletionClient};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub const API_KEY: &str = "sk-test";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    pub fn provider(&self, style: ApiStyle, model: &str) -> ProviderConfig {
        ProviderConfig::new("mock", style, model)
            .with_base_url(&self.base_url)
            .with_api_key(API_KEY)
            .with_timeout(5)
    }

    /// OpenAI-compatible client pointed at the mock server.
    pub fn openai_client(&self) -> HttpCompletionClient {
        CompletionClientBuilder::new(self.provider(ApiStyle::OpenAiCompatible, "test-model"))
            .build()
            .expect("client")
    }

    /// Same as [`openai_client`](Self::openai_client) with one retry for transient failures.
    pub fn openai_client_with_retry(&self) -> HttpCompletionClient {
        let cfg = self
            .provider(ApiStyle::OpenAiCompatible, "test-model")
            .with_retry(RetryConfig::once(0));
        CompletionClientBuilder::new(cfg).build().expect("client")
    }

    /// Chat-completions mock answering `content`, hit `hits` times.
    pub async fn mock_chat_content(&self, body_matcher: Matcher, content: &str, hits: usize) -> Mock {
        let body = json!({
            "id": "chatcmpl-mock",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
        });
        self.mock_json_response("/chat/completions", body_matcher, 200, &body.to_string(), hits)
            .await
    }

    /// Create a mock for an arbitrary JSON response
    pub async fn mock_json_response(
        &self,
        path: &str,
        body_matcher: Matcher,
        status: usize,
        body: &str,
        hits: usize,
    ) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", path)
            .match_body(body_matcher)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    /// Create a mock for an error response
    pub async fn mock_error_response(&self, path: &str, status: usize, message: &str, hits: usize) -> Mock {
        let body = json!({"error": {"message": message, "type": "mock_error"}});
        self.mock_json_response(path, Matcher::Any, status, &body.to_string(), hits)
            .await
    }
}

/// Matches request bodies sampled at `temperature`.
pub fn temperature(t: f64) -> Matcher {
    Matcher::PartialJson(json!({ "temperature": t }))
}

/// What [`RawHttpServer`] does with an accepted connection.
#[derive(Debug, Clone)]
pub enum RawReply {
    /// Full `200 OK` with this JSON body.
    Complete(String),
    /// `200 OK` announcing `Content-Length: 100`, then this prefix and a closed socket.
    Truncated(String),
    /// Read the request and never answer.
    Silent,
}

/// Plain TCP server for exchanges mockito cannot produce: silent peers and
/// bodies that break off. Connection `i` is answered with `replies[i]`, or
/// [`RawReply::Silent`] once the list runs out.
pub struct RawHttpServer {
    pub base_url: String,
    accepted: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl RawHttpServer {
    pub async fn start(replies: Vec<RawReply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let base_url = format!("http://{}", listener.local_addr().expect("addr"));
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();

        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let index = counter.fetch_add(1, Ordering::SeqCst);
                let reply = replies.get(index).cloned().unwrap_or(RawReply::Silent);
                tokio::spawn(serve(stream, reply));
            }
        });

        Self {
            base_url,
            accepted,
            handle,
        }
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

impl Drop for RawHttpServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(mut stream: TcpStream, reply: RawReply) {
    read_request(&mut stream).await;
    let response = match reply {
        RawReply::Complete(body) => format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        ),
        RawReply::Truncated(prefix) => format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\nconnection: close\r\n\r\n{}",
            prefix
        ),
        RawReply::Silent => {
            // Hold the socket until the client gives up.
            let mut buf = [0u8; 1024];
            while let Ok(n) = stream.read(&mut buf).await {
                if n == 0 {
                    break;
                }
            }
            return;
        }
    };
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Read one request: headers up to the blank line, then `content-length` bytes.
async fn read_request(stream: &mut TcpStream) {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        data.extend_from_slice(&buf[..n]);
        let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&data[..end]).to_ascii_lowercase();
        let length = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if data.len() >= end + 4 + length {
            return;
        }
    }
}

/// OpenAI-compatible chat body answering `content`.
pub fn chat_body(content: &str) -> String {
    json!({
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}
