//! Gateway for an OpenAI-compatible LiteLLM proxy.
//!
//! The proxy fronts hosted models (Bedrock, Vertex, ...) under LiteLLM model
//! names such as `bedrock/us.amazon.nova-pro-v1:0` and accepts an extra
//! `model_id` field selecting the inference profile used for cost tracking.

use std::{cmp::max, sync::Arc};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::debug;

use super::llm::build_http_client;
use crate::core::domain::{ChatMessage, CompletionRequest};
use crate::core::error::Error as CoreError;
use crate::core::ports::CompletionGateway;

const PROVIDER: &str = "litellm";

#[derive(Clone)]
pub struct LiteLlmGateway {
    inner: Arc<LiteLlmInner>,
}

struct LiteLlmInner {
    endpoint: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
    semaphore: Arc<Semaphore>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    model_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl LiteLlmGateway {
    pub fn new(
        api_base: &str,
        api_key: Option<String>,
        max_concurrent: usize,
    ) -> Result<Self> {
        let base = api_base.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(anyhow!("API base URL may not be empty"));
        }

        let http_client = build_http_client()?;
        Ok(Self {
            inner: Arc::new(LiteLlmInner {
                endpoint: format!("{base}/chat/completions"),
                api_key: api_key.filter(|key| !key.trim().is_empty()),
                http_client,
                semaphore: Arc::new(Semaphore::new(max(1, max_concurrent))),
            }),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }
}

impl std::fmt::Debug for LiteLlmGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiteLlmGateway")
            .field("endpoint", &self.inner.endpoint)
            .field("has_api_key", &self.inner.api_key.is_some())
            .finish()
    }
}

#[async_trait]
impl CompletionGateway for LiteLlmGateway {
    async fn complete(&self, request: &CompletionRequest) -> crate::core::Result<String> {
        let _permit = self
            .inner
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| CoreError::System(format!("Semaphore error: {e}")))?;

        let body = ChatCompletionBody {
            model: &request.model,
            messages: &request.messages,
            model_id: request.routing_id.as_deref(),
        };

        let mut http_request = self.inner.http_client.post(&self.inner.endpoint).json(&body);
        if let Some(key) = &self.inner.api_key {
            http_request = http_request.bearer_auth(key);
        }

        debug!(endpoint = %self.inner.endpoint, "sending chat completion");
        let response = http_request.send().await.map_err(|err| provider_error(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response body>".to_string());
            return Err(provider_error(format!("request failed ({status}): {text}")));
        }

        let raw = response
            .text()
            .await
            .map_err(|err| provider_error(format!("failed to read response body: {err}")))?;
        first_choice_text(&raw)
    }

    fn provider(&self) -> &str {
        PROVIDER
    }
}

fn provider_error(details: String) -> CoreError {
    CoreError::LlmProvider {
        provider: PROVIDER.to_string(),
        details,
    }
}

fn first_choice_text(raw: &str) -> crate::core::Result<String> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(raw).map_err(|err| CoreError::MalformedResponse(err.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(CoreError::EmptyCompletion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::{Json, Router, extract::State, routing::post};
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use crate::core::domain::{Prompt, Question};

    #[derive(Clone, Default)]
    struct InFlight {
        current: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
        calls: Arc<AtomicUsize>,
    }

    async fn slow_completion(State(state): State<InFlight>) -> Json<Value> {
        let now = state.current.fetch_add(1, Ordering::SeqCst) + 1;
        state.peak.fetch_max(now, Ordering::SeqCst);
        state.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;
        state.current.fetch_sub(1, Ordering::SeqCst);
        Json(json!({ "choices": [{ "message": { "content": "ok" } }] }))
    }

    async fn spawn_slow_upstream(state: InFlight) -> Option<String> {
        let listener = match TcpListener::bind(("127.0.0.1", 0)).await {
            Ok(listener) => listener,
            Err(e) => {
                eprintln!("skipping: {e}");
                return None;
            }
        };
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .route("/chat/completions", post(slow_completion))
            .with_state(state);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Some(format!("http://{addr}"))
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let gateway = LiteLlmGateway::new("http://localhost:4000/", None, 1).unwrap();
        assert_eq!(gateway.endpoint(), "http://localhost:4000/chat/completions");
    }

    #[test]
    fn rejects_blank_api_base() {
        assert!(LiteLlmGateway::new("  ", None, 1).is_err());
    }

    #[test]
    fn body_carries_model_id_only_when_routed() {
        let messages = vec![ChatMessage::user("Answer the question: hi")];
        let routed = ChatCompletionBody {
            model: "bedrock/us.amazon.nova-pro-v1:0",
            messages: &messages,
            model_id: Some("profile"),
        };
        let value = serde_json::to_value(&routed).unwrap();
        assert_eq!(value["model_id"], "profile");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "Answer the question: hi");

        let unrouted = ChatCompletionBody {
            model_id: None,
            ..routed
        };
        let value = serde_json::to_value(&unrouted).unwrap();
        assert!(value.get("model_id").is_none());
    }

    #[test]
    fn takes_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"Paris"}},{"message":{"content":"Lyon"}}]}"#;
        assert_eq!(first_choice_text(raw).unwrap(), "Paris");
    }

    #[test]
    fn empty_choices_is_an_error() {
        let err = first_choice_text(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, CoreError::EmptyCompletion));
    }

    #[test]
    fn garbage_body_is_malformed() {
        let err = first_choice_text("<html>oops</html>").unwrap_err();
        assert!(matches!(err, CoreError::MalformedResponse(_)));
    }

    fn hi_request() -> CompletionRequest {
        let question = Question::parse("hi").unwrap();
        CompletionRequest::single_turn("nova", Prompt::for_question(&question), None)
    }

    #[test]
    fn empty_content_is_a_valid_answer() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":""}}]}"#;
        assert_eq!(first_choice_text(raw).unwrap(), "");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn one_request_in_flight_by_default() {
        let state = InFlight::default();
        let Some(base) = spawn_slow_upstream(state.clone()).await else {
            return;
        };
        let gateway = LiteLlmGateway::new(&base, None, 1).unwrap();
        let request = hi_request();

        let (first, second) = tokio::join!(gateway.complete(&request), gateway.complete(&request));
        assert_eq!(first.unwrap(), "ok");
        assert_eq!(second.unwrap(), "ok");
        assert_eq!(state.calls.load(Ordering::SeqCst), 2);
        assert_eq!(state.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn max_concurrent_allows_parallel_requests() {
        let state = InFlight::default();
        let Some(base) = spawn_slow_upstream(state.clone()).await else {
            return;
        };
        let gateway = LiteLlmGateway::new(&base, None, 2).unwrap();
        let request = hi_request();

        let (first, second) = tokio::join!(gateway.complete(&request), gateway.complete(&request));
        assert!(first.is_ok() && second.is_ok());
        assert_eq!(state.peak.load(Ordering::SeqCst), 2);
    }
}
