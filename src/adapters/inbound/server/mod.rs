//! HTTP server inbound adapter that serves the Q&A page.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context as AnyhowContext, Result};
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::{
    adapters::outbound::templating::FAILURE_MESSAGE,
    core::{
        domain::Submission,
        error::Error as CoreError,
        ports::{AnswerView, PageRenderer, PageView, QaService},
    },
    style::LLM_RESPONSE_STYLE,
};

/// Configuration options for the server adapter.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// Style fragment injected ahead of every answer block.
    pub response_style: String,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            response_style: LLM_RESPONSE_STYLE.to_string(),
        }
    }
}

/// Server adapter that exposes the `QaService` as a web page.
pub struct ServerAdapter {
    service: Arc<dyn QaService>,
    renderer: Arc<dyn PageRenderer>,
    options: ServeOptions,
}

impl ServerAdapter {
    pub fn new(
        service: Arc<dyn QaService>,
        renderer: Arc<dyn PageRenderer>,
        options: ServeOptions,
    ) -> Self {
        Self {
            service,
            renderer,
            options,
        }
    }

    /// Run the HTTP server on the given address.
    pub async fn run(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .context("failed to bind Q&A page listener")?;
        self.run_with_listener(listener).await
    }

    /// Run the HTTP server with an existing listener (useful for tests).
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<()> {
        let router = self.into_router();
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "vanilla-qa serve listening");
        } else {
            info!("vanilla-qa serve listening");
        }
        axum::serve(listener, router.into_make_service())
            .await
            .context("serve endpoint failed")
    }

    pub fn into_router(self) -> Router {
        let state = Arc::new(ServeState {
            service: self.service,
            renderer: self.renderer,
            response_style: self.options.response_style,
        });
        build_router(state)
    }
}

struct ServeState {
    service: Arc<dyn QaService>,
    renderer: Arc<dyn PageRenderer>,
    response_style: String,
}

impl ServeState {
    fn page(&self, question: &str, answer: Option<AnswerView>) -> Result<Html<String>, ServerError> {
        let view = PageView {
            question: question.to_string(),
            answer,
            style: self.response_style.clone(),
        };
        self.renderer
            .render(&view)
            .map(Html)
            .map_err(|err| self.failure(err))
    }

    fn failure(&self, err: CoreError) -> ServerError {
        error!(error = %err, "submission failed");
        let body = self.renderer.render_failure().unwrap_or_else(|render_err| {
            error!(error = %render_err, "failure page could not be rendered");
            FAILURE_MESSAGE.to_string()
        });
        ServerError { body }
    }
}

/// Generic failure surfaced to the browser. Never carries an answer block.
struct ServerError {
    body: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Html(self.body)).into_response()
    }
}

fn build_router(state: Arc<ServeState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/ask", post(ask_handler))
        .route("/healthz", get(health_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

#[derive(Deserialize)]
struct AskForm {
    #[serde(default)]
    question: String,
}

async fn index_handler(State(state): State<Arc<ServeState>>) -> Result<Html<String>, ServerError> {
    state.page("", None)
}

async fn ask_handler(
    State(state): State<Arc<ServeState>>,
    Form(form): Form<AskForm>,
) -> Result<Html<String>, ServerError> {
    let submission = state
        .service
        .submit(&form.question)
        .await
        .map_err(|err| state.failure(err))?;

    match submission {
        Submission::Suppressed => state.page(&form.question, None),
        Submission::Answered(exchange) => {
            debug!(prompt_len = exchange.prompt.len(), "rendering answer");
            let answer = AnswerView {
                model: exchange.model,
                answer: exchange.answer,
            };
            state.page(&exchange.question, Some(answer))
        }
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::outbound::templating::HandlebarsRenderer,
        core::domain::{Exchange, Question, Submission},
    };
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use std::sync::Mutex;
    use tower::ServiceExt;

    const MODEL: &str = "bedrock/us.amazon.nova-pro-v1:0";

    /// Answers from a fixed table and records every question it is asked.
    struct StubService {
        answers: Vec<(&'static str, &'static str)>,
        asked: Mutex<Vec<String>>,
        fail: bool,
    }

    impl StubService {
        fn new(answers: Vec<(&'static str, &'static str)>) -> Self {
            Self {
                answers,
                asked: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(vec![])
            }
        }
    }

    #[async_trait]
    impl QaService for StubService {
        async fn submit(&self, raw_question: &str) -> crate::core::Result<Submission> {
            let Some(question) = Question::parse(raw_question) else {
                return Ok(Submission::Suppressed);
            };
            self.asked.lock().unwrap().push(question.as_str().to_string());
            if self.fail {
                return Err(CoreError::LlmProvider {
                    provider: "stub".into(),
                    details: "upstream unavailable".into(),
                });
            }
            let answer = self
                .answers
                .iter()
                .find(|(q, _)| *q == question.as_str())
                .map(|(_, a)| a.to_string())
                .unwrap_or_default();
            Ok(Submission::Answered(Exchange {
                question: question.as_str().to_string(),
                prompt: format!("Answer the question: {}", question.as_str()),
                answer,
                model: MODEL.to_string(),
            }))
        }
    }

    fn app(service: Arc<StubService>) -> Router {
        let renderer = Arc::new(HandlebarsRenderer::new().unwrap());
        ServerAdapter::new(service, renderer, ServeOptions::default()).into_router()
    }

    fn ask_request(form_body: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri("/ask")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(form_body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn index_renders_empty_form() {
        let response = app(Arc::new(StubService::new(vec![])))
            .oneshot(
                axum::http::Request::builder()
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Vanilla AI Q&amp;A Demo"));
        assert!(html.contains(">Send</button>"));
        assert!(!html.contains("class=\"llm-response\""));
    }

    #[tokio::test]
    async fn ask_renders_answer_in_styled_container() {
        let service = Arc::new(StubService::new(vec![(
            "What is the capital of France?",
            "Paris is the capital of France.",
        )]));
        let response = app(service.clone())
            .oneshot(ask_request("question=What+is+the+capital+of+France%3F"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(&format!("<h3>🤖 {MODEL}</h3>")));
        assert!(html.contains(LLM_RESPONSE_STYLE));
        assert!(html.contains(
            "<div class=\"llm-response\">Paris is the capital of France.</div>"
        ));
        assert!(html.contains("value=\"What is the capital of France?\""));
        assert_eq!(service.asked.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_question_skips_service_call() {
        let service = Arc::new(StubService::new(vec![]));
        for body in ["question=", "question=+++", ""] {
            let response = app(service.clone()).oneshot(ask_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let html = body_text(response).await;
            assert!(!html.contains("class=\"llm-response\""));
        }
        assert!(service.asked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_returns_500_without_answer_block() {
        let service = Arc::new(StubService::failing());
        let response = app(service.clone())
            .oneshot(ask_request("question=anything"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = body_text(response).await;
        assert!(html.contains(FAILURE_MESSAGE));
        assert!(!html.contains("llm-response"));
        assert_eq!(service.asked.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_answer_replaces_first() {
        let service = Arc::new(StubService::new(vec![
            ("first?", "Answer one."),
            ("second?", "Answer two."),
        ]));
        let router = app(service.clone());

        let first = body_text(
            router
                .clone()
                .oneshot(ask_request("question=first%3F"))
                .await
                .unwrap(),
        )
        .await;
        assert!(first.contains("Answer one."));

        let second = body_text(
            router
                .oneshot(ask_request("question=second%3F"))
                .await
                .unwrap(),
        )
        .await;
        assert!(second.contains("Answer two."));
        assert!(!second.contains("Answer one."));
        assert_eq!(second.matches("class=\"llm-response\"").count(), 1);
        assert_eq!(service.asked.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = app(Arc::new(StubService::new(vec![])))
            .oneshot(
                axum::http::Request::builder()
                    .uri("/missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
