//! Application service that provides the `QaService` trait.
//! This is the use-case port implementation the server and CLI consume.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::core::{
    config::CompletionSettings,
    domain::{CompletionRequest, Exchange, Prompt, Question, Submission},
    error::Result as CoreResult,
    ports::{CompletionGateway, QaService},
};

/// Application service that implements `QaService`.
///
/// Holds the gateway and the fixed request settings and is injected into the
/// driving adapters.
pub struct AppService {
    gateway: Arc<dyn CompletionGateway>,
    settings: CompletionSettings,
}

impl AppService {
    pub fn new(gateway: Arc<dyn CompletionGateway>, settings: CompletionSettings) -> Self {
        Self { gateway, settings }
    }

    async fn answer(&self, question: Question) -> CoreResult<Exchange> {
        let prompt = Prompt::for_question(&question);
        let request = CompletionRequest::single_turn(
            &self.settings.model,
            prompt,
            self.settings.routing_id.as_deref(),
        );

        debug!(
            provider = self.gateway.provider(),
            model = %request.model,
            prompt_len = request.prompt().len(),
            "completion requested"
        );
        let answer = self.gateway.complete(&request).await.inspect_err(|err| {
            warn!(provider = self.gateway.provider(), error = %err, "completion failed");
        })?;
        info!(answer_len = answer.len(), "completion received");

        Ok(Exchange {
            question: question.as_str().to_string(),
            prompt: request.prompt().to_string(),
            answer,
            model: request.model,
        })
    }
}

#[async_trait]
impl QaService for AppService {
    async fn submit(&self, raw_question: &str) -> CoreResult<Submission> {
        let Some(question) = Question::parse(raw_question) else {
            debug!("blank question, completion suppressed");
            return Ok(Submission::Suppressed);
        };

        let span = info_span!("interaction", interaction_id = %Uuid::new_v4());
        let exchange = self.answer(question).instrument(span).await?;
        Ok(Submission::Answered(exchange))
    }
}
