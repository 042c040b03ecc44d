use async_trait::async_trait;
use serde::Serialize;

use crate::core::domain::CompletionRequest;
use crate::core::error::Result;

/// Abstraction over the hosted completion service.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Issue exactly one completion request and return the first choice's text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Short provider name used in logs and error messages.
    fn provider(&self) -> &str;
}

/// Everything the page template needs for one render.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    /// Text echoed back into the input field.
    pub question: String,
    /// Present only when a completion was received for this submission.
    pub answer: Option<AnswerView>,
    /// Markup injected verbatim ahead of the answer container.
    pub style: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerView {
    pub model: String,
    pub answer: String,
}

/// Abstraction for turning a [`PageView`] into HTML.
pub trait PageRenderer: Send + Sync {
    fn render(&self, view: &PageView) -> Result<String>;

    /// Page shown when a submission fails. Carries no answer block.
    fn render_failure(&self) -> Result<String>;
}
