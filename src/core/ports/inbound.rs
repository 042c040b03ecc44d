//! Inbound ports (use-case ports) define the application service interface that
//! driving adapters (CLI, HTTP server) consume.

use async_trait::async_trait;

use crate::core::domain::Submission;
use crate::core::error::Result;

/// The question-answering use case.
///
/// Implementations call the completion gateway at most once per `submit` and
/// never for blank input.
#[async_trait]
pub trait QaService: Send + Sync {
    /// Validate `raw_question` and, when it is not blank, answer it.
    async fn submit(&self, raw_question: &str) -> Result<Submission>;
}
