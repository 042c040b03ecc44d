//! CLI inbound adapter that answers a single question from the terminal.

use std::{io::Write, sync::Arc};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::core::{domain::Submission, ports::QaService};

/// CLI adapter that consumes the `QaService` for the `ask` command.
pub struct CliAdapter {
    service: Arc<dyn QaService>,
}

impl CliAdapter {
    pub fn new(service: Arc<dyn QaService>) -> Self {
        Self { service }
    }

    /// Answer `question` and write the heading plus answer to `out`.
    ///
    /// Blank input writes nothing.
    pub async fn ask<W: Write>(&self, question: &str, out: &mut W) -> Result<()> {
        let submission = self
            .service
            .submit(question)
            .await
            .map_err(|e| anyhow!("{e}"))?;

        match submission {
            Submission::Suppressed => Ok(()),
            Submission::Answered(exchange) => {
                debug!(
                    question = %exchange.question,
                    prompt_len = exchange.prompt.len(),
                    "answered"
                );
                writeln!(out, "### 🤖 {}\n\n{}", exchange.model, exchange.answer)
                    .context("Failed to write answer")
            }
        }
    }
}
