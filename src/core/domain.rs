//! Query-response domain types. Everything here lives for one submission only.

use serde::{Deserialize, Serialize};

/// Fixed instruction template wrapped around every question.
pub const PROMPT_PREFIX: &str = "Answer the question: ";

/// A question that passed the non-blank check.
///
/// The raw text is kept as typed; trimming is only used to decide whether the
/// input counts as blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(String);

impl Question {
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn for_question(question: &Question) -> Self {
        Self(format!("{PROMPT_PREFIX}{}", question.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Single-turn completion request handed to a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Cost-attribution identifier. Has no effect on the generated answer.
    pub routing_id: Option<String>,
}

impl CompletionRequest {
    pub fn single_turn(model: &str, prompt: Prompt, routing_id: Option<&str>) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage::user(prompt.into_string())],
            routing_id: routing_id.map(str::to_string),
        }
    }

    /// Text of the (only) user message.
    pub fn prompt(&self) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

/// The query-response pair produced by one valid submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub question: String,
    pub prompt: String,
    pub answer: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Blank input; the gateway was not called.
    Suppressed,
    Answered(Exchange),
}

impl Submission {
    pub fn exchange(&self) -> Option<&Exchange> {
        match self {
            Submission::Suppressed => None,
            Submission::Answered(exchange) => Some(exchange),
        }
    }
}
