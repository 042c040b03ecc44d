use handlebars::Handlebars;
use serde_json::json;
use std::sync::Arc;

use crate::core::error::Error as CoreError;
use crate::core::ports::{PageRenderer, PageView};

pub const PAGE_TITLE: &str = "🔍 Vanilla AI Q&A Demo";
pub const INSTRUCTIONS: &str =
    "Enter your question, and the system will answer it based on the built-in knowledge";
pub const INPUT_LABEL: &str = "Enter your question:";
pub const BUTTON_LABEL: &str = "Send";
pub const BUSY_LABEL: &str = "Processing...";
pub const FAILURE_MESSAGE: &str = "Something went wrong while answering your question.";

const PAGE_TEMPLATE: &str = include_str!("templates/page.hbs");
const FAILURE_TEMPLATE: &str = include_str!("templates/failure.hbs");

/// Renders the single page with `handlebars`.
///
/// `{{ }}` escapes, so the question and model name are safe to echo. The style
/// fragment and the answer go through `{{{ }}}` and are emitted as raw markup.
#[derive(Clone)]
pub struct HandlebarsRenderer {
    engine: Arc<Handlebars<'static>>,
}

impl HandlebarsRenderer {
    pub fn new() -> crate::core::Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars
            .register_template_string("page", PAGE_TEMPLATE)
            .map_err(|e| CoreError::TemplateRendering(e.to_string()))?;
        handlebars
            .register_template_string("failure", FAILURE_TEMPLATE)
            .map_err(|e| CoreError::TemplateRendering(e.to_string()))?;
        Ok(Self {
            engine: Arc::new(handlebars),
        })
    }
}

impl PageRenderer for HandlebarsRenderer {
    fn render(&self, view: &PageView) -> crate::core::Result<String> {
        let data = json!({
            "title": PAGE_TITLE,
            "instructions": INSTRUCTIONS,
            "input_label": INPUT_LABEL,
            "button_label": BUTTON_LABEL,
            "busy_label": BUSY_LABEL,
            "question": view.question,
            "answer": view.answer,
            "style": view.style,
        });
        self.engine
            .render("page", &data)
            .map_err(|e| CoreError::TemplateRendering(e.to_string()))
    }

    fn render_failure(&self) -> crate::core::Result<String> {
        let data = json!({ "title": PAGE_TITLE, "message": FAILURE_MESSAGE });
        self.engine
            .render("failure", &data)
            .map_err(|e| CoreError::TemplateRendering(e.to_string()))
    }
}
