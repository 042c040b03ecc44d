//! Shared style fragment for the answer container.

/// Injected verbatim ahead of `<div class="llm-response">`.
pub const LLM_RESPONSE_STYLE: &str = r#"<style>
.llm-response {
    background-color: #f0f7ff;
    border-left: 4px solid #1e88e5;
    border-radius: 6px;
    padding: 1rem 1.25rem;
    margin: 0.75rem 0 1.5rem;
    line-height: 1.6;
    white-space: pre-wrap;
}
</style>"#;
