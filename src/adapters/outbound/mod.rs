pub mod litellm;
pub mod llm;
pub mod templating;
