use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// vanilla-qa CLI definition.
#[derive(Debug, Parser)]
#[command(name = "vanilla-qa")]
#[command(about = "Single-question LLM Q&A demo", version)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Verbose logging with timestamps")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[arg(
        long,
        global = true,
        requires = "log_json",
        help = "Pretty-print JSON logs"
    )]
    pub pretty: bool,

    #[arg(long, global = true, help = "Also write JSON debug logs into this directory")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the Q&A page over HTTP.
    Serve(ServeArgs),
    /// Answer one question from the command line.
    Ask(AskArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1", help = "Address to bind")]
    pub bind: String,

    #[arg(long, default_value_t = 8501, help = "Port to listen on")]
    pub port: u16,

    #[command(flatten)]
    pub completion: CompletionArgs,
}

#[derive(Debug, Args, Clone)]
pub struct AskArgs {
    #[arg(long, help = "Question to answer; blank input is ignored")]
    pub question: String,

    #[command(flatten)]
    pub completion: CompletionArgs,
}

/// Completion settings shared by every command. Flags override the config file.
#[derive(Debug, Args, Clone, Default)]
pub struct CompletionArgs {
    #[arg(long, help = "Path to a YAML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        value_enum,
        help = "Completion backend (litellm, openai, anthropic, gemini, grok)"
    )]
    pub provider: Option<LlmProvider>,

    #[arg(long, help = "Model identifier")]
    pub model: Option<String>,

    #[arg(long, help = "Base URL of the LiteLLM proxy")]
    pub api_base: Option<String>,

    #[arg(long, help = "Cost-attribution identifier attached to each call")]
    pub routing_id: Option<String>,

    #[arg(long, help = "Provider API key (can also come from env vars)")]
    pub api_key: Option<String>,

    #[arg(long, help = "Maximum outstanding completion calls")]
    pub max_concurrent: Option<usize>,
}

/// Supported completion backends surfaced via the CLI.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[clap(rename_all = "lower")]
pub enum LlmProvider {
    #[default]
    Litellm,
    Openai,
    Anthropic,
    Gemini,
    Grok,
}

impl LlmProvider {
    pub fn env_var(self) -> &'static str {
        match self {
            LlmProvider::Litellm => "LITELLM_API_KEY",
            LlmProvider::Openai => "OPENAI_API_KEY",
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
            LlmProvider::Gemini => "GEMINI_API_KEY",
            LlmProvider::Grok => "XAI_API_KEY",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LlmProvider::Litellm => "litellm",
            LlmProvider::Openai => "openai",
            LlmProvider::Anthropic => "anthropic",
            LlmProvider::Gemini => "gemini",
            LlmProvider::Grok => "grok",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        match value {
            "litellm" => Some(LlmProvider::Litellm),
            "openai" => Some(LlmProvider::Openai),
            "anthropic" => Some(LlmProvider::Anthropic),
            "gemini" => Some(LlmProvider::Gemini),
            "grok" => Some(LlmProvider::Grok),
            _ => None,
        }
    }

    /// Whether calls fail without an API key.
    pub fn requires_api_key(self) -> bool {
        !matches!(self, LlmProvider::Litellm)
    }
}
