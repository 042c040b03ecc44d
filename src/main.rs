use std::{
    fs,
    net::SocketAddr,
    process::ExitCode,
    sync::{Arc, OnceLock},
};

use anyhow::{Context as AnyhowContext, Result, anyhow};
use clap::Parser;
use tracing::info;

use vanilla_qa::{
    adapters::{
        inbound::{
            cli::CliAdapter,
            server::{ServeOptions, ServerAdapter},
        },
        outbound::{litellm::LiteLlmGateway, llm::RigCompletionGateway, templating::HandlebarsRenderer},
    },
    application::AppService,
    cli::{AskArgs, Cli, Commands, LlmProvider, ServeArgs},
    config::{self, ResolvedConfig},
    core::ports::{CompletionGateway, QaService},
    paths::home_env_path,
};

mod tracing_setup;

use tracing_setup::JsonLogFormat;

static HOME_ENV_ONCE: OnceLock<()> = OnceLock::new();

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_format = if cli.pretty {
        JsonLogFormat::Pretty
    } else {
        JsonLogFormat::Compact
    };
    let _guard = tracing_setup::init(
        cli.verbose,
        cli.log_json,
        json_format,
        cli.log_dir.as_deref(),
    );

    let result = match cli.command {
        Commands::Serve(args) => serve_command(args).await,
        Commands::Ask(args) => ask_command(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Command failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn serve_command(args: ServeArgs) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", args.bind, args.port)
        .parse()
        .context("Invalid bind/port combination for serve command")?;
    let resolved = config::load(&args.completion)?;
    let service = build_service(&resolved, args.completion.api_key.clone())?;
    let renderer = Arc::new(HandlebarsRenderer::new().map_err(|e| anyhow!("{e}"))?);
    let options = ServeOptions {
        response_style: resolved.response_style.clone(),
    };

    info!(
        provider = resolved.provider.as_str(),
        model = %resolved.settings.model,
        "answering questions"
    );
    println!("Serving Q&A page on http://{addr}");
    ServerAdapter::new(service, renderer, options).run(addr).await
}

async fn ask_command(args: AskArgs) -> Result<()> {
    let resolved = config::load(&args.completion)?;
    let service = build_service(&resolved, args.completion.api_key.clone())?;
    let cli = CliAdapter::new(service);
    let mut stdout = std::io::stdout().lock();
    cli.ask(&args.question, &mut stdout).await
}

fn build_service(resolved: &ResolvedConfig, cli_key: Option<String>) -> Result<Arc<dyn QaService>> {
    let api_key = resolve_api_key(cli_key, resolved.provider)?;
    let gateway = create_gateway(resolved, api_key)?;
    Ok(Arc::new(AppService::new(gateway, resolved.settings.clone())))
}

fn create_gateway(
    resolved: &ResolvedConfig,
    api_key: Option<String>,
) -> Result<Arc<dyn CompletionGateway>> {
    match resolved.provider {
        LlmProvider::Litellm => Ok(Arc::new(LiteLlmGateway::new(
            &resolved.api_base,
            api_key,
            resolved.max_concurrent,
        )?)),
        provider => {
            let key = api_key.ok_or_else(|| {
                anyhow!(
                    "Missing API key: pass --api-key or set {}",
                    provider.env_var()
                )
            })?;
            Ok(Arc::new(RigCompletionGateway::new(
                provider,
                key,
                resolved.max_concurrent,
            )?))
        }
    }
}

/// CLI value first, then the provider's env var (after applying `~/.env`).
fn resolve_api_key(cli_value: Option<String>, provider: LlmProvider) -> Result<Option<String>> {
    ensure_home_env_loaded();
    let env_value = std::env::var(provider.env_var()).ok();
    let key = pick_api_key(cli_value, env_value);
    if key.is_none() && provider.requires_api_key() {
        return Err(anyhow!(
            "Missing API key: pass --api-key or set {}",
            provider.env_var()
        ));
    }
    Ok(key)
}

fn pick_api_key(cli_value: Option<String>, env_value: Option<String>) -> Option<String> {
    normalize_key(cli_value).or_else(|| normalize_key(env_value))
}

fn normalize_key(value: Option<String>) -> Option<String> {
    value.and_then(|candidate| {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn ensure_home_env_loaded() {
    HOME_ENV_ONCE.get_or_init(|| {
        if let Some(path) = home_env_path()
            && let Ok(contents) = fs::read_to_string(&path)
        {
            apply_env_contents(&contents);
        }
    });
}

/// Apply `KEY=value` lines without overriding variables already set.
fn apply_env_contents(contents: &str) {
    for (key, value) in contents.lines().filter_map(parse_env_assignment) {
        if std::env::var_os(&key).is_none() {
            // SAFETY: runs once, before any gateway or server task is spawned.
            unsafe {
                std::env::set_var(&key, value);
            }
        }
    }
}

fn parse_env_assignment(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed).trim();

    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    Some((key.to_string(), normalize_env_value(value.trim())))
}

fn normalize_env_value(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        return trimmed[1..trimmed.len() - 1].to_string();
    }
    trimmed.to_string()
}
