use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result, anyhow, ensure};
use serde::Deserialize;

use crate::{
    cli::{CompletionArgs, LlmProvider},
    core::config::CompletionSettings,
    style::LLM_RESPONSE_STYLE,
};

pub const DEFAULT_MODEL: &str = "bedrock/us.amazon.nova-pro-v1:0";
/// Application inference profile used to attribute Bedrock costs.
pub const DEFAULT_ROUTING_ID: &str =
    "arn:aws:bedrock:us-west-2:841162690310:application-inference-profile/4i83xkynoouo";
pub const DEFAULT_API_BASE: &str = "http://localhost:4000";

/// On-disk configuration. Every key is optional.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct QaConfig {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Empty string disables forwarding.
    #[serde(default)]
    pub routing_id: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub max_concurrent: Option<usize>,
    #[serde(default)]
    pub response_style_path: Option<PathBuf>,
}

impl QaConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let raw = fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read config file at {}", path_ref.display()))?;
        let mut config = Self::from_yaml_str(&raw)
            .with_context(|| format!("Invalid configuration in {}", path_ref.display()))?;
        let base_dir = path_ref.parent().unwrap_or_else(|| Path::new("."));
        config.response_style_path = config.response_style_path.take().map(|style_path| {
            if style_path.is_relative() {
                base_dir.join(style_path)
            } else {
                style_path
            }
        });
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // An empty document deserialises to unit, not to a map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml).context("Unable to parse config YAML")?;
        Ok(config)
    }

    /// Layer CLI overrides over this file and fill in defaults.
    pub fn resolve(&self, args: &CompletionArgs) -> Result<ResolvedConfig> {
        let provider = match (args.provider, self.provider.as_deref()) {
            (Some(provider), _) => provider,
            (None, Some(name)) => LlmProvider::from_name(name.trim())
                .ok_or_else(|| anyhow!("Unsupported provider '{name}' in configuration"))?,
            (None, None) => LlmProvider::default(),
        };

        let model = args
            .model
            .clone()
            .or_else(|| self.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let routing_id = args
            .routing_id
            .clone()
            .or_else(|| self.routing_id.clone())
            .or_else(|| Some(DEFAULT_ROUTING_ID.to_string()));
        let api_base = args
            .api_base
            .clone()
            .or_else(|| self.api_base.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let max_concurrent = args
            .max_concurrent
            .or(self.max_concurrent)
            .unwrap_or(1)
            .max(1);

        let response_style = match &self.response_style_path {
            Some(path) => fs::read_to_string(path).with_context(|| {
                format!("Failed to read response style at {}", path.display())
            })?,
            None => LLM_RESPONSE_STYLE.to_string(),
        };

        let resolved = ResolvedConfig {
            provider,
            settings: CompletionSettings::new(model.trim(), routing_id),
            api_base: api_base.trim().to_string(),
            max_concurrent,
            response_style,
        };
        resolved.validate()?;
        Ok(resolved)
    }
}

impl FromStr for QaConfig {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_yaml_str(s)
    }
}

/// Fully merged settings used to build the gateway and the page.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub provider: LlmProvider,
    pub settings: CompletionSettings,
    pub api_base: String,
    pub max_concurrent: usize,
    pub response_style: String,
}

impl ResolvedConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.settings.model.is_empty(),
            "Model identifier may not be empty"
        );
        if self.provider == LlmProvider::Litellm {
            ensure!(
                self.api_base.starts_with("http://") || self.api_base.starts_with("https://"),
                "api_base must be an http(s) URL, got '{}'",
                self.api_base
            );
        }
        Ok(())
    }
}

/// Load the file named by `--config` (if any) and merge the CLI overrides.
pub fn load(args: &CompletionArgs) -> Result<ResolvedConfig> {
    let file = match &args.config {
        Some(path) => QaConfig::from_path(path)?,
        None => QaConfig::default(),
    };
    file.resolve(args)
}
