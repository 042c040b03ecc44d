use std::{cmp::max, sync::Arc};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rig::{
    client::CompletionClient,
    completion::Prompt,
    providers::{anthropic, gemini, openai, xai},
};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::cli::LlmProvider;
use crate::core::domain::CompletionRequest;
use crate::core::error::Error as CoreError;
use crate::core::ports::CompletionGateway;

/// [`CompletionGateway`] backed by `rig`'s native provider clients.
#[derive(Clone)]
pub struct RigCompletionGateway {
    inner: Arc<RigGatewayInner>,
}

struct RigGatewayInner {
    provider: LlmProvider,
    api_key: String,
    http_client: reqwest::Client,
    semaphore: Arc<Semaphore>,
}

impl RigCompletionGateway {
    pub fn new(
        provider: LlmProvider,
        api_key: impl Into<String>,
        max_concurrent: usize,
    ) -> Result<Self> {
        if provider == LlmProvider::Litellm {
            return Err(anyhow!(
                "The litellm provider is served by LiteLlmGateway, not rig"
            ));
        }

        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(anyhow!("API key may not be empty"));
        }

        let http_client = build_http_client()?;
        Ok(Self {
            inner: Arc::new(RigGatewayInner {
                provider,
                api_key,
                http_client,
                semaphore: Arc::new(Semaphore::new(max(1, max_concurrent))),
            }),
        })
    }

    async fn prompt_once(&self, model: &str, prompt: &str) -> Result<String> {
        match self.inner.provider {
            LlmProvider::Openai => {
                let client: openai::Client<reqwest::Client> =
                    openai::Client::<reqwest::Client>::builder()
                        .api_key(&self.inner.api_key)
                        .http_client(self.inner.http_client.clone())
                        .build()
                        .map_err(|err| anyhow!("Failed to create OpenAI client: {err}"))?;
                client
                    .agent(model)
                    .build()
                    .prompt(prompt)
                    .await
                    .map_err(|err| anyhow!("OpenAI prompt error: {err}"))
            }
            LlmProvider::Anthropic => {
                let client: anthropic::Client<reqwest::Client> =
                    anthropic::Client::<reqwest::Client>::builder()
                        .api_key(&self.inner.api_key)
                        .http_client(self.inner.http_client.clone())
                        .build()
                        .map_err(|err| anyhow!("Failed to create Anthropic client: {err}"))?;
                client
                    .agent(model)
                    .build()
                    .prompt(prompt)
                    .await
                    .map_err(|err| anyhow!("Anthropic prompt error: {err}"))
            }
            LlmProvider::Gemini => {
                let client: gemini::Client<reqwest::Client> =
                    gemini::Client::<reqwest::Client>::builder()
                        .api_key(&self.inner.api_key)
                        .http_client(self.inner.http_client.clone())
                        .build()
                        .map_err(|err| anyhow!("Failed to create Gemini client: {err}"))?;
                client
                    .agent(model)
                    .build()
                    .prompt(prompt)
                    .await
                    .map_err(|err| anyhow!("Gemini prompt error: {err}"))
            }
            LlmProvider::Grok => {
                let client: xai::Client<reqwest::Client> =
                    xai::Client::<reqwest::Client>::builder()
                        .api_key(&self.inner.api_key)
                        .http_client(self.inner.http_client.clone())
                        .build()
                        .map_err(|err| anyhow!("Failed to create xAI client: {err}"))?;
                client
                    .agent(model)
                    .build()
                    .prompt(prompt)
                    .await
                    .map_err(|err| anyhow!("xAI prompt error: {err}"))
            }
            LlmProvider::Litellm => Err(anyhow!("litellm is not a rig provider")),
        }
    }
}

impl std::fmt::Debug for RigCompletionGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigCompletionGateway")
            .field("provider", &self.inner.provider)
            .finish()
    }
}

#[async_trait]
impl CompletionGateway for RigCompletionGateway {
    async fn complete(&self, request: &CompletionRequest) -> crate::core::Result<String> {
        let _permit = self
            .inner
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| CoreError::System(format!("Semaphore error: {e}")))?;

        if request.routing_id.is_some() {
            debug!(
                provider = self.provider(),
                "routing id is not forwarded to native providers"
            );
        }

        self.prompt_once(&request.model, request.prompt())
            .await
            .map_err(|err| CoreError::LlmProvider {
                provider: self.provider().to_string(),
                details: err.to_string(),
            })
    }

    fn provider(&self) -> &str {
        self.inner.provider.as_str()
    }
}

pub(crate) fn build_http_client() -> Result<reqwest::Client> {
    // `reqwest::Client::default()` can consult OS-level proxy settings, which has been
    // observed to panic in sandboxed environments on macOS. Opt in with
    // `VANILLA_QA_ENABLE_SYSTEM_PROXY=1`.
    let mut builder = reqwest::Client::builder();
    if std::env::var_os("VANILLA_QA_ENABLE_SYSTEM_PROXY").is_none() {
        builder = builder.no_proxy();
    }
    builder
        .build()
        .map_err(|err| anyhow!("Failed to build HTTP client: {err}"))
}
