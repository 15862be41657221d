use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::Provider;
use crate::config::RuntimeConfig;
use crate::llm::Llm;
use crate::llm::gemini::GeminiModel;
use crate::llm::mock::MockLlm;

pub const GEMINI_FAST_MODEL: &str = "gemini-1.5-flash";
pub const GEMINI_REASONING_MODEL: &str = "gemini-1.5-pro";
pub const MOCK_MODEL: &str = "mock";

pub fn validate_model_for_provider(provider: Provider, model_name: &str) -> Result<()> {
    let is_valid = match provider {
        Provider::Gemini => model_name.starts_with("gemini"),
        Provider::Mock => !model_name.trim().is_empty(),
        Provider::Auto => true,
    };

    if is_valid {
        return Ok(());
    }

    Err(anyhow::anyhow!(
        "model '{}' is not compatible with provider '{:?}'",
        model_name,
        provider
    ))
}

/// Resolved provider credentials plus the CLI-level model override. Builds
/// one model handle per agent so each agent can run a different model id.
#[derive(Clone)]
pub struct ModelFactory {
    provider: Provider,
    api_key: Option<String>,
    model_override: Option<String>,
}

impl ModelFactory {
    pub fn resolve(cfg: &RuntimeConfig) -> Result<Self> {
        let provider = match cfg.provider {
            Provider::Auto => detect_provider().context(
                "no provider could be auto-detected. Set GOOGLE_API_KEY or use --provider mock",
            )?,
            p => p,
        };

        let api_key = match provider {
            Provider::Gemini => Some(
                std::env::var("GOOGLE_API_KEY")
                    .context("GOOGLE_API_KEY is required for the Gemini provider")?,
            ),
            Provider::Mock => None,
            Provider::Auto => unreachable!("auto provider must be resolved before key lookup"),
        };

        Ok(Self {
            provider,
            api_key,
            model_override: cfg.model.clone(),
        })
    }

    /// Factory without environment lookups, for tests and offline runs.
    pub fn mock() -> Self {
        Self {
            provider: Provider::Mock,
            api_key: None,
            model_override: None,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn default_fast_model(&self) -> &'static str {
        match self.provider {
            Provider::Gemini => GEMINI_FAST_MODEL,
            _ => MOCK_MODEL,
        }
    }

    pub fn default_reasoning_model(&self) -> &'static str {
        match self.provider {
            Provider::Gemini => GEMINI_REASONING_MODEL,
            _ => MOCK_MODEL,
        }
    }

    /// Model id resolution order: per-agent env override, then the default
    /// for this provider.
    pub fn model_from_env(&self, env_key: &str, default: &str) -> Result<Arc<dyn Llm>> {
        let model_name = std::env::var(env_key)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| default.to_string());
        self.build(model_name)
    }

    /// Like [`model_from_env`], but the CLI `--model` override wins over the
    /// env var. Used for the root agent only.
    pub fn model_with_override(&self, env_key: &str, default: &str) -> Result<Arc<dyn Llm>> {
        if let Some(model_name) = self
            .model_override
            .clone()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
        {
            return self.build(model_name);
        }
        self.model_from_env(env_key, default)
    }

    fn build(&self, model_name: String) -> Result<Arc<dyn Llm>> {
        validate_model_for_provider(self.provider, &model_name)?;

        match self.provider {
            Provider::Gemini => {
                let api_key = self
                    .api_key
                    .clone()
                    .context("GOOGLE_API_KEY is required for the Gemini provider")?;
                Ok(Arc::new(GeminiModel::new(api_key, model_name)?))
            }
            Provider::Mock => Ok(Arc::new(MockLlm::new(model_name))),
            Provider::Auto => unreachable!("auto provider must be resolved before model construction"),
        }
    }
}

pub fn detect_provider() -> Option<Provider> {
    if env_present("GOOGLE_API_KEY") {
        return Some(Provider::Gemini);
    }
    None
}

pub fn env_present(key: &str) -> bool {
    std::env::var(key)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
}
