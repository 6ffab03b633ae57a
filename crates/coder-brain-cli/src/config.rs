//! Provider configuration for a CLI run.
//!
//! Layers, lowest to highest precedence: `.env` (loaded into the process
//! environment by `main`), `LLM_*` variables, then command-line overrides.
//! When no layer names a provider the offline model is used.

use clap::Args;
use coder_brain::LlmError;
use coder_brain::llm::{DEFAULT_ENV_PREFIX, LlmConfig};
use tracing::debug;

/// Command-line overrides for the language-model provider.
#[derive(Debug, Clone, Default, Args)]
pub struct ProviderArgs {
    /// Provider id: offline, mock, openai, openrouter.
    #[arg(long)]
    pub provider: Option<String>,

    /// Model name passed to the provider.
    #[arg(long)]
    pub model: Option<String>,

    /// API key (prefer LLM_API_KEY in the environment).
    #[arg(long)]
    pub api_key: Option<String>,

    /// Endpoint root for an OpenAI-compatible server.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Maximum tokens per completion.
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    #[arg(long)]
    pub temperature: Option<f32>,
}

/// Merge environment configuration with command-line overrides.
///
/// `Ok(None)` selects the offline model. Unparseable environment values
/// are a configuration error.
pub fn resolve_llm_config<F>(
    overrides: &ProviderArgs,
    lookup: F,
) -> Result<Option<LlmConfig>, LlmError>
where
    F: Fn(&str) -> Option<String>,
{
    let from_env = LlmConfig::from_lookup(DEFAULT_ENV_PREFIX, lookup)?;

    let mut config = match (from_env, &overrides.provider) {
        (Some(mut config), Some(provider)) => {
            config.provider = provider.clone();
            config
        }
        (Some(config), None) => config,
        (None, Some(provider)) => LlmConfig::new(provider.clone(), String::new()),
        (None, None) => {
            debug!("no provider configured, running offline");
            return Ok(None);
        }
    };

    if let Some(model) = &overrides.model {
        config.model = model.clone();
    }
    if let Some(key) = &overrides.api_key {
        config.api_key = Some(key.clone());
    }
    if let Some(url) = &overrides.base_url {
        config.base_url = Some(url.clone());
    }
    if let Some(max_tokens) = overrides.max_tokens {
        config.max_tokens = max_tokens;
    }
    if let Some(temperature) = overrides.temperature {
        config.temperature = temperature;
    }

    debug!("LLM config: {config:?}");
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env(key: &str) -> Option<String> {
        match key {
            "LLM_PROVIDER" => Some("openai".into()),
            "LLM_MODEL" => Some("gpt-4o-mini".into()),
            "LLM_API_KEY" => Some("sk-env".into()),
            _ => None,
        }
    }

    #[test]
    fn nothing_configured_is_offline() {
        assert!(resolve_llm_config(&ProviderArgs::default(), no_env).unwrap().is_none());
    }

    #[test]
    fn overrides_without_provider_stay_offline() {
        let args = ProviderArgs {
            model: Some("m".into()),
            temperature: Some(0.9),
            ..Default::default()
        };
        assert!(resolve_llm_config(&args, no_env).unwrap().is_none());
    }

    #[test]
    fn environment_alone() {
        let config = resolve_llm_config(&ProviderArgs::default(), env)
            .unwrap()
            .unwrap();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.api_key.as_deref(), Some("sk-env"));
    }

    #[test]
    fn cli_overrides_environment() {
        let args = ProviderArgs {
            provider: Some("openrouter".into()),
            model: Some("meta/llama".into()),
            max_tokens: Some(64),
            ..Default::default()
        };
        let config = resolve_llm_config(&args, env).unwrap().unwrap();
        assert_eq!(config.provider, "openrouter");
        assert_eq!(config.model, "meta/llama");
        assert_eq!(config.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.max_tokens, 64);
    }

    #[test]
    fn cli_provider_without_environment() {
        let args = ProviderArgs {
            provider: Some("mock".into()),
            ..Default::default()
        };
        let config = resolve_llm_config(&args, no_env).unwrap().unwrap();
        assert_eq!(config.provider, "mock");
        assert_eq!(config.max_tokens, coder_brain::llm::DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn bad_environment_value_is_an_error() {
        let lookup = |key: &str| match key {
            "LLM_PROVIDER" => Some("mock".to_string()),
            "LLM_MODEL" => Some("mock".to_string()),
            "LLM_TEMPERATURE" => Some("warm".to_string()),
            _ => None,
        };
        let err = resolve_llm_config(&ProviderArgs::default(), lookup).unwrap_err();
        assert!(err.is_configuration());
    }
}
