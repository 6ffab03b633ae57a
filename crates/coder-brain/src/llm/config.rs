//! Provider configuration loaded from the environment.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::LlmError;

/// Environment variable prefix read by [`LlmConfig::from_env`].
pub const DEFAULT_ENV_PREFIX: &str = "LLM_";

pub const DEFAULT_MAX_TOKENS: u32 = 1024;

pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Which provider to use and how to call it.
#[derive(Clone, PartialEq)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

// Keep secrets out of logs.
impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl LlmConfig {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            api_key: None,
            base_url: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Read `LLM_*` variables from the process environment.
    pub fn from_env() -> Result<Option<Self>, LlmError> {
        Self::from_lookup(DEFAULT_ENV_PREFIX, |key| std::env::var(key).ok())
    }

    /// Build a configuration from `<prefix>PROVIDER`, `<prefix>MODEL`,
    /// `<prefix>API_KEY`, `<prefix>BASE_URL` (or `<prefix>ENDPOINT`),
    /// `<prefix>MAX_TOKENS` and `<prefix>TEMPERATURE`.
    ///
    /// Returns `Ok(None)` unless both provider and model are set. Blank values
    /// count as unset.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Option<Self>, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{prefix}{name}")).filter(|value| !value.trim().is_empty())
        };

        let (Some(provider), Some(model)) = (get("PROVIDER"), get("MODEL")) else {
            debug!("{prefix}PROVIDER / {prefix}MODEL not both set, no LLM configuration");
            return Ok(None);
        };

        let max_tokens = parse_setting(prefix, "MAX_TOKENS", get("MAX_TOKENS"), DEFAULT_MAX_TOKENS)?;
        let temperature = parse_setting(
            prefix,
            "TEMPERATURE",
            get("TEMPERATURE"),
            DEFAULT_TEMPERATURE,
        )?;

        Ok(Some(Self {
            provider,
            model,
            api_key: get("API_KEY"),
            base_url: get("BASE_URL").or_else(|| get("ENDPOINT")),
            max_tokens,
            temperature,
        }))
    }
}

fn parse_setting<T: FromStr>(
    prefix: &str,
    name: &str,
    raw: Option<String>,
    default: T,
) -> Result<T, LlmError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| LlmError::InvalidSetting {
                name: format!("{prefix}{name}"),
                value,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_provider_or_model_is_none() {
        assert!(LlmConfig::from_lookup("LLM_", lookup(&[])).unwrap().is_none());
        assert!(
            LlmConfig::from_lookup("LLM_", lookup(&[("LLM_PROVIDER", "openai")]))
                .unwrap()
                .is_none()
        );
        assert!(
            LlmConfig::from_lookup(
                "LLM_",
                lookup(&[("LLM_PROVIDER", "openai"), ("LLM_MODEL", "  ")])
            )
            .unwrap()
            .is_none()
        );
    }

    #[test]
    fn defaults_apply() {
        let config = LlmConfig::from_lookup(
            "LLM_",
            lookup(&[("LLM_PROVIDER", "mock"), ("LLM_MODEL", "mock")]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(config, LlmConfig::new("mock", "mock"));
        assert_eq!(config.max_tokens, 1024);
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn reads_every_setting() {
        let config = LlmConfig::from_lookup(
            "LLM_",
            lookup(&[
                ("LLM_PROVIDER", "openrouter"),
                ("LLM_MODEL", "meta/llama"),
                ("LLM_API_KEY", "sk-1"),
                ("LLM_BASE_URL", "http://localhost:8080/v1"),
                ("LLM_MAX_TOKENS", "256"),
                ("LLM_TEMPERATURE", "0.7"),
            ]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(config.provider, "openrouter");
        assert_eq!(config.api_key.as_deref(), Some("sk-1"));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(config.max_tokens, 256);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn endpoint_is_base_url_fallback() {
        let config = LlmConfig::from_lookup(
            "AI_",
            lookup(&[
                ("AI_PROVIDER", "openai"),
                ("AI_MODEL", "m"),
                ("AI_ENDPOINT", "http://proxy/v1"),
            ]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://proxy/v1"));
    }

    #[test]
    fn bad_number_is_invalid_setting() {
        let err = LlmConfig::from_lookup(
            "LLM_",
            lookup(&[
                ("LLM_PROVIDER", "mock"),
                ("LLM_MODEL", "mock"),
                ("LLM_MAX_TOKENS", "lots"),
            ]),
        )
        .unwrap_err();
        assert!(
            matches!(err, LlmError::InvalidSetting { ref name, ref value } if name == "LLM_MAX_TOKENS" && value == "lots")
        );
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = LlmConfig::new("openai", "m");
        config.api_key = Some("sk-secret".into());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
