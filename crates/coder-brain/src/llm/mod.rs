//! Pluggable text-completion backends.
//!
//! [`create_language_model`] is the factory, called once when an
//! [`Agent`](crate::agent::Agent) is built. The provider string is parsed
//! into a [`ProviderKind`]; adding a backend means a new module plus a new
//! match arm.

pub mod config;
pub mod offline;
pub mod remote;

pub use config::{DEFAULT_ENV_PREFIX, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, LlmConfig};
pub use offline::OfflineModel;
pub use remote::RemoteModel;

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::{LlmError, OPENAI_BASE_URL, OPENROUTER_BASE_URL};

/// A chat-completion style model: one system turn, one user turn, one reply.
pub trait LanguageModel {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;

    /// Summarize `text` under `instructions`.
    fn summarize(&self, instructions: &str, text: &str) -> Result<String, LlmError> {
        self.complete(instructions, text)
    }

    /// Produce a plan from `context` under `instructions`.
    fn plan(&self, instructions: &str, context: &str) -> Result<String, LlmError> {
        self.complete(instructions, context)
    }
}

impl<M: LanguageModel + ?Sized> LanguageModel for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        (**self).complete(system, user)
    }

    fn summarize(&self, instructions: &str, text: &str) -> Result<String, LlmError> {
        (**self).summarize(instructions, text)
    }

    fn plan(&self, instructions: &str, context: &str) -> Result<String, LlmError> {
        (**self).plan(instructions, context)
    }
}

/// Known provider identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// `mock` or `offline`: the deterministic [`OfflineModel`].
    Offline,
    OpenAi,
    OpenRouter,
}

impl ProviderKind {
    /// Endpoint root used when the configuration has no `base_url`.
    pub fn default_base_url(self) -> Option<&'static str> {
        match self {
            ProviderKind::Offline => None,
            ProviderKind::OpenAi => Some(OPENAI_BASE_URL),
            ProviderKind::OpenRouter => Some(OPENROUTER_BASE_URL),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" | "offline" => Ok(ProviderKind::Offline),
            "openai" => Ok(ProviderKind::OpenAi),
            "openrouter" => Ok(ProviderKind::OpenRouter),
            _ => Err(LlmError::UnsupportedProvider(s.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Offline => write!(f, "offline"),
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::OpenRouter => write!(f, "openrouter"),
        }
    }
}

/// Build a model from configuration. `None` selects the offline model.
///
/// Unknown providers and unusable configurations fail here, before any
/// completion is attempted.
pub fn create_language_model(
    config: Option<LlmConfig>,
) -> Result<Box<dyn LanguageModel>, LlmError> {
    let Some(config) = config else {
        info!("No LLM configuration, using offline model");
        return Ok(Box::new(OfflineModel::new()));
    };

    let kind: ProviderKind = config.provider.parse()?;
    info!("LLM provider: {kind} (model {})", config.model);
    match kind {
        ProviderKind::Offline => Ok(Box::new(OfflineModel::new())),
        ProviderKind::OpenAi | ProviderKind::OpenRouter => {
            Ok(Box::new(RemoteModel::new(kind, &config)?))
        }
    }
}
