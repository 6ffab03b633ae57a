//! OpenAI-compatible chat-completions backend (OpenAI, OpenRouter, or any
//! endpoint reached through `base_url`).

use std::time::Instant;

use tracing::{debug, warn};

use super::{LanguageModel, LlmConfig, ProviderKind};
use crate::{ChatClient, ChatCompletion, ChatRequest, LlmError, Message};

pub struct RemoteModel {
    kind: ProviderKind,
    client: ChatClient,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl RemoteModel {
    /// Validate `config` and build the HTTP client.
    ///
    /// A custom `base_url` may be keyless (local servers); the hosted
    /// defaults require an API key.
    pub fn new(kind: ProviderKind, config: &LlmConfig) -> Result<Self, LlmError> {
        if config.model.trim().is_empty() {
            return Err(LlmError::IncompleteConfig(format!(
                "provider '{kind}' needs a model name"
            )));
        }

        let custom_base = config
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty());
        let api_key = config.api_key.clone().filter(|key| !key.trim().is_empty());

        let base_url = match (custom_base, kind.default_base_url()) {
            (Some(url), _) => url,
            (None, Some(default)) => {
                if api_key.is_none() {
                    return Err(LlmError::IncompleteConfig(format!(
                        "provider '{kind}' needs an API key (LLM_API_KEY) or a custom base URL"
                    )));
                }
                default
            }
            (None, None) => {
                return Err(LlmError::IncompleteConfig(format!(
                    "provider '{kind}' has no endpoint"
                )));
            }
        };

        let client = ChatClient::new(base_url, api_key)?;
        debug!("remote model {} via {}", config.model, client.endpoint());
        Ok(Self {
            kind,
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        self.client.endpoint()
    }
}

/// Text of a completion, or [`LlmError::EmptyResponse`] when there is none.
pub fn completion_text(completion: ChatCompletion) -> Result<String, LlmError> {
    match completion.content {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => {
            if let Some(reason) = &completion.finish_reason {
                warn!("provider returned no content (finish_reason={reason})");
            }
            Err(LlmError::EmptyResponse)
        }
    }
}

impl LanguageModel for RemoteModel {
    fn name(&self) -> &str {
        match self.kind {
            ProviderKind::OpenRouter => "openrouter",
            _ => "openai",
        }
    }

    fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::system(system), Message::user(user)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let start = Instant::now();
        let completion = self.client.chat(&request)?;
        let total_tokens = completion
            .usage
            .as_ref()
            .and_then(|usage| usage.total_tokens)
            .unwrap_or(0);
        let text = completion_text(completion)?;
        debug!(
            "{} completion: {} chars, {total_tokens} tokens in {:.1}s",
            self.name(),
            text.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(text)
    }
}
