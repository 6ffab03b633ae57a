//! Developer-assistant agent core: project index, two-tier memory, and plan
//! synthesis on top of a pluggable text-completion backend.
//!
//! The central type is the [`Agent`](agent::Agent). It scans a source tree
//! with the [`Indexer`](index::Indexer), asks a
//! [`LanguageModel`](llm::LanguageModel) for a one-sentence summary of every
//! file and module, keeps those summaries in
//! [`LongTermMemory`](memory::LongTermMemory), and for each task pulls the
//! best-matching files into a bounded
//! [`WorkingMemory`](memory::WorkingMemory) before requesting a plan.
//!
//! # Getting started
//!
//! ```no_run
//! use coder_brain::agent::{Agent, Task};
//!
//! # fn main() -> Result<(), coder_brain::LlmError> {
//! // No configuration: the deterministic offline model is used.
//! let mut agent = Agent::from_config("/path/to/project", None)?;
//!
//! let task = Task::new("Fix app handle response bug").with_keywords(["handle", "app"]);
//! let report = agent.perform_task(&task, Some("handle"), true)?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`agent`] | [`Agent`](agent::Agent) orchestrator, [`Task`](agent::Task), transcript |
//! | [`index`] | [`Indexer`](index::Indexer), lexical and semantic retrieval strategies |
//! | [`memory`] | [`WorkingMemory`](memory::WorkingMemory) window and [`LongTermMemory`](memory::LongTermMemory) store |
//! | [`llm`] | [`LanguageModel`](llm::LanguageModel) trait, offline and remote variants, provider factory |
//! | [`tools`] | Line search, test runner, snippet executor |
//!
//! Everything is synchronous. Remote completions block the calling thread.

pub mod agent;
pub mod error;
pub mod index;
pub mod llm;
pub mod memory;
pub mod tools;

pub use error::{LlmError, RetrievalError};

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

// ── Constants ──────────────────────────────────────────────────────

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Per-request HTTP timeout for remote completions.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ── Request types ──────────────────────────────────────────────────

/// Chat completion request body (OpenAI-compatible).
#[derive(Serialize, Debug, Default)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub max_tokens: u32,
    pub temperature: f32,
}

fn is_zero_u32(v: &u32) -> bool {
    *v == 0
}

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

/// Raw API response (internal deserialization target).
#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Clean return type from [`ChatClient::chat`].
#[derive(Debug)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

/// Parse a chat-completions response body.
///
/// An absent or empty `choices` collection is [`LlmError::EmptyResponse`];
/// a body that isn't the expected JSON shape is
/// [`LlmError::MalformedResponse`].
pub fn parse_chat_response(text: &str) -> Result<ChatCompletion, LlmError> {
    let parsed: RawChatResponse =
        serde_json::from_str(text).map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

    if let Some(err) = parsed.error {
        return Err(LlmError::Api(err.message));
    }

    if let Some(ref usage) = parsed.usage {
        trace!(
            "Token usage: prompt={}, completion={}, total={}",
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0),
            usage.total_tokens.unwrap_or(0),
        );
    }

    let choice = parsed
        .choices
        .and_then(|c| c.into_iter().next())
        .ok_or(LlmError::EmptyResponse)?;

    Ok(ChatCompletion {
        content: choice.message.content,
        usage: parsed.usage,
        finish_reason: choice.finish_reason,
    })
}

// ── Client ─────────────────────────────────────────────────────────

/// Blocking HTTP client for an OpenAI-compatible chat completions endpoint.
pub struct ChatClient {
    pub(crate) client: reqwest::blocking::Client,
    pub(crate) endpoint: String,
    pub(crate) api_key: Option<String>,
}

impl ChatClient {
    /// Create a client posting to `{base_url}/chat/completions`.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("coder-brain/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::IncompleteConfig(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a chat completion request. Single attempt, no retries.
    pub fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, LlmError> {
        debug!(
            "LLM request: model={}, messages={}, max_tokens={}, temp={}",
            body.model,
            body.messages.len(),
            body.max_tokens,
            body.temperature,
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let mut request = self.client.post(&self.endpoint).json(body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }
        let resp = request
            .send()
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| LlmError::Request(format!("failed to read response: {e}")))?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(LlmError::Api(format!("HTTP {status}: {text}")));
        }

        parse_chat_response(&text)
    }
}
