//! Error types shared across the crate.
//!
//! Only language-model problems ever reach a caller. Retrieval failures are
//! consumed inside the [`Indexer`](crate::index::Indexer), unreadable files
//! turn into sentinel previews, and subprocess outcomes are plain values.

use thiserror::Error;

/// Failure raised by a language-model backend or its construction.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The configured provider identifier is not one we know how to build.
    #[error("unsupported LLM provider '{0}'")]
    UnsupportedProvider(String),

    /// The provider is known but its configuration cannot produce a client.
    #[error("incomplete provider configuration: {0}")]
    IncompleteConfig(String),

    /// A configuration value could not be parsed.
    #[error("invalid value for {name}: '{value}'")]
    InvalidSetting { name: String, value: String },

    /// Transport-level failure (connection, timeout, body read).
    #[error("provider request failed: {0}")]
    Request(String),

    /// The provider answered with an error status or error object.
    #[error("provider API error: {0}")]
    Api(String),

    /// The provider answered, but with no usable output.
    #[error("empty response from provider")]
    EmptyResponse,

    /// The provider payload did not match the expected shape.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// Configuration problems are fatal and surface at model construction.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LlmError::UnsupportedProvider(_)
                | LlmError::IncompleteConfig(_)
                | LlmError::InvalidSetting { .. }
        )
    }

    /// Failures of a single completion call.
    pub fn is_provider_call(&self) -> bool {
        !self.is_configuration()
    }
}

/// Failure of the optional semantic retrieval path.
///
/// Never crosses the indexer boundary: every variant degrades to lexical
/// search.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("nothing to embed")]
    EmptyInput,

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("embedding dimensions differ: index has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn unsupported_provider_display() {
        let e = LlmError::UnsupportedProvider("acme".into());
        assert!(e.to_string().contains("acme"));
        assert!(e.is_configuration());
        assert!(!e.is_provider_call());
    }

    #[test]
    fn empty_response_is_provider_call() {
        let e = LlmError::EmptyResponse;
        assert!(e.is_provider_call());
        assert!(!e.to_string().is_empty());
        let _: &dyn Error = &e;
    }

    #[test]
    fn invalid_setting_names_the_variable() {
        let e = LlmError::InvalidSetting {
            name: "LLM_MAX_TOKENS".into(),
            value: "lots".into(),
        };
        assert!(e.is_configuration());
        assert!(e.to_string().contains("LLM_MAX_TOKENS"));
        assert!(e.to_string().contains("lots"));
    }

    #[test]
    fn retrieval_error_display() {
        let e = RetrievalError::DimensionMismatch {
            expected: 64,
            actual: 32,
        };
        assert!(e.to_string().contains("64"));
    }
}
