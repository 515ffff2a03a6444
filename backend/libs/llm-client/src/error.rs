use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors returned by LLM providers
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Provider API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Provider answered successfully but without usable content
    #[error("Provider returned an empty {0}")]
    EmptyResponse(&'static str),

    /// Response body did not match the expected shape
    #[error("Failed to parse provider response: {0}")]
    Parse(String),

    /// No API key or endpoint configured
    #[error("LLM provider not configured: {0}")]
    NotConfigured(String),
}

impl LlmError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Http(e) if e.is_timeout() => "timeout",
            LlmError::Http(_) => "http",
            LlmError::Api { .. } => "api",
            LlmError::EmptyResponse(_) => "empty",
            LlmError::Parse(_) => "parse",
            LlmError::NotConfigured(_) => "not_configured",
        }
    }
}
