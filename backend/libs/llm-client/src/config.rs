//! Provider configuration
use std::fmt;

/// Settings for an OpenAI-compatible provider
#[derive(Clone)]
pub struct LlmConfig {
    /// Bearer token sent with every request
    pub api_key: String,
    /// API root, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// Model used for chat completion
    pub chat_model: String,
    /// Model used for image understanding
    pub vision_model: String,
    /// Model used for embeddings
    pub embedding_model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Sampling temperature for chat completion
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("vision_model", &self.vision_model)
            .field("embedding_model", &self.embedding_model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            vision_model: "gpt-4o".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            timeout_secs: 60,
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.base_url.trim().is_empty()
    }

    /// Join the base URL and an endpoint path without doubling slashes
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
