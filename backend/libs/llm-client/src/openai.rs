//! OpenAI-compatible provider (chat completions, vision via image_url parts, embeddings)
use crate::config::LlmConfig;
use crate::error::{LlmError, Result};
use crate::metrics;
use crate::provider::{ChatMessage, Completion, LlmProvider, Usage};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error};

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";
const EMBEDDINGS_PATH: &str = "embeddings";

pub struct OpenAiProvider {
    client: Client,
    config: LlmConfig,
}

// ============================================
// Request types
// ============================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

// ============================================
// Response types
// ============================================

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    /// Build a provider; an unconfigured provider is allowed and fails per call.
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.config.is_configured() {
            Ok(())
        } else {
            Err(LlmError::NotConfigured(
                "LLM_API_KEY and LLM_BASE_URL must be set".to_string(),
            ))
        }
    }

    async fn post_json<B, R>(&self, operation: &'static str, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.ensure_configured()?;

        let start = Instant::now();
        let result = self.send(path, body).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::observe(operation, outcome, start.elapsed().as_secs_f64());
        debug!(
            operation,
            outcome,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "LLM provider call finished"
        );

        result
    }

    async fn send<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.config.endpoint(path))
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_text, path, "LLM provider request failed");
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: error_text,
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))
    }

    fn into_completion(response: CompletionResponse) -> Result<Completion> {
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse("completion"))?;

        Ok(Completion {
            content,
            model: response.model,
            usage: response.usage,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion> {
        let request = CompletionRequest {
            model: &self.config.chat_model,
            messages: messages
                .iter()
                .map(|m| RequestMessage {
                    role: m.role.as_str(),
                    content: MessageContent::Text(&m.content),
                })
                .collect(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response: CompletionResponse = self
            .post_json("chat", CHAT_COMPLETIONS_PATH, &request)
            .await?;
        Self::into_completion(response)
    }

    async fn describe_image(&self, image_url: &str, prompt: &str) -> Result<Completion> {
        let request = CompletionRequest {
            model: &self.config.vision_model,
            messages: vec![RequestMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text { text: prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: image_url },
                    },
                ]),
            }],
            // Structured extraction, keep it deterministic
            temperature: 0.0,
            max_tokens: self.config.max_tokens.max(2048),
        };

        let response: CompletionResponse = self
            .post_json("vision", CHAT_COMPLETIONS_PATH, &request)
            .await?;
        Self::into_completion(response)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: text,
        };

        let response: EmbeddingResponse = self
            .post_json("embedding", EMBEDDINGS_PATH, &request)
            .await?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|e| !e.is_empty())
            .ok_or(LlmError::EmptyResponse("embedding"))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
