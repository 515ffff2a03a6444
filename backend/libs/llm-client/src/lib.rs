//! Hosted LLM provider client
//!
//! Wraps the three calls the campaign service delegates to an external model:
//! - chat completion (grounded answers for the lore assistant)
//! - image-understanding completion (map area extraction)
//! - text embeddings (wiki document retrieval)
//!
//! The [`LlmProvider`] trait is the seam services depend on, so handlers can
//! be exercised against a mock without network access.

pub mod config;
pub mod error;
pub mod metrics;
pub mod openai;
pub mod provider;

pub use config::LlmConfig;
pub use error::{LlmError, Result};
pub use openai::OpenAiProvider;
pub use provider::{ChatMessage, Completion, LlmProvider, Role, Usage};
