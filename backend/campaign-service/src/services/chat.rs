/// Lore assistant: answers questions grounded in retrieved wiki content
use crate::error::{AppError, Result};
use crate::models::ScoredDocument;
use crate::services::retrieval::{RetrievalMode, Retriever};
use llm_client::{ChatMessage, LlmProvider, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub const MAX_MESSAGE_CHARS: usize = 4000;
pub const MAX_HISTORY_TURNS: usize = 20;

const SYSTEM_PROMPT: &str = "You are the lore keeper of a tabletop role-playing campaign. \
Answer the player's question using the wiki excerpts provided with it. \
Cite article titles when you rely on them. \
If the excerpts do not contain the answer, say that the campaign wiki does not cover it \
instead of inventing details.";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 4000))]
    pub message: String,

    /// Earlier turns of the conversation, oldest first
    #[serde(default)]
    #[validate(length(max = 20))]
    pub history: Vec<ChatMessage>,
}

/// Wiki page cited by an answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRef {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub similarity: f64,
}

impl From<&ScoredDocument> for SourceRef {
    fn from(doc: &ScoredDocument) -> Self {
        Self {
            id: doc.id,
            title: doc.title.clone(),
            url: doc.url.clone(),
            similarity: doc.similarity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub sources: Vec<SourceRef>,
    pub retrieval: RetrievalMode,
    pub model: String,
}

pub struct ChatService {
    retriever: Arc<Retriever>,
    llm: Arc<dyn LlmProvider>,
    max_context_chars: usize,
}

impl ChatService {
    pub fn new(retriever: Arc<Retriever>, llm: Arc<dyn LlmProvider>, max_context_chars: usize) -> Self {
        Self {
            retriever,
            llm,
            max_context_chars,
        }
    }

    pub async fn answer(&self, req: ChatRequest) -> Result<ChatResponse> {
        validate_request(&req)?;
        let question = req.message.trim();

        let retrieval = self.retriever.retrieve(question).await?;
        tracing::debug!(
            mode = retrieval.mode.as_str(),
            documents = retrieval.documents.len(),
            "Retrieved chat context"
        );

        let context = build_context(&retrieval.documents, self.max_context_chars);

        let mut messages = Vec::with_capacity(req.history.len() + 2);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        messages.extend(req.history.iter().cloned());
        messages.push(ChatMessage::user(build_user_prompt(question, &context)));

        let completion = self.llm.complete(&messages).await?;

        tracing::info!(
            provider = self.llm.name(),
            model = %completion.model,
            retrieval = retrieval.mode.as_str(),
            sources = retrieval.documents.len(),
            "Chat answer generated"
        );

        Ok(ChatResponse {
            response: completion.content,
            sources: retrieval.documents.iter().map(SourceRef::from).collect(),
            retrieval: retrieval.mode,
            model: completion.model,
        })
    }
}

fn validate_request(req: &ChatRequest) -> Result<()> {
    req.validate()?;

    if req.message.trim().is_empty() {
        return Err(AppError::Validation("message must not be blank".to_string()));
    }

    for turn in &req.history {
        if turn.role == Role::System {
            return Err(AppError::Validation(
                "history may only contain user and assistant turns".to_string(),
            ));
        }
        if turn.content.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::Validation(format!(
                "history turns are limited to {} characters",
                MAX_MESSAGE_CHARS
            )));
        }
    }

    Ok(())
}

/// First `max_chars` characters of `text`, never splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Render documents as Markdown sections for the prompt
pub fn build_context(documents: &[ScoredDocument], max_chars_per_doc: usize) -> String {
    documents
        .iter()
        .map(|doc| {
            format!(
                "### {}\nSource: {}\n{}",
                doc.title,
                doc.url,
                truncate_chars(doc.content.trim(), max_chars_per_doc)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn build_user_prompt(question: &str, context: &str) -> String {
    if context.is_empty() {
        format!(
            "No wiki articles matched this question.\n\nQuestion: {}",
            question
        )
    } else {
        format!(
            "Wiki excerpts:\n\n{}\n\nQuestion: {}",
            context, question
        )
    }
}
