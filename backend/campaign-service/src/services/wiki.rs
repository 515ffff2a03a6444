/// Wiki content service - ingestion, embedding backfill and retrieval-only search
use crate::db::wiki_repo;
use crate::error::{AppError, Result};
use crate::metrics::EMBEDDING_TOTAL;
use crate::models::{ScoredDocument, WikiDocument};
use crate::services::chat::truncate_chars;
use crate::services::retrieval::{RetrievalMode, Retriever};
use llm_client::LlmProvider;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Characters of a page sent to the embedding model
pub const MAX_EMBEDDING_CHARS: usize = 8000;
pub const MAX_BACKFILL_BATCH: i64 = 500;
pub const MAX_SEARCH_RESULTS: i64 = 50;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IngestDocumentRequest {
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    #[validate(url)]
    pub url: String,

    #[validate(length(min = 1))]
    pub content: String,

    #[validate(length(max = 100))]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillSummary {
    pub processed: usize,
    pub embedded: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
pub struct DocumentPage {
    pub documents: Vec<WikiDocument>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub retrieval: RetrievalMode,
    pub results: Vec<ScoredDocument>,
}

pub struct WikiService {
    pool: PgPool,
    llm: Arc<dyn LlmProvider>,
    retriever: Arc<Retriever>,
}

impl WikiService {
    pub fn new(pool: PgPool, llm: Arc<dyn LlmProvider>, retriever: Arc<Retriever>) -> Self {
        Self {
            pool,
            llm,
            retriever,
        }
    }

    /// Store a page and embed it; an embedding failure leaves `embedding` NULL
    pub async fn ingest(&self, req: IngestDocumentRequest) -> Result<WikiDocument> {
        req.validate()?;

        let title = req.title.trim();
        let content = req.content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(AppError::Validation(
                "title and content must not be blank".to_string(),
            ));
        }
        let category = req
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let mut document =
            wiki_repo::upsert_document(&self.pool, title, req.url.trim(), content, category)
                .await?;

        if document.has_embedding {
            tracing::debug!(document_id = %document.id, "Content unchanged, keeping embedding");
            return Ok(document);
        }

        if self.embed_document(document.id, title, content).await {
            document.has_embedding = true;
        }

        tracing::info!(
            document_id = %document.id,
            url = %document.url,
            embedded = document.has_embedding,
            "Wiki document ingested"
        );

        Ok(document)
    }

    /// Embed up to `limit` documents that have no embedding yet
    pub async fn backfill_embeddings(&self, limit: i64) -> Result<BackfillSummary> {
        let limit = limit.clamp(1, MAX_BACKFILL_BATCH);
        let pending = wiki_repo::documents_missing_embedding(&self.pool, limit).await?;

        let mut summary = BackfillSummary::default();
        for (id, title, content) in pending {
            summary.processed += 1;
            if self.embed_document(id, &title, &content).await {
                summary.embedded += 1;
            } else {
                summary.failed += 1;
            }
        }

        tracing::info!(
            processed = summary.processed,
            embedded = summary.embedded,
            failed = summary.failed,
            "Embedding backfill finished"
        );

        Ok(summary)
    }

    pub async fn list(&self, query: Option<&str>, limit: i64, offset: i64) -> Result<DocumentPage> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let limit = limit.clamp(1, 100);
        let offset = offset.max(0);

        let documents = wiki_repo::list_documents(&self.pool, query, limit, offset).await?;
        let total = wiki_repo::count_documents(&self.pool, query).await?;

        Ok(DocumentPage {
            documents,
            total,
            limit,
            offset,
        })
    }

    pub async fn get(&self, document_id: Uuid) -> Result<WikiDocument> {
        wiki_repo::find_document_by_id(&self.pool, document_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("wiki document {}", document_id)))
    }

    pub async fn delete(&self, document_id: Uuid) -> Result<()> {
        if !wiki_repo::delete_document(&self.pool, document_id).await? {
            return Err(AppError::NotFound(format!("wiki document {}", document_id)));
        }
        tracing::info!(%document_id, "Wiki document deleted");
        Ok(())
    }

    /// Retrieval without the completion step
    pub async fn search(&self, query: &str, limit: Option<i64>) -> Result<SearchResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Validation("q must not be blank".to_string()));
        }
        let limit = limit
            .unwrap_or_else(|| self.retriever.match_count())
            .clamp(1, MAX_SEARCH_RESULTS);

        let retrieval = self.retriever.retrieve_with_limit(query, limit).await?;

        Ok(SearchResponse {
            query: query.to_string(),
            retrieval: retrieval.mode,
            results: retrieval.documents,
        })
    }

    async fn embed_document(&self, document_id: Uuid, title: &str, content: &str) -> bool {
        let input = embedding_input(title, content);

        let result = match self.llm.embed(&input).await {
            Ok(embedding) => wiki_repo::set_embedding(&self.pool, document_id, &embedding)
                .await
                .map_err(AppError::from),
            Err(err) => Err(AppError::from(err)),
        };

        match result {
            Ok(()) => {
                EMBEDDING_TOTAL.with_label_values(&["success"]).inc();
                true
            }
            Err(err) => {
                EMBEDDING_TOTAL.with_label_values(&["error"]).inc();
                tracing::warn!(%document_id, error = %err, "Failed to embed wiki document");
                false
            }
        }
    }
}

/// Text sent to the embedding model for a page
pub fn embedding_input(title: &str, content: &str) -> String {
    let text = format!("{}\n\n{}", title.trim(), content.trim());
    truncate_chars(&text, MAX_EMBEDDING_CHARS).to_string()
}
