//! Wiki retrieval: one vector-similarity query, keyword search as fallback
use crate::db::wiki_repo;
use crate::error::Result;
use crate::metrics::RETRIEVAL_TOTAL;
use crate::models::ScoredDocument;
use async_trait::async_trait;
use llm_client::LlmProvider;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage side of retrieval
#[async_trait]
pub trait DocumentSearch: Send + Sync {
    /// Documents whose cosine similarity to `embedding` is at least `threshold`
    async fn match_documents(
        &self,
        embedding: &[f32],
        threshold: f64,
        count: i64,
    ) -> std::result::Result<Vec<ScoredDocument>, sqlx::Error>;

    /// Text search without embeddings
    async fn keyword_search(
        &self,
        query: &str,
        count: i64,
    ) -> std::result::Result<Vec<ScoredDocument>, sqlx::Error>;
}

/// `DocumentSearch` over the `wiki_content` table
#[derive(Clone)]
pub struct PgDocumentSearch {
    pool: PgPool,
}

impl PgDocumentSearch {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentSearch for PgDocumentSearch {
    async fn match_documents(
        &self,
        embedding: &[f32],
        threshold: f64,
        count: i64,
    ) -> std::result::Result<Vec<ScoredDocument>, sqlx::Error> {
        wiki_repo::match_documents(&self.pool, embedding, threshold, count).await
    }

    async fn keyword_search(
        &self,
        query: &str,
        count: i64,
    ) -> std::result::Result<Vec<ScoredDocument>, sqlx::Error> {
        let ranked = wiki_repo::keyword_search(&self.pool, query, count).await?;
        if !ranked.is_empty() {
            return Ok(ranked);
        }
        wiki_repo::title_search(&self.pool, query, count).await
    }
}

/// Which branch produced the documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    Vector,
    Keyword,
    None,
}

impl RetrievalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalMode::Vector => "vector",
            RetrievalMode::Keyword => "keyword",
            RetrievalMode::None => "none",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Retrieval {
    pub mode: RetrievalMode,
    pub documents: Vec<ScoredDocument>,
}

pub struct Retriever {
    search: Arc<dyn DocumentSearch>,
    llm: Arc<dyn LlmProvider>,
    match_threshold: f64,
    match_count: i64,
}

impl Retriever {
    pub fn new(
        search: Arc<dyn DocumentSearch>,
        llm: Arc<dyn LlmProvider>,
        match_threshold: f64,
        match_count: i64,
    ) -> Self {
        Self {
            search,
            llm,
            match_threshold,
            match_count,
        }
    }

    pub fn match_count(&self) -> i64 {
        self.match_count
    }

    /// Vector search first; keyword search when it fails or finds nothing
    pub async fn retrieve(&self, query: &str) -> Result<Retrieval> {
        self.retrieve_with_limit(query, self.match_count).await
    }

    pub async fn retrieve_with_limit(&self, query: &str, count: i64) -> Result<Retrieval> {
        match self.vector_search(query, count).await {
            Ok(documents) if !documents.is_empty() => {
                debug!(matches = documents.len(), "Vector search matched wiki documents");
                return Ok(Self::finish(RetrievalMode::Vector, documents));
            }
            Ok(_) => {
                debug!("Vector search found no documents above threshold, using keyword search");
            }
            Err(reason) => {
                warn!(error = %reason, "Vector search failed, falling back to keyword search");
            }
        }

        let documents = self.search.keyword_search(query, count).await?;
        let mode = if documents.is_empty() {
            RetrievalMode::None
        } else {
            RetrievalMode::Keyword
        };

        Ok(Self::finish(mode, documents))
    }

    async fn vector_search(
        &self,
        query: &str,
        count: i64,
    ) -> std::result::Result<Vec<ScoredDocument>, String> {
        let embedding = self.llm.embed(query).await.map_err(|e| e.to_string())?;

        self.search
            .match_documents(&embedding, self.match_threshold, count)
            .await
            .map_err(|e| e.to_string())
    }

    fn finish(mode: RetrievalMode, documents: Vec<ScoredDocument>) -> Retrieval {
        RETRIEVAL_TOTAL.with_label_values(&[mode.as_str()]).inc();
        Retrieval { mode, documents }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use llm_client::{ChatMessage, Completion, LlmError};
    use mockall::mock;
    use uuid::Uuid;

    mock! {
        pub Search {}

        #[async_trait]
        impl DocumentSearch for Search {
            async fn match_documents(
                &self,
                embedding: &[f32],
                threshold: f64,
                count: i64,
            ) -> std::result::Result<Vec<ScoredDocument>, sqlx::Error>;

            async fn keyword_search(
                &self,
                query: &str,
                count: i64,
            ) -> std::result::Result<Vec<ScoredDocument>, sqlx::Error>;
        }
    }

    mock! {
        pub Llm {}

        #[async_trait]
        impl LlmProvider for Llm {
            async fn complete(&self, messages: &[ChatMessage]) -> llm_client::Result<Completion>;
            async fn describe_image(&self, image_url: &str, prompt: &str) -> llm_client::Result<Completion>;
            async fn embed(&self, text: &str) -> llm_client::Result<Vec<f32>>;
            fn name(&self) -> &'static str;
        }
    }

    pub(crate) fn doc(title: &str, similarity: f64) -> ScoredDocument {
        ScoredDocument {
            id: Uuid::new_v4(),
            title: title.to_string(),
            url: format!("https://wiki.example.com/{}", title.replace(' ', "_")),
            content: format!("{} lore", title),
            similarity,
        }
    }

    fn retriever(search: MockSearch, llm: MockLlm) -> Retriever {
        Retriever::new(Arc::new(search), Arc::new(llm), 0.5, 3)
    }

    #[tokio::test]
    async fn uses_vector_matches_when_available() {
        let mut llm = MockLlm::new();
        llm.expect_embed()
            .withf(|text| text == "who rules Waterdeep")
            .returning(|_| Ok(vec![0.1, 0.2]));

        let mut search = MockSearch::new();
        search
            .expect_match_documents()
            .withf(|embedding, threshold, count| {
                embedding == [0.1, 0.2] && *threshold == 0.5 && *count == 3
            })
            .returning(|_, _, _| Ok(vec![doc("Waterdeep", 0.91)]));
        search.expect_keyword_search().never();

        let retrieval = retriever(search, llm)
            .retrieve("who rules Waterdeep")
            .await
            .unwrap();

        assert_eq!(retrieval.mode, RetrievalMode::Vector);
        assert_eq!(retrieval.documents[0].title, "Waterdeep");
    }

    #[tokio::test]
    async fn falls_back_to_keyword_when_embedding_fails() {
        let mut llm = MockLlm::new();
        llm.expect_embed()
            .returning(|_| Err(LlmError::EmptyResponse("embedding")));

        let mut search = MockSearch::new();
        search.expect_match_documents().never();
        search
            .expect_keyword_search()
            .withf(|query, count| query == "Baldur's Gate" && *count == 3)
            .returning(|_, _| Ok(vec![doc("Baldur's Gate", 0.3)]));

        let retrieval = retriever(search, llm).retrieve("Baldur's Gate").await.unwrap();

        assert_eq!(retrieval.mode, RetrievalMode::Keyword);
        assert_eq!(retrieval.documents.len(), 1);
    }

    #[tokio::test]
    async fn falls_back_to_keyword_when_vector_query_fails() {
        let mut llm = MockLlm::new();
        llm.expect_embed().returning(|_| Ok(vec![0.5]));

        let mut search = MockSearch::new();
        search
            .expect_match_documents()
            .returning(|_, _, _| Err(sqlx::Error::Protocol("operator does not exist".into())));
        search
            .expect_keyword_search()
            .returning(|_, _| Ok(vec![doc("Candlekeep", 0.2)]));

        let retrieval = retriever(search, llm).retrieve("Candlekeep").await.unwrap();

        assert_eq!(retrieval.mode, RetrievalMode::Keyword);
    }

    #[tokio::test]
    async fn falls_back_when_vector_search_is_empty() {
        let mut llm = MockLlm::new();
        llm.expect_embed().returning(|_| Ok(vec![0.5]));

        let mut search = MockSearch::new();
        search.expect_match_documents().returning(|_, _, _| Ok(vec![]));
        search.expect_keyword_search().returning(|_, _| Ok(vec![]));

        let retrieval = retriever(search, llm).retrieve("unknown").await.unwrap();

        assert_eq!(retrieval.mode, RetrievalMode::None);
        assert!(retrieval.documents.is_empty());
    }

    #[tokio::test]
    async fn keyword_failure_is_an_error() {
        let mut llm = MockLlm::new();
        llm.expect_embed()
            .returning(|_| Err(LlmError::NotConfigured("no key".into())));

        let mut search = MockSearch::new();
        search
            .expect_keyword_search()
            .returning(|_, _| Err(sqlx::Error::PoolTimedOut));

        let result = retriever(search, llm).retrieve("anything").await;

        assert!(matches!(result, Err(crate::error::AppError::Database(_))));
    }
}
