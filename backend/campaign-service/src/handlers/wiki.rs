/// Wiki content handlers
use crate::error::Result;
use crate::services::wiki::IngestDocumentRequest;
use crate::services::WikiService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    pub q: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BackfillQuery {
    #[serde(default = "default_backfill_limit")]
    pub limit: i64,
}

fn default_backfill_limit() -> i64 {
    50
}

pub async fn list_documents(
    service: web::Data<WikiService>,
    query: web::Query<ListDocumentsQuery>,
) -> Result<HttpResponse> {
    let page = service
        .list(query.q.as_deref(), query.limit, query.offset)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Insert or refresh a page (keyed by URL) and embed it
pub async fn ingest_document(
    service: web::Data<WikiService>,
    req: web::Json<IngestDocumentRequest>,
) -> Result<HttpResponse> {
    let document = service.ingest(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(document))
}

pub async fn get_document(
    service: web::Data<WikiService>,
    document_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let document = service.get(*document_id).await?;
    Ok(HttpResponse::Ok().json(document))
}

pub async fn delete_document(
    service: web::Data<WikiService>,
    document_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    service.delete(*document_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn search_documents(
    service: web::Data<WikiService>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    let results = service.search(&query.q, query.limit).await?;
    Ok(HttpResponse::Ok().json(results))
}

pub async fn backfill_embeddings(
    service: web::Data<WikiService>,
    query: web::Query<BackfillQuery>,
) -> Result<HttpResponse> {
    let summary = service.backfill_embeddings(query.limit).await?;
    Ok(HttpResponse::Ok().json(summary))
}
