use crate::error::Result;
use crate::services::{ChatRequest, ChatService};
use actix_web::{web, HttpResponse};

/// Answer a question about the campaign from the wiki
pub async fn chat(
    service: web::Data<ChatService>,
    req: web::Json<ChatRequest>,
) -> Result<HttpResponse> {
    let response = service.answer(req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}
