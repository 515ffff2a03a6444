/// Map settings handlers
use crate::error::Result;
use crate::services::maps::{ConvertRequest, CreateMapRequest, UpdateMapRequest};
use crate::services::MapService;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn list_maps(pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let maps = MapService::new((**pool).clone()).list().await?;
    Ok(HttpResponse::Ok().json(maps))
}

pub async fn create_map(
    pool: web::Data<PgPool>,
    req: web::Json<CreateMapRequest>,
) -> Result<HttpResponse> {
    let map = MapService::new((**pool).clone())
        .create(req.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(map))
}

pub async fn get_map(pool: web::Data<PgPool>, map_id: web::Path<Uuid>) -> Result<HttpResponse> {
    let map = MapService::new((**pool).clone()).get(*map_id).await?;
    Ok(HttpResponse::Ok().json(map))
}

pub async fn update_map(
    pool: web::Data<PgPool>,
    map_id: web::Path<Uuid>,
    req: web::Json<UpdateMapRequest>,
) -> Result<HttpResponse> {
    let map = MapService::new((**pool).clone())
        .update(*map_id, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(map))
}

pub async fn delete_map(pool: web::Data<PgPool>, map_id: web::Path<Uuid>) -> Result<HttpResponse> {
    MapService::new((**pool).clone()).delete(*map_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Convert a point between percent and geographic form for a map
pub async fn convert_coordinates(
    pool: web::Data<PgPool>,
    req: web::Json<ConvertRequest>,
) -> Result<HttpResponse> {
    let converted = MapService::new((**pool).clone())
        .convert(req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(converted))
}
