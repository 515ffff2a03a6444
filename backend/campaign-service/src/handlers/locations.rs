/// Location (pin) handlers
use crate::error::Result;
use crate::services::locations::{CreateLocationRequest, UpdateLocationRequest};
use crate::services::LocationService;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn list_locations(
    pool: web::Data<PgPool>,
    map_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let locations = LocationService::new((**pool).clone())
        .list_for_map(*map_id)
        .await?;
    Ok(HttpResponse::Ok().json(locations))
}

/// Place a pin by `{x, y}` percentages or `{lat, lng}`
pub async fn create_location(
    pool: web::Data<PgPool>,
    map_id: web::Path<Uuid>,
    req: web::Json<CreateLocationRequest>,
) -> Result<HttpResponse> {
    let location = LocationService::new((**pool).clone())
        .create(*map_id, req.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(location))
}

pub async fn get_location(
    pool: web::Data<PgPool>,
    location_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let location = LocationService::new((**pool).clone())
        .get(*location_id)
        .await?;
    Ok(HttpResponse::Ok().json(location))
}

pub async fn update_location(
    pool: web::Data<PgPool>,
    location_id: web::Path<Uuid>,
    req: web::Json<UpdateLocationRequest>,
) -> Result<HttpResponse> {
    let location = LocationService::new((**pool).clone())
        .update(*location_id, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(location))
}

pub async fn delete_location(
    pool: web::Data<PgPool>,
    location_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    LocationService::new((**pool).clone())
        .delete(*location_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
