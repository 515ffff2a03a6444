use crate::error::Result;
use crate::services::MapAnalysisService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AnalyzeMapRequest {
    #[serde(alias = "mapId")]
    pub map_id: Uuid,
}

/// Run image analysis for a map and replace its stored areas
pub async fn analyze_map(
    service: web::Data<MapAnalysisService>,
    map_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let result = service.analyze(*map_id).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Same as [`analyze_map`], with the map id in the body (`{ "mapId": ... }`)
pub async fn analyze_map_by_body(
    service: web::Data<MapAnalysisService>,
    req: web::Json<AnalyzeMapRequest>,
) -> Result<HttpResponse> {
    let result = service.analyze(req.map_id).await?;
    Ok(HttpResponse::Ok().json(result))
}

pub async fn list_map_areas(
    service: web::Data<MapAnalysisService>,
    map_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let areas = service.list_areas(*map_id).await?;
    Ok(HttpResponse::Ok().json(areas))
}
