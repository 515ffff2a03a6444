/// Icon catalogue handlers
use crate::db::icon_repo;
use crate::error::{AppError, Result};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateIconRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(url)]
    pub url: String,

    #[serde(default = "default_category")]
    #[validate(length(min = 1, max = 50))]
    pub category: String,
}

fn default_category() -> String {
    "general".to_string()
}

#[derive(Debug, Deserialize)]
pub struct IconQuery {
    pub category: Option<String>,
}

pub async fn list_icons(
    pool: web::Data<PgPool>,
    query: web::Query<IconQuery>,
) -> Result<HttpResponse> {
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let icons = icon_repo::list_icons(pool.get_ref(), category).await?;
    Ok(HttpResponse::Ok().json(icons))
}

/// Register an icon; names are unique (409 on duplicates)
pub async fn create_icon(
    pool: web::Data<PgPool>,
    req: web::Json<CreateIconRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be blank".to_string()));
    }

    let icon = icon_repo::create_icon(pool.get_ref(), name, req.url.trim(), req.category.trim())
        .await
        .map_err(|err| match AppError::from(err) {
            AppError::Conflict(_) => AppError::Conflict(format!("icon '{}' already exists", name)),
            other => other,
        })?;

    tracing::info!(icon_id = %icon.id, name = %icon.name, "Icon created");

    Ok(HttpResponse::Created().json(icon))
}

pub async fn delete_icon(
    pool: web::Data<PgPool>,
    icon_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let icon_id = icon_id.into_inner();
    if !icon_repo::delete_icon(pool.get_ref(), icon_id).await? {
        return Err(AppError::NotFound(format!("icon {}", icon_id)));
    }
    Ok(HttpResponse::NoContent().finish())
}
