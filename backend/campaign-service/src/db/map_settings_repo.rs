use crate::models::MapSettings;
use sqlx::PgPool;
use uuid::Uuid;

const MAP_COLUMNS: &str = "id, name, image_url, bounds_north, bounds_south, bounds_east, \
     bounds_west, default_zoom, min_zoom, max_zoom, created_at, updated_at";

/// Column values for an insert or a full update
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettingsValues {
    pub name: String,
    pub image_url: Option<String>,
    pub bounds_north: f64,
    pub bounds_south: f64,
    pub bounds_east: f64,
    pub bounds_west: f64,
    pub default_zoom: i32,
    pub min_zoom: i32,
    pub max_zoom: i32,
}

pub async fn create_map(pool: &PgPool, values: &MapSettingsValues) -> Result<MapSettings, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO map_settings (name, image_url, bounds_north, bounds_south, bounds_east,
                                  bounds_west, default_zoom, min_zoom, max_zoom)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {MAP_COLUMNS}
        "#
    );

    sqlx::query_as::<_, MapSettings>(&sql)
        .bind(&values.name)
        .bind(&values.image_url)
        .bind(values.bounds_north)
        .bind(values.bounds_south)
        .bind(values.bounds_east)
        .bind(values.bounds_west)
        .bind(values.default_zoom)
        .bind(values.min_zoom)
        .bind(values.max_zoom)
        .fetch_one(pool)
        .await
}

pub async fn find_map_by_id(pool: &PgPool, map_id: Uuid) -> Result<Option<MapSettings>, sqlx::Error> {
    let sql = format!("SELECT {MAP_COLUMNS} FROM map_settings WHERE id = $1");

    sqlx::query_as::<_, MapSettings>(&sql)
        .bind(map_id)
        .fetch_optional(pool)
        .await
}

/// All maps, oldest first
pub async fn list_maps(pool: &PgPool) -> Result<Vec<MapSettings>, sqlx::Error> {
    let sql = format!("SELECT {MAP_COLUMNS} FROM map_settings ORDER BY created_at ASC");

    sqlx::query_as::<_, MapSettings>(&sql).fetch_all(pool).await
}

/// Overwrite every editable column; returns `None` when the map does not exist
pub async fn update_map(
    pool: &PgPool,
    map_id: Uuid,
    values: &MapSettingsValues,
) -> Result<Option<MapSettings>, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE map_settings
        SET name = $2, image_url = $3, bounds_north = $4, bounds_south = $5,
            bounds_east = $6, bounds_west = $7, default_zoom = $8, min_zoom = $9,
            max_zoom = $10, updated_at = NOW()
        WHERE id = $1
        RETURNING {MAP_COLUMNS}
        "#
    );

    sqlx::query_as::<_, MapSettings>(&sql)
        .bind(map_id)
        .bind(&values.name)
        .bind(&values.image_url)
        .bind(values.bounds_north)
        .bind(values.bounds_south)
        .bind(values.bounds_east)
        .bind(values.bounds_west)
        .bind(values.default_zoom)
        .bind(values.min_zoom)
        .bind(values.max_zoom)
        .fetch_optional(pool)
        .await
}

/// Delete a map (pins and areas cascade)
pub async fn delete_map(pool: &PgPool, map_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM map_settings WHERE id = $1")
        .bind(map_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
