use crate::models::Location;
use sqlx::PgPool;
use uuid::Uuid;

const LOCATION_COLUMNS: &str = "id, map_id, title, description, x_percent, y_percent, icon_id, \
     created_by, created_at, updated_at";

/// Column values shared by insert and update
#[derive(Debug, Clone, PartialEq)]
pub struct LocationValues {
    pub title: String,
    pub description: Option<String>,
    pub x_percent: f64,
    pub y_percent: f64,
    pub icon_id: Option<Uuid>,
}

pub async fn create_location(
    pool: &PgPool,
    map_id: Uuid,
    values: &LocationValues,
    created_by: Option<Uuid>,
) -> Result<Location, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO locations (map_id, title, description, x_percent, y_percent, icon_id, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {LOCATION_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Location>(&sql)
        .bind(map_id)
        .bind(&values.title)
        .bind(&values.description)
        .bind(values.x_percent)
        .bind(values.y_percent)
        .bind(values.icon_id)
        .bind(created_by)
        .fetch_one(pool)
        .await
}

pub async fn find_location_by_id(
    pool: &PgPool,
    location_id: Uuid,
) -> Result<Option<Location>, sqlx::Error> {
    let sql = format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE id = $1");

    sqlx::query_as::<_, Location>(&sql)
        .bind(location_id)
        .fetch_optional(pool)
        .await
}

/// Pins on a map in creation order
pub async fn list_locations_by_map(pool: &PgPool, map_id: Uuid) -> Result<Vec<Location>, sqlx::Error> {
    let sql = format!(
        "SELECT {LOCATION_COLUMNS} FROM locations WHERE map_id = $1 ORDER BY created_at ASC, id ASC"
    );

    sqlx::query_as::<_, Location>(&sql)
        .bind(map_id)
        .fetch_all(pool)
        .await
}

pub async fn update_location(
    pool: &PgPool,
    location_id: Uuid,
    values: &LocationValues,
) -> Result<Option<Location>, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE locations
        SET title = $2, description = $3, x_percent = $4, y_percent = $5, icon_id = $6,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {LOCATION_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Location>(&sql)
        .bind(location_id)
        .bind(&values.title)
        .bind(&values.description)
        .bind(values.x_percent)
        .bind(values.y_percent)
        .bind(values.icon_id)
        .fetch_optional(pool)
        .await
}

pub async fn delete_location(pool: &PgPool, location_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM locations WHERE id = $1")
        .bind(location_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
