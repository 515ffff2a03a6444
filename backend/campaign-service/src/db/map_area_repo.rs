use crate::models::MapArea;
use sqlx::PgPool;
use uuid::Uuid;

const AREA_COLUMNS: &str = "id, map_id, name, description, area_type, x_percent, y_percent, \
     width_percent, height_percent, created_at";

/// Area extracted from a map image, already clamped to the image
#[derive(Debug, Clone, PartialEq)]
pub struct NewMapArea {
    pub name: String,
    pub description: Option<String>,
    pub area_type: String,
    pub x_percent: f64,
    pub y_percent: f64,
    pub width_percent: f64,
    pub height_percent: f64,
}

/// Replace every stored area of `map_id` in a single transaction
pub async fn replace_areas_for_map(
    pool: &PgPool,
    map_id: Uuid,
    areas: &[NewMapArea],
) -> Result<Vec<MapArea>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM map_areas WHERE map_id = $1")
        .bind(map_id)
        .execute(&mut *tx)
        .await?;

    let sql = format!(
        r#"
        INSERT INTO map_areas (map_id, name, description, area_type, x_percent, y_percent,
                               width_percent, height_percent)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {AREA_COLUMNS}
        "#
    );

    let mut stored = Vec::with_capacity(areas.len());
    for area in areas {
        let row = sqlx::query_as::<_, MapArea>(&sql)
            .bind(map_id)
            .bind(&area.name)
            .bind(&area.description)
            .bind(&area.area_type)
            .bind(area.x_percent)
            .bind(area.y_percent)
            .bind(area.width_percent)
            .bind(area.height_percent)
            .fetch_one(&mut *tx)
            .await?;
        stored.push(row);
    }

    tx.commit().await?;

    Ok(stored)
}

pub async fn list_areas_by_map(pool: &PgPool, map_id: Uuid) -> Result<Vec<MapArea>, sqlx::Error> {
    let sql = format!(
        "SELECT {AREA_COLUMNS} FROM map_areas WHERE map_id = $1 ORDER BY created_at ASC, name ASC"
    );

    sqlx::query_as::<_, MapArea>(&sql)
        .bind(map_id)
        .fetch_all(pool)
        .await
}
