use crate::models::Icon;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create_icon(
    pool: &PgPool,
    name: &str,
    url: &str,
    category: &str,
) -> Result<Icon, sqlx::Error> {
    sqlx::query_as::<_, Icon>(
        r#"
        INSERT INTO icons (name, url, category)
        VALUES ($1, $2, $3)
        RETURNING id, name, url, category, created_at
        "#,
    )
    .bind(name)
    .bind(url)
    .bind(category)
    .fetch_one(pool)
    .await
}

/// Icons ordered by category then name, optionally restricted to one category
pub async fn list_icons(pool: &PgPool, category: Option<&str>) -> Result<Vec<Icon>, sqlx::Error> {
    sqlx::query_as::<_, Icon>(
        r#"
        SELECT id, name, url, category, created_at
        FROM icons
        WHERE ($1::text IS NULL OR category = $1)
        ORDER BY category ASC, name ASC
        "#,
    )
    .bind(category)
    .fetch_all(pool)
    .await
}

pub async fn delete_icon(pool: &PgPool, icon_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM icons WHERE id = $1")
        .bind(icon_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
