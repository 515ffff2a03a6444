use super::escape_like;
use crate::models::{ScoredDocument, WikiDocument};
use sqlx::PgPool;
use uuid::Uuid;

const DOCUMENT_COLUMNS: &str = "id, title, url, content, category, \
     (embedding IS NOT NULL) AS has_embedding, created_at, updated_at";

/// Render an embedding as a pgvector literal (`[0.1,0.2,...]`)
pub fn format_vector(embedding: &[f32]) -> String {
    let mut literal = String::with_capacity(embedding.len() * 10 + 2);
    literal.push('[');
    for (i, value) in embedding.iter().enumerate() {
        if i > 0 {
            literal.push(',');
        }
        literal.push_str(&value.to_string());
    }
    literal.push(']');
    literal
}

/// Insert a page or refresh the one stored under the same URL.
///
/// A changed title or content clears the stored embedding so it is regenerated.
pub async fn upsert_document(
    pool: &PgPool,
    title: &str,
    url: &str,
    content: &str,
    category: Option<&str>,
) -> Result<WikiDocument, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO wiki_content (title, url, content, category)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (url) DO UPDATE
        SET title = EXCLUDED.title,
            content = EXCLUDED.content,
            category = EXCLUDED.category,
            embedding = CASE
                WHEN wiki_content.content = EXCLUDED.content
                     AND wiki_content.title = EXCLUDED.title THEN wiki_content.embedding
                ELSE NULL
            END,
            updated_at = NOW()
        RETURNING {DOCUMENT_COLUMNS}
        "#
    );

    sqlx::query_as::<_, WikiDocument>(&sql)
        .bind(title)
        .bind(url)
        .bind(content)
        .bind(category)
        .fetch_one(pool)
        .await
}

pub async fn set_embedding(pool: &PgPool, document_id: Uuid, embedding: &[f32]) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE wiki_content
        SET embedding = $2::vector, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(document_id)
    .bind(format_vector(embedding))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find_document_by_id(
    pool: &PgPool,
    document_id: Uuid,
) -> Result<Option<WikiDocument>, sqlx::Error> {
    let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM wiki_content WHERE id = $1");

    sqlx::query_as::<_, WikiDocument>(&sql)
        .bind(document_id)
        .fetch_optional(pool)
        .await
}

/// Page through documents by title, optionally filtered by a title substring
pub async fn list_documents(
    pool: &PgPool,
    title_filter: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<WikiDocument>, sqlx::Error> {
    let pattern = title_filter.map(|q| format!("%{}%", escape_like(q)));
    let sql = format!(
        r#"
        SELECT {DOCUMENT_COLUMNS}
        FROM wiki_content
        WHERE ($1::text IS NULL OR title ILIKE $1)
        ORDER BY title ASC, id ASC
        LIMIT $2 OFFSET $3
        "#
    );

    sqlx::query_as::<_, WikiDocument>(&sql)
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn count_documents(pool: &PgPool, title_filter: Option<&str>) -> Result<i64, sqlx::Error> {
    let pattern = title_filter.map(|q| format!("%{}%", escape_like(q)));

    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM wiki_content WHERE ($1::text IS NULL OR title ILIKE $1)",
    )
    .bind(pattern)
    .fetch_one(pool)
    .await
}

pub async fn delete_document(pool: &PgPool, document_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM wiki_content WHERE id = $1")
        .bind(document_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Documents still waiting for an embedding: (id, title, content)
pub async fn documents_missing_embedding(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<(Uuid, String, String)>, sqlx::Error> {
    sqlx::query_as::<_, (Uuid, String, String)>(
        r#"
        SELECT id, title, content
        FROM wiki_content
        WHERE embedding IS NULL
        ORDER BY created_at ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Cosine-similarity match against stored embeddings
pub async fn match_documents(
    pool: &PgPool,
    embedding: &[f32],
    match_threshold: f64,
    match_count: i64,
) -> Result<Vec<ScoredDocument>, sqlx::Error> {
    sqlx::query_as::<_, ScoredDocument>(
        r#"
        SELECT id, title, url, content,
               (1 - (embedding <=> $1::vector))::float8 AS similarity
        FROM wiki_content
        WHERE embedding IS NOT NULL
          AND 1 - (embedding <=> $1::vector) >= $2
        ORDER BY embedding <=> $1::vector
        LIMIT $3
        "#,
    )
    .bind(format_vector(embedding))
    .bind(match_threshold)
    .bind(match_count)
    .fetch_all(pool)
    .await
}

/// Full-text search over title and content, ranked by `ts_rank`
pub async fn keyword_search(
    pool: &PgPool,
    query: &str,
    match_count: i64,
) -> Result<Vec<ScoredDocument>, sqlx::Error> {
    sqlx::query_as::<_, ScoredDocument>(
        r#"
        SELECT id, title, url, content,
               ts_rank(to_tsvector('english', title || ' ' || content),
                       plainto_tsquery('english', $1))::float8 AS similarity
        FROM wiki_content
        WHERE to_tsvector('english', title || ' ' || content) @@ plainto_tsquery('english', $1)
        ORDER BY similarity DESC, title ASC
        LIMIT $2
        "#,
    )
    .bind(query)
    .bind(match_count)
    .fetch_all(pool)
    .await
}

/// Substring match on titles, used when full-text search finds nothing
pub async fn title_search(
    pool: &PgPool,
    query: &str,
    match_count: i64,
) -> Result<Vec<ScoredDocument>, sqlx::Error> {
    sqlx::query_as::<_, ScoredDocument>(
        r#"
        SELECT id, title, url, content, 0.0::float8 AS similarity
        FROM wiki_content
        WHERE title ILIKE $1
        ORDER BY length(title) ASC, title ASC
        LIMIT $2
        "#,
    )
    .bind(format!("%{}%", escape_like(query.trim())))
    .bind(match_count)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_literal_format() {
        assert_eq!(format_vector(&[0.5, -1.0, 0.25]), "[0.5,-1,0.25]");
        assert_eq!(format_vector(&[]), "[]");
    }
}
