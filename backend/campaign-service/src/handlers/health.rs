use actix_web::{web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;
use std::time::Duration;

const DB_PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Liveness plus a database ping; 503 when the database is unreachable
pub async fn health(pool: web::Data<PgPool>) -> HttpResponse {
    let ping = tokio::time::timeout(
        DB_PING_TIMEOUT,
        sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool.get_ref()),
    )
    .await;

    match ping {
        Ok(Ok(_)) => HttpResponse::Ok().json(json!({
            "status": "ok",
            "service": "campaign-service",
            "database": "up",
        })),
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "Health check database ping failed");
            degraded()
        }
        Err(_) => {
            tracing::warn!("Health check database ping timed out");
            degraded()
        }
    }
}

fn degraded() -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(json!({
        "status": "degraded",
        "service": "campaign-service",
        "database": "down",
    }))
}
