/// Database access layer
///
/// Plain sqlx query functions grouped per table. Functions that take part in
/// a transaction accept any `PgExecutor` so callers can pass a pool or `&mut *tx`.
pub mod icon_repo;
pub mod invitation_repo;
pub mod location_repo;
pub mod map_area_repo;
pub mod map_settings_repo;
pub mod wiki_repo;

use sqlx::PgPool;

/// Apply the embedded migrations (creates the `vector` extension on first run)
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::debug!("Running database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// Escape `LIKE` wildcards in user input
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
