use crate::models::{Invitation, UserRole};
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

const INVITATION_COLUMNS: &str =
    "id, email, role, token, status, invited_by, expires_at, created_at, accepted_at";

pub async fn create_invitation<'e, E>(
    executor: E,
    email: &str,
    role: &str,
    token: Uuid,
    invited_by: Option<Uuid>,
    expires_at: DateTime<Utc>,
) -> Result<Invitation, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        INSERT INTO invitations (email, role, token, status, invited_by, expires_at)
        VALUES ($1, $2, $3, 'pending', $4, $5)
        RETURNING {INVITATION_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Invitation>(&sql)
        .bind(email)
        .bind(role)
        .bind(token)
        .bind(invited_by)
        .bind(expires_at)
        .fetch_one(executor)
        .await
}

/// Newest first, optionally filtered by status
pub async fn list_invitations(
    pool: &PgPool,
    status: Option<&str>,
) -> Result<Vec<Invitation>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {INVITATION_COLUMNS}
        FROM invitations
        WHERE ($1::text IS NULL OR status = $1)
        ORDER BY created_at DESC
        "#
    );

    sqlx::query_as::<_, Invitation>(&sql)
        .bind(status)
        .fetch_all(pool)
        .await
}

pub async fn find_invitation_by_id(
    pool: &PgPool,
    invitation_id: Uuid,
) -> Result<Option<Invitation>, sqlx::Error> {
    let sql = format!("SELECT {INVITATION_COLUMNS} FROM invitations WHERE id = $1");

    sqlx::query_as::<_, Invitation>(&sql)
        .bind(invitation_id)
        .fetch_optional(pool)
        .await
}

/// Serialize invitation writes for one email until the transaction ends
pub async fn lock_email<'e, E>(executor: E, email: &str) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext(lower($1)))")
        .bind(email)
        .execute(executor)
        .await?;

    Ok(())
}

/// Whether a pending invitation already exists for this email
pub async fn has_pending_invitation<'e, E>(executor: E, email: &str) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM invitations
            WHERE lower(email) = lower($1) AND status = 'pending' AND expires_at > NOW()
        )
        "#,
    )
    .bind(email)
    .fetch_one(executor)
    .await
}

/// Lock the invitation row for the rest of the transaction
pub async fn find_invitation_by_token_for_update<'e, E>(
    executor: E,
    token: Uuid,
) -> Result<Option<Invitation>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT {INVITATION_COLUMNS} FROM invitations WHERE token = $1 FOR UPDATE");

    sqlx::query_as::<_, Invitation>(&sql)
        .bind(token)
        .fetch_optional(executor)
        .await
}

pub async fn mark_accepted<'e, E>(executor: E, invitation_id: Uuid) -> Result<Invitation, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        UPDATE invitations
        SET status = 'accepted', accepted_at = NOW()
        WHERE id = $1
        RETURNING {INVITATION_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Invitation>(&sql)
        .bind(invitation_id)
        .fetch_one(executor)
        .await
}

/// Revoke a pending invitation; `None` if it is missing or no longer pending
pub async fn revoke_invitation(
    pool: &PgPool,
    invitation_id: Uuid,
) -> Result<Option<Invitation>, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE invitations
        SET status = 'revoked'
        WHERE id = $1 AND status = 'pending'
        RETURNING {INVITATION_COLUMNS}
        "#
    );

    sqlx::query_as::<_, Invitation>(&sql)
        .bind(invitation_id)
        .fetch_optional(pool)
        .await
}

// ============================================
// User roles
// ============================================

pub async fn upsert_user_role<'e, E>(executor: E, user_id: Uuid, role: &str) -> Result<UserRole, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, UserRole>(
        r#"
        INSERT INTO user_roles (user_id, role)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE
        SET role = EXCLUDED.role, granted_at = NOW()
        RETURNING user_id, role, granted_at
        "#,
    )
    .bind(user_id)
    .bind(role)
    .fetch_one(executor)
    .await
}

pub async fn find_user_role(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRole>, sqlx::Error> {
    sqlx::query_as::<_, UserRole>("SELECT user_id, role, granted_at FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_user_roles(pool: &PgPool) -> Result<Vec<UserRole>, sqlx::Error> {
    sqlx::query_as::<_, UserRole>(
        "SELECT user_id, role, granted_at FROM user_roles ORDER BY granted_at ASC",
    )
    .fetch_all(pool)
    .await
}
