/// Invitation and role service
use crate::db::invitation_repo;
use crate::error::{AppError, Result};
use crate::models::{Invitation, InvitationStatus, Role, UserRole};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InviteRequest {
    #[validate(email)]
    pub email: String,
    pub role: String,
    pub invited_by: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcceptInvitationRequest {
    pub token: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct AcceptedInvitation {
    pub invitation: Invitation,
    pub role: UserRole,
}

pub struct InvitationService {
    pool: PgPool,
    ttl_hours: i64,
}

impl InvitationService {
    pub fn new(pool: PgPool, ttl_hours: i64) -> Self {
        Self { pool, ttl_hours }
    }

    pub async fn invite(&self, req: InviteRequest) -> Result<Invitation> {
        req.validate()?;
        let role = parse_role(&req.role)?;
        let email = req.email.trim().to_lowercase();
        let expires_at = expiry_after(Utc::now(), self.ttl_hours)?;

        let mut tx = self.pool.begin().await?;
        invitation_repo::lock_email(&mut *tx, &email).await?;

        if invitation_repo::has_pending_invitation(&mut *tx, &email).await? {
            return Err(AppError::Conflict(format!(
                "a pending invitation for {} already exists",
                email
            )));
        }

        let invitation = invitation_repo::create_invitation(
            &mut *tx,
            &email,
            role.as_str(),
            Uuid::new_v4(),
            req.invited_by,
            expires_at,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            invitation_id = %invitation.id,
            role = role.as_str(),
            expires_at = %invitation.expires_at,
            "Invitation created"
        );

        Ok(invitation)
    }

    pub async fn list(&self, status: Option<&str>) -> Result<Vec<Invitation>> {
        let status = status
            .map(|s| s.parse::<InvitationStatus>().map_err(AppError::Validation))
            .transpose()?;

        Ok(invitation_repo::list_invitations(&self.pool, status.as_ref().map(|s| s.as_str())).await?)
    }

    /// Revoke a pending invitation
    pub async fn revoke(&self, invitation_id: Uuid) -> Result<Invitation> {
        if let Some(invitation) = invitation_repo::revoke_invitation(&self.pool, invitation_id).await? {
            tracing::info!(%invitation_id, "Invitation revoked");
            return Ok(invitation);
        }

        match invitation_repo::find_invitation_by_id(&self.pool, invitation_id).await? {
            Some(existing) => Err(AppError::Conflict(format!(
                "invitation {} is {}",
                invitation_id, existing.status
            ))),
            None => Err(AppError::NotFound(format!("invitation {}", invitation_id))),
        }
    }

    /// Grant the invited role to `user_id` and mark the invitation accepted
    pub async fn accept(&self, req: AcceptInvitationRequest) -> Result<AcceptedInvitation> {
        let mut tx = self.pool.begin().await?;

        let invitation = invitation_repo::find_invitation_by_token_for_update(&mut *tx, req.token)
            .await?
            .ok_or_else(|| AppError::NotFound("invitation not found".to_string()))?;

        check_acceptable(&invitation, Utc::now())?;

        let role = invitation_repo::upsert_user_role(&mut *tx, req.user_id, &invitation.role).await?;
        let invitation = invitation_repo::mark_accepted(&mut *tx, invitation.id).await?;

        tx.commit().await?;

        tracing::info!(
            invitation_id = %invitation.id,
            user_id = %req.user_id,
            role = %role.role,
            "Invitation accepted"
        );

        Ok(AcceptedInvitation { invitation, role })
    }

    pub async fn list_roles(&self) -> Result<Vec<UserRole>> {
        Ok(invitation_repo::list_user_roles(&self.pool).await?)
    }

    pub async fn get_role(&self, user_id: Uuid) -> Result<UserRole> {
        invitation_repo::find_user_role(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no role for user {}", user_id)))
    }

    pub async fn set_role(&self, user_id: Uuid, req: SetRoleRequest) -> Result<UserRole> {
        let role = parse_role(&req.role)?;
        let granted = invitation_repo::upsert_user_role(&self.pool, user_id, role.as_str()).await?;

        tracing::info!(%user_id, role = role.as_str(), "User role set");

        Ok(granted)
    }
}

fn parse_role(raw: &str) -> Result<Role> {
    raw.parse::<Role>().map_err(AppError::Validation)
}

/// Expiry timestamp `ttl_hours` after `now`
pub fn expiry_after(now: DateTime<Utc>, ttl_hours: i64) -> Result<DateTime<Utc>> {
    Duration::try_hours(ttl_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| AppError::Internal(format!("invitation ttl of {} hours overflows", ttl_hours)))
}

/// Pending and unexpired invitations can be accepted
pub fn check_acceptable(invitation: &Invitation, now: DateTime<Utc>) -> Result<()> {
    let status = invitation
        .status
        .parse::<InvitationStatus>()
        .map_err(AppError::Internal)?;

    if status != InvitationStatus::Pending {
        return Err(AppError::Conflict(format!(
            "invitation is already {}",
            status.as_str()
        )));
    }

    if invitation.expires_at <= now {
        return Err(AppError::Gone(format!(
            "invitation expired at {}",
            invitation.expires_at.to_rfc3339()
        )));
    }

    Ok(())
}
