/// Invitation and role handlers
use crate::error::Result;
use crate::services::invitations::{AcceptInvitationRequest, InviteRequest, SetRoleRequest};
use crate::services::InvitationService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct InvitationQuery {
    pub status: Option<String>,
}

pub async fn list_invitations(
    service: web::Data<InvitationService>,
    query: web::Query<InvitationQuery>,
) -> Result<HttpResponse> {
    let invitations = service.list(query.status.as_deref()).await?;
    Ok(HttpResponse::Ok().json(invitations))
}

pub async fn create_invitation(
    service: web::Data<InvitationService>,
    req: web::Json<InviteRequest>,
) -> Result<HttpResponse> {
    let invitation = service.invite(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(invitation))
}

pub async fn accept_invitation(
    service: web::Data<InvitationService>,
    req: web::Json<AcceptInvitationRequest>,
) -> Result<HttpResponse> {
    let accepted = service.accept(req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(accepted))
}

pub async fn revoke_invitation(
    service: web::Data<InvitationService>,
    invitation_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let invitation = service.revoke(*invitation_id).await?;
    Ok(HttpResponse::Ok().json(invitation))
}

pub async fn list_roles(service: web::Data<InvitationService>) -> Result<HttpResponse> {
    let roles = service.list_roles().await?;
    Ok(HttpResponse::Ok().json(roles))
}

pub async fn get_role(
    service: web::Data<InvitationService>,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let role = service.get_role(*user_id).await?;
    Ok(HttpResponse::Ok().json(role))
}

pub async fn set_role(
    service: web::Data<InvitationService>,
    user_id: web::Path<Uuid>,
    req: web::Json<SetRoleRequest>,
) -> Result<HttpResponse> {
    let role = service.set_role(*user_id, req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(role))
}
