//! User management, audit log and current-session endpoints

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use serde_json::json;
use tracing::info;

use crate::api::constants::DEFAULT_PAGE_SIZE;
use crate::api::state::AppState;
use crate::errors::{Result, TalentenraadError};
use crate::storage::{AuditFilter, NewAuditEntry, UserRole};

use super::helpers::{
    api_result, audit, created_response, error_from_talentenraad, session_user, success_response,
};
use super::submissions::is_plausible_email;
use super::types::{AuditQuery, MessageResponse, NewUserRequest, UpdateUserRequest};

fn parse_role(role: &str) -> Result<UserRole> {
    role.parse::<UserRole>()
        .map_err(|_| TalentenraadError::validation(format!("Unknown role '{}'", role)))
}

/// GET /api/admin/me
pub async fn me(req: HttpRequest) -> ActixResult<HttpResponse> {
    Ok(api_result(session_user(&req)))
}

/// GET /api/admin/users
pub async fn list_users(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(api_result(state.storage.list_users().await))
}

/// POST /api/admin/users
pub async fn create_user(
    req: HttpRequest,
    body: web::Json<NewUserRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let actor = match session_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(error_from_talentenraad(&e)),
    };
    let body = body.into_inner();
    if !is_plausible_email(body.email.trim()) {
        return Ok(error_from_talentenraad(&TalentenraadError::validation(
            "email address is not valid",
        )));
    }
    let role = match parse_role(&body.role) {
        Ok(r) => r,
        Err(e) => return Ok(error_from_talentenraad(&e)),
    };

    match state.storage.create_user(&body.email, body.name, role).await {
        Ok(user) => {
            audit(
                &state.storage,
                NewAuditEntry::new(&actor.email, "user.create", "user")
                    .resource(&user.id)
                    .details(json!({ "email": user.email, "role": user.role })),
            )
            .await;
            Ok(created_response(user))
        }
        Err(e) => Ok(error_from_talentenraad(&e)),
    }
}

/// PUT /api/admin/users/{id}
pub async fn update_user(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateUserRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    let actor = match session_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(error_from_talentenraad(&e)),
    };
    let body = body.into_inner();
    let role = match body.role.as_deref().map(parse_role).transpose() {
        Ok(r) => r,
        Err(e) => return Ok(error_from_talentenraad(&e)),
    };

    // no self-demotion, so the last admin cannot lock everyone out
    if actor.id == id && role.is_some_and(|r| !r.is_privileged()) && !actor.allowlisted {
        return Ok(error_from_talentenraad(&TalentenraadError::validation(
            "You cannot remove your own admin access",
        )));
    }

    match state.storage.update_user(&id, body.name, role).await {
        Ok(user) => {
            audit(
                &state.storage,
                NewAuditEntry::new(&actor.email, "user.update", "user")
                    .resource(&id)
                    .details(json!({ "role": user.role, "name": user.name })),
            )
            .await;
            Ok(success_response(user))
        }
        Err(e) => Ok(error_from_talentenraad(&e)),
    }
}

/// DELETE /api/admin/users/{id}
pub async fn delete_user(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    let actor = match session_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(error_from_talentenraad(&e)),
    };
    if actor.id == id {
        return Ok(error_from_talentenraad(&TalentenraadError::validation(
            "You cannot delete your own account",
        )));
    }

    match state.storage.delete_user(&id).await {
        Ok(()) => {
            audit(
                &state.storage,
                NewAuditEntry::new(&actor.email, "user.delete", "user").resource(&id),
            )
            .await;
            info!("{} deleted user {}", actor.email, id);
            Ok(success_response(MessageResponse {
                message: format!("User {} deleted", id),
            }))
        }
        Err(e) => Ok(error_from_talentenraad(&e)),
    }
}

/// GET /api/admin/audit-logs?page=&pageSize=&actor=&resourceType=
pub async fn list_audit_logs(
    query: web::Query<AuditQuery>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let query = query.into_inner();
    let filter = AuditFilter {
        actor: query.actor.filter(|a| !a.is_empty()),
        resource_type: query.resource_type.filter(|r| !r.is_empty()),
    };
    Ok(api_result(
        state
            .storage
            .list_audit_logs(
                &filter,
                query.page.unwrap_or(1),
                query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            )
            .await,
    ))
}
