//! Content endpoints (public reads and admin edits)

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

use crate::api::constants::PUBLIC_CONTENT_LIMIT;
use crate::api::session::SessionUser;
use crate::api::state::AppState;
use crate::cms::{
    ContentQuery, ContentService, MODEL_ACTIVITY, MODEL_ANNOUNCEMENT, MODEL_NEWS, MODEL_PAGE,
};
use crate::errors::TalentenraadError;
use crate::storage::NewAuditEntry;

use super::error_code::ErrorCode;
use super::helpers::{
    audit, created_response, error_from_talentenraad, error_response, session_user,
    success_response,
};
use super::types::{
    ContentCreateRequest, ContentListQuery, ContentReplaceRequest, ContentSaveRequest,
    MessageResponse,
};

fn unknown_model(model: &str) -> HttpResponse {
    error_response(
        StatusCode::NOT_FOUND,
        ErrorCode::UnknownModel,
        &format!("Unknown content model '{}'", model),
    )
}

fn build_query(query: &ContentListQuery) -> ContentQuery {
    let mut q = ContentQuery::default();
    if let Some(limit) = query.limit {
        q = q.limit(limit);
    }
    if let Some(offset) = query.offset {
        q = q.offset(offset);
    }
    if let Some(url) = query.url.as_deref().filter(|u| !u.is_empty()) {
        q = q.filter("url", url);
    }
    q
}

fn content_error(err: &TalentenraadError) -> HttpResponse {
    match err {
        TalentenraadError::NotFound(msg) => {
            error_response(StatusCode::NOT_FOUND, ErrorCode::ContentNotFound, msg)
        }
        other => error_from_talentenraad(other),
    }
}

/// Resolve the admin user, or the error response to return
fn admin(req: &HttpRequest) -> Result<SessionUser, HttpResponse> {
    session_user(req).map_err(|e| error_from_talentenraad(&e))
}

/// Page of a typed listing, after the model-specific filtering
fn page_of<T: Serialize>(items: Vec<T>, query: &ContentListQuery) -> Value {
    let offset = query.offset.unwrap_or(0) as usize;
    let limit = query.limit.unwrap_or(PUBLIC_CONTENT_LIMIT).clamp(1, 100) as usize;
    json!(items.into_iter().skip(offset).take(limit).collect::<Vec<_>>())
}

/// Published entries of `model` as the public site should see them
///
/// - `activiteit`: upcoming activities only, by start
/// - `aankondiging`: announcements inside their active window, urgent first
/// - `nieuws`: newest first
/// - `page` with `?url=`: the page at that path
async fn public_listing(
    content: &ContentService,
    model: &str,
    query: &ContentListQuery,
) -> Result<Value, TalentenraadError> {
    let now = Utc::now();
    match model {
        MODEL_ACTIVITY => Ok(page_of(content.activities_upcoming(now).await?, query)),
        MODEL_ANNOUNCEMENT => Ok(page_of(content.active_announcements(now).await?, query)),
        MODEL_NEWS => {
            let wanted = query.offset.unwrap_or(0) + query.limit.unwrap_or(PUBLIC_CONTENT_LIMIT);
            let news = content.news(wanted).await?;
            Ok(page_of(news, query))
        }
        MODEL_PAGE if query.url.as_deref().is_some_and(|u| !u.is_empty()) => {
            let url = query.url.as_deref().unwrap_or("/");
            let page: Vec<_> = content.page(url).await?.into_iter().collect();
            Ok(json!(page))
        }
        _ => {
            let entries = content.store().list(model, &build_query(query)).await?;
            let published: Vec<_> = entries.into_iter().filter(|e| e.published).collect();
            Ok(json!(published))
        }
    }
}

/// GET /api/content/{model}
pub async fn list_published(
    path: web::Path<String>,
    query: web::Query<ContentListQuery>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let model = path.into_inner();
    if !state.config.cms.is_known_model(&model) {
        return Ok(unknown_model(&model));
    }
    match public_listing(&state.content, &model, &query).await {
        Ok(listing) => Ok(success_response(listing)),
        Err(e) => Ok(content_error(&e)),
    }
}

/// GET /api/admin/content/{model}, drafts included
pub async fn admin_list(
    path: web::Path<String>,
    query: web::Query<ContentListQuery>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let model = path.into_inner();
    if !state.config.cms.is_known_model(&model) {
        return Ok(unknown_model(&model));
    }
    let q = build_query(&query).with_unpublished();
    match state.content.store().list(&model, &q).await {
        Ok(entries) => Ok(success_response(entries)),
        Err(e) => Ok(content_error(&e)),
    }
}

/// GET /api/admin/content/{model}/{id}
pub async fn admin_get(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let (model, id) = path.into_inner();
    if !state.config.cms.is_known_model(&model) {
        return Ok(unknown_model(&model));
    }
    match state.content.store().get(&model, &id).await {
        Ok(Some(entry)) => Ok(success_response(entry)),
        Ok(None) => Ok(content_error(&TalentenraadError::not_found(format!(
            "{} {} not found",
            model, id
        )))),
        Err(e) => Ok(content_error(&e)),
    }
}

/// POST /api/admin/content/{model}
pub async fn admin_create(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<ContentCreateRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let model = path.into_inner();
    if !state.config.cms.is_known_model(&model) {
        return Ok(unknown_model(&model));
    }
    let user = match admin(&req) {
        Ok(u) => u,
        Err(resp) => return Ok(resp),
    };
    let body = body.into_inner();
    if body.name.trim().is_empty() {
        return Ok(error_from_talentenraad(&TalentenraadError::validation(
            "name is required",
        )));
    }

    match state
        .content
        .store()
        .create(&model, body.name.trim(), Value::Object(body.data), body.published)
        .await
    {
        Ok(entry) => {
            audit(
                &state.storage,
                NewAuditEntry::new(&user.email, "content.create", &model)
                    .resource(&entry.id)
                    .details(json!({ "name": entry.name, "published": entry.published })),
            )
            .await;
            info!("{} created {} {}", user.email, model, entry.id);
            Ok(created_response(entry))
        }
        Err(e) => Ok(content_error(&e)),
    }
}

/// POST /api/admin/content/{model}/{id}
///
/// Edit-mode save: the body carries only the changed fields, which are
/// merged into the stored data.
pub async fn admin_save_fields(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<ContentSaveRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let (model, id) = path.into_inner();
    if !state.config.cms.is_known_model(&model) {
        return Ok(unknown_model(&model));
    }
    let user = match admin(&req) {
        Ok(u) => u,
        Err(resp) => return Ok(resp),
    };
    let body = body.into_inner();
    if body.model.as_deref().is_some_and(|m| m != model) {
        return Ok(error_from_talentenraad(&TalentenraadError::validation(
            "model in body does not match the path",
        )));
    }
    if body.data.is_empty() {
        return Ok(error_from_talentenraad(&TalentenraadError::validation(
            "no fields to save",
        )));
    }

    let fields: Vec<String> = body.data.keys().cloned().collect();
    match state
        .content
        .store()
        .update(&model, &id, Value::Object(body.data))
        .await
    {
        Ok(entry) => {
            audit(
                &state.storage,
                NewAuditEntry::new(&user.email, "content.update", &model)
                    .resource(&id)
                    .details(json!({ "fields": fields })),
            )
            .await;
            info!("{} saved {} field(s) of {} {}", user.email, fields.len(), model, id);
            Ok(success_response(entry))
        }
        Err(e) => Ok(content_error(&e)),
    }
}

/// PUT /api/admin/content/{model}/{id}
pub async fn admin_replace(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<ContentReplaceRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let (model, id) = path.into_inner();
    if !state.config.cms.is_known_model(&model) {
        return Ok(unknown_model(&model));
    }
    let user = match admin(&req) {
        Ok(u) => u,
        Err(resp) => return Ok(resp),
    };

    match state
        .content
        .store()
        .replace(&model, &id, Value::Object(body.into_inner().data))
        .await
    {
        Ok(entry) => {
            audit(
                &state.storage,
                NewAuditEntry::new(&user.email, "content.replace", &model).resource(&id),
            )
            .await;
            Ok(success_response(entry))
        }
        Err(e) => Ok(content_error(&e)),
    }
}

/// DELETE /api/admin/content/{model}/{id}
pub async fn admin_delete(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let (model, id) = path.into_inner();
    if !state.config.cms.is_known_model(&model) {
        return Ok(unknown_model(&model));
    }
    let user = match admin(&req) {
        Ok(u) => u,
        Err(resp) => return Ok(resp),
    };

    match state.content.store().delete(&model, &id).await {
        Ok(()) => {
            audit(
                &state.storage,
                NewAuditEntry::new(&user.email, "content.delete", &model).resource(&id),
            )
            .await;
            info!("{} deleted {} {}", user.email, model, id);
            Ok(success_response(MessageResponse {
                message: format!("{} {} deleted", model, id),
            }))
        }
        Err(e) => Ok(content_error(&e)),
    }
}
