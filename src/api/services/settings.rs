//! Site settings endpoints

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use chrono::Utc;

use crate::api::state::AppState;

use super::helpers::{api_result, error_from_talentenraad, session_user, success_response};
use super::types::SettingUpdate;

/// GET /api/settings/public
///
/// Decorations for today and the feature flags; nothing else is exposed.
pub async fn public_settings(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let today = Utc::now().date_naive();
    Ok(success_response(state.settings.public_view(today)))
}

/// GET /api/admin/settings
pub async fn all_settings(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(success_response(state.settings.all()))
}

/// PUT /api/admin/settings/{key}
pub async fn update_setting(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<SettingUpdate>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let key = path.into_inner();
    let user = match session_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(error_from_talentenraad(&e)),
    };
    Ok(api_result(
        state
            .settings
            .set(&key, body.into_inner().value, &user.email)
            .await,
    ))
}
