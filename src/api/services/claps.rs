//! Clap endpoints

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use tracing::{debug, trace};

use crate::api::state::AppState;
use crate::errors::TalentenraadError;

use super::error_code::ErrorCode;
use super::helpers::{CookieBuilder, api_result, error_from_talentenraad, json_response};
use super::types::{ClapQuery, ClapRequest, LimitQuery};

const DEFAULT_TOP_LIMIT: u64 = 10;

/// Session id from the clap cookie, if it looks like one we issued
fn clap_session(req: &HttpRequest, cookie_name: &str) -> Option<String> {
    req.cookie(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| uuid::Uuid::parse_str(v).is_ok())
}

/// GET /api/claps?contentId=
pub async fn get_claps(
    req: HttpRequest,
    query: web::Query<ClapQuery>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let session = clap_session(&req, &state.config.claps.session_cookie);
    trace!("Clap status requested for {}", query.content_id);
    Ok(api_result(
        state
            .claps
            .get_status(session.as_deref(), &query.content_id)
            .await,
    ))
}

/// POST /api/claps
///
/// Creates the clap session cookie on the first clap. When the session
/// reached its ceiling the answer is 429 carrying the current status.
pub async fn post_claps(
    req: HttpRequest,
    body: web::Json<ClapRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let cookies = CookieBuilder::new(&state.config.claps);
    let existing = clap_session(&req, cookies.clap_cookie_name());
    let is_new_session = existing.is_none();
    let session_id = existing.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let result = state
        .claps
        .add_claps(&session_id, &body.content_id, &body.content_type, body.count)
        .await;

    let mut response = match result {
        Ok(status) => json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(status)),
        Err(TalentenraadError::ClapLimit(msg)) => {
            debug!("Clap limit: {}", msg);
            let status = state
                .claps
                .get_status(Some(&session_id), &body.content_id)
                .await
                .ok();
            json_response(
                StatusCode::TOO_MANY_REQUESTS,
                ErrorCode::ClapLimitReached,
                msg,
                status,
            )
        }
        Err(e) => return Ok(error_from_talentenraad(&e)),
    };

    if is_new_session {
        response
            .add_cookie(&cookies.build_clap_session_cookie(session_id))
            .map_err(actix_web::error::ErrorInternalServerError)?;
    }
    Ok(response)
}

/// GET /api/admin/claps/top?limit=
pub async fn top_claps(
    query: web::Query<LimitQuery>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    Ok(api_result(state.claps.top_content(limit).await))
}
