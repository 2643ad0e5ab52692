use actix_web::{HttpResponse, Result as ActixResult, web};
use chrono::Utc;

use crate::api::state::AppState;
use crate::calendar::to_ics;

use super::helpers::error_from_talentenraad;

/// GET /api/calendar.ics
pub async fn calendar_ics(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let activities = match state.content.activities().await {
        Ok(a) => a,
        Err(e) => return Ok(error_from_talentenraad(&e)),
    };
    let published: Vec<_> = activities.into_iter().filter(|a| a.published).collect();

    Ok(HttpResponse::Ok()
        .append_header(("Content-Type", "text/calendar; charset=utf-8"))
        .append_header((
            "Content-Disposition",
            "inline; filename=\"talentenraad.ics\"",
        ))
        .body(to_ics(&published, Utc::now(), state.content.timezone())))
}
