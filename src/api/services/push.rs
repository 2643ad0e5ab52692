//! Push subscription and notification endpoints

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use tracing::info;

use crate::api::state::AppState;

use super::error_code::ErrorCode;
use super::helpers::{api_result, error_from_talentenraad, error_response, session_user, success_response};
use super::types::{
    BroadcastRequest, LimitQuery, MessageResponse, PushSubscribeRequest, PushUnsubscribeRequest,
    VapidKeyResponse,
};

const DEFAULT_HISTORY_LIMIT: u64 = 50;

/// GET /api/push/vapid-public-key
pub async fn vapid_public_key(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    if !state.push_enabled {
        return Ok(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::PushNotConfigured,
            "Push notifications are not configured",
        ));
    }
    Ok(success_response(VapidKeyResponse {
        public_key: state.config.push.vapid_public_key.clone(),
    }))
}

/// POST /api/push/subscribe
pub async fn subscribe(
    req: HttpRequest,
    body: web::Json<PushSubscribeRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let user_agent = req
        .headers()
        .get("User-Agent")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let body = body.into_inner();
    match state
        .notifications
        .subscribe(&body.endpoint, &body.keys.p256dh, &body.keys.auth, user_agent)
        .await
    {
        Ok(()) => {
            info!("Push subscription registered");
            Ok(success_response(MessageResponse {
                message: "Subscribed".to_string(),
            }))
        }
        Err(e) => Ok(error_from_talentenraad(&e)),
    }
}

/// POST /api/push/unsubscribe
pub async fn unsubscribe(
    body: web::Json<PushUnsubscribeRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    Ok(api_result(
        state
            .notifications
            .unsubscribe(&body.endpoint)
            .await
            .map(|removed| MessageResponse {
                message: if removed { "Unsubscribed" } else { "Not subscribed" }.to_string(),
            }),
    ))
}

/// GET /api/notifications/latest
///
/// Read by the service worker when an (empty) push arrives.
pub async fn latest_notification(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(api_result(state.notifications.latest().await))
}

/// GET /api/admin/notifications?limit=
pub async fn notification_history(
    query: web::Query<LimitQuery>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Ok(api_result(state.notifications.history(limit).await))
}

/// POST /api/admin/notifications
pub async fn broadcast(
    req: HttpRequest,
    body: web::Json<BroadcastRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    if !state.push_enabled {
        return Ok(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::PushNotConfigured,
            "Push notifications are not configured",
        ));
    }
    let user = match session_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(error_from_talentenraad(&e)),
    };

    let body = body.into_inner();
    Ok(api_result(
        state
            .notifications
            .broadcast(&body.title, &body.body, body.url, &user.email)
            .await,
    ))
}
