use std::time::{Duration, Instant};

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde_json::json;
use tracing::{error, trace};

use crate::api::state::AppState;

/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let start_time = Instant::now();
    trace!("Received health check request");

    // database liveness
    let database = match tokio::time::timeout(Duration::from_secs(5), state.storage.ping()).await {
        Ok(Ok(())) => json!({
            "status": "healthy",
            "backend": state.storage.backend_name(),
        }),
        Ok(Err(e)) => {
            error!("Database health check failed: {}", e);
            json!({
                "status": "unhealthy",
                "error": e.message(),
                "backend": state.storage.backend_name(),
            })
        }
        Err(_) => {
            error!("Database health check timeout");
            json!({
                "status": "unhealthy",
                "error": "timeout",
                "backend": state.storage.backend_name(),
            })
        }
    };

    let now = Utc::now();
    let uptime_seconds = (now - state.started_at).num_seconds().max(0) as u64;
    let is_healthy = database["status"] == "healthy";

    let body = json!({
        "status": if is_healthy { "healthy" } else { "unhealthy" },
        "timestamp": now.to_rfc3339(),
        "uptime": uptime_seconds,
        "checks": {
            "database": database,
            "push": { "enabled": state.push_enabled },
            "recaptcha": { "enabled": state.recaptcha.is_enabled() },
        },
        "response_time_ms": start_time.elapsed().as_millis(),
    });

    let status = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(body)
}
