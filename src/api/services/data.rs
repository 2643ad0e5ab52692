//! Admin data export and import

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};

use crate::api::state::AppState;
use crate::storage::{DataExport, ImportMode, NewAuditEntry};

use super::error_code::ErrorCode;
use super::helpers::{audit, error_from_talentenraad, error_response, session_user, success_response};
use super::types::ImportQuery;

/// GET /api/admin/data/export
pub async fn export_data(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let user = match session_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(error_from_talentenraad(&e)),
    };

    match state.storage.export_data().await {
        Ok(doc) => {
            audit(
                &state.storage,
                NewAuditEntry::new(&user.email, "data.export", "database"),
            )
            .await;
            let filename = format!("talentenraad_export_{}.json", Utc::now().format("%Y%m%d_%H%M%S"));
            info!("Data export generated for {}", user.email);
            Ok(HttpResponse::Ok()
                .append_header(("Content-Type", "application/json; charset=utf-8"))
                .append_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", filename),
                ))
                .json(doc))
        }
        Err(e) => {
            error!("Data export failed: {}", e);
            Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::ExportFailed,
                e.message(),
            ))
        }
    }
}

/// POST /api/admin/data/import?mode=skip|overwrite
///
/// Runs in one transaction; on error nothing is imported.
pub async fn import_data(
    req: HttpRequest,
    query: web::Query<ImportQuery>,
    body: web::Json<DataExport>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let user = match session_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(error_from_talentenraad(&e)),
    };
    let mode: ImportMode = match query.mode.as_deref() {
        None | Some("") => ImportMode::default(),
        Some(m) => match m.parse() {
            Ok(mode) => mode,
            Err(_) => {
                return Ok(error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorCode::ImportFailed,
                    &format!("Unknown import mode '{}' (use skip or overwrite)", m),
                ));
            }
        },
    };

    match state.storage.import_data(&body, mode).await {
        Ok(summary) => {
            // the import may have replaced site_settings
            if let Err(e) = state.settings.reload().await {
                warn!("Reloading settings after import failed: {}", e);
            }
            audit(
                &state.storage,
                NewAuditEntry::new(&user.email, "data.import", "database")
                    .details(json!({ "mode": mode, "summary": summary })),
            )
            .await;
            info!("Data import ({}) by {} finished", mode, user.email);
            Ok(success_response(summary))
        }
        Err(e) => {
            warn!("Data import failed: {}", e);
            Ok(error_response(
                e.http_status(),
                ErrorCode::ImportFailed,
                e.message(),
            ))
        }
    }
}
