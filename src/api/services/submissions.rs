//! Form submissions: public intake and admin inbox

use std::sync::OnceLock;

use actix_governor::{Governor, GovernorConfig, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError};
use actix_web::dev::ServiceRequest;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use chrono::Utc;
use csv::WriterBuilder;
use governor::middleware::NoOpMiddleware;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info};

use crate::api::constants::{
    DEFAULT_PAGE_SIZE, MAX_EMAIL_LEN, MAX_MESSAGE_LEN, MAX_NAME_LEN, MAX_SUBJECT_LEN,
    SUBMISSION_BURST, SUBMISSION_SECONDS_PER_REQUEST,
};
use crate::api::state::AppState;
use crate::config::get_config;
use crate::errors::{Result, TalentenraadError};
use crate::storage::{
    NewAuditEntry, NewSubmission, Submission, SubmissionFilter, SubmissionKind, SubmissionStatus,
};

use super::error_code::ErrorCode;
use super::helpers::{
    api_result, audit, client_ip, created_response, error_from_talentenraad, error_response,
    session_user, success_response,
};
use super::types::{MessageResponse, SubmissionListQuery, SubmissionRequest, SubmissionStatusUpdate};

const MAX_METADATA_BYTES: usize = 4 * 1024;

/// Rate limit key: the client IP
#[derive(Clone, Copy)]
pub struct SubmissionKeyExtractor;

impl KeyExtractor for SubmissionKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> std::result::Result<Self::Key, Self::KeyExtractionError> {
        let config = get_config();
        client_ip(&req.connection_info(), &config.server.trusted_proxies)
            .ok_or_else(|| SimpleKeyExtractionError::new("Unable to extract client IP"))
    }
}

/// Shared across workers so the limit holds per process
fn governor_config() -> &'static GovernorConfig<SubmissionKeyExtractor, NoOpMiddleware> {
    static CONFIG: OnceLock<GovernorConfig<SubmissionKeyExtractor, NoOpMiddleware>> =
        OnceLock::new();
    CONFIG.get_or_init(|| {
        GovernorConfigBuilder::default()
            .seconds_per_request(SUBMISSION_SECONDS_PER_REQUEST)
            .burst_size(SUBMISSION_BURST)
            .key_extractor(SubmissionKeyExtractor)
            .finish()
            .expect("Invalid rate limit config")
    })
}

/// Submission rate limiter; answers HTTP 429 when exceeded
pub fn submission_rate_limiter() -> Governor<SubmissionKeyExtractor, NoOpMiddleware> {
    debug!(
        "Submission rate limiter: 1 req/{}s, burst {}",
        SUBMISSION_SECONDS_PER_REQUEST, SUBMISSION_BURST
    );
    Governor::new(governor_config())
}

/// Something that looks like a deliverable address
pub fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

fn invalid(msg: impl Into<String>) -> TalentenraadError {
    TalentenraadError::validation(msg)
}

/// Check and normalize a public form submission
pub fn validate_submission(req: &SubmissionRequest) -> Result<NewSubmission> {
    let kind: SubmissionKind = req
        .kind
        .parse()
        .map_err(|_| invalid(format!("Unknown submission kind '{}'", req.kind)))?;

    let name = req.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(invalid(format!("name is required (max {} characters)", MAX_NAME_LEN)));
    }

    let email = req.email.trim().to_lowercase();
    if email.len() > MAX_EMAIL_LEN || !is_plausible_email(&email) {
        return Err(invalid("email address is not valid"));
    }

    let subject = req
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    if subject.as_ref().is_some_and(|s| s.chars().count() > MAX_SUBJECT_LEN) {
        return Err(invalid(format!("subject is too long (max {} characters)", MAX_SUBJECT_LEN)));
    }

    let message = req.message.trim();
    if message.is_empty() || message.chars().count() > MAX_MESSAGE_LEN {
        return Err(invalid(format!(
            "message is required (max {} characters)",
            MAX_MESSAGE_LEN
        )));
    }

    if let Some(metadata) = &req.metadata {
        if !metadata.is_object() {
            return Err(invalid("metadata must be an object"));
        }
        if metadata.to_string().len() > MAX_METADATA_BYTES {
            return Err(invalid("metadata is too large"));
        }
    }

    Ok(NewSubmission {
        kind,
        name: name.to_string(),
        email,
        subject,
        message: message.to_string(),
        metadata: req.metadata.clone(),
    })
}

fn submission_error(err: &TalentenraadError) -> HttpResponse {
    match err {
        TalentenraadError::Validation(msg) => {
            error_response(StatusCode::BAD_REQUEST, ErrorCode::SubmissionInvalid, msg)
        }
        other => error_from_talentenraad(other),
    }
}

/// POST /api/submissions
pub async fn create_submission(
    req: HttpRequest,
    body: web::Json<SubmissionRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let new = match validate_submission(&body) {
        Ok(n) => n,
        Err(e) => return Ok(submission_error(&e)),
    };

    let remote_ip = client_ip(&req.connection_info(), &state.config.server.trusted_proxies);
    let token = body.recaptcha_token.as_deref().unwrap_or_default();
    if let Err(e) = state.recaptcha.verify(token, remote_ip.as_deref()).await {
        info!("Submission rejected by reCAPTCHA: {}", e.message());
        return Ok(error_from_talentenraad(&e));
    }

    match state.storage.insert_submission(new).await {
        Ok(submission) => {
            info!("New {} submission #{}", submission.kind, submission.id);
            Ok(created_response(json!({ "id": submission.id })))
        }
        Err(e) => {
            error!("Storing submission failed: {}", e);
            Ok(error_from_talentenraad(&e))
        }
    }
}

fn parse_filter(query: &SubmissionListQuery) -> Result<SubmissionFilter> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<SubmissionStatus>()
                .map_err(|_| invalid(format!("Unknown status '{}'", s)))
        })
        .transpose()?;
    let kind = query
        .kind
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<SubmissionKind>()
                .map_err(|_| invalid(format!("Unknown kind '{}'", s)))
        })
        .transpose()?;
    Ok(SubmissionFilter { status, kind })
}

/// GET /api/admin/submissions?status=&kind=&page=&pageSize=
pub async fn list_submissions(
    query: web::Query<SubmissionListQuery>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let filter = match parse_filter(&query) {
        Ok(f) => f,
        Err(e) => return Ok(error_from_talentenraad(&e)),
    };
    Ok(api_result(
        state
            .storage
            .list_submissions(
                &filter,
                query.page.unwrap_or(1),
                query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            )
            .await,
    ))
}

/// PUT /api/admin/submissions/{id}
pub async fn update_submission_status(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<SubmissionStatusUpdate>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    let user = match session_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(error_from_talentenraad(&e)),
    };
    let status: SubmissionStatus = match body.status.parse() {
        Ok(s) => s,
        Err(_) => {
            return Ok(error_from_talentenraad(&invalid(format!(
                "Unknown status '{}'",
                body.status
            ))));
        }
    };

    match state.storage.update_submission_status(id, status).await {
        Ok(submission) => {
            audit(
                &state.storage,
                NewAuditEntry::new(&user.email, "submission.status", "submission")
                    .resource(id.to_string())
                    .details(json!({ "status": status })),
            )
            .await;
            Ok(success_response(submission))
        }
        Err(e) => Ok(error_from_talentenraad(&e)),
    }
}

/// DELETE /api/admin/submissions/{id}
pub async fn delete_submission(
    req: HttpRequest,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    let user = match session_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(error_from_talentenraad(&e)),
    };

    match state.storage.delete_submission(id).await {
        Ok(()) => {
            audit(
                &state.storage,
                NewAuditEntry::new(&user.email, "submission.delete", "submission")
                    .resource(id.to_string()),
            )
            .await;
            Ok(success_response(MessageResponse {
                message: format!("Submission {} deleted", id),
            }))
        }
        Err(e) => Ok(error_from_talentenraad(&e)),
    }
}

#[derive(Serialize)]
struct CsvSubmissionRow<'a> {
    id: i64,
    created_at: String,
    kind: String,
    status: String,
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message: &'a str,
}

/// Render submissions as CSV
pub fn submissions_to_csv(submissions: &[Submission]) -> anyhow::Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    for s in submissions {
        writer.serialize(CsvSubmissionRow {
            id: s.id,
            created_at: s.created_at.to_rfc3339(),
            kind: s.kind.to_string(),
            status: s.status.to_string(),
            name: &s.name,
            email: &s.email,
            subject: s.subject.as_deref().unwrap_or_default(),
            message: &s.message,
        })?;
    }
    Ok(writer.into_inner()?)
}

/// GET /api/admin/submissions/export?status=&kind=
pub async fn export_submissions(
    query: web::Query<SubmissionListQuery>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let filter = match parse_filter(&query) {
        Ok(f) => f,
        Err(e) => return Ok(error_from_talentenraad(&e)),
    };
    let submissions = match state.storage.all_submissions(&filter).await {
        Ok(s) => s,
        Err(e) => return Ok(error_from_talentenraad(&e)),
    };

    match submissions_to_csv(&submissions) {
        Ok(bytes) => {
            let filename = format!("submissions_{}.csv", Utc::now().format("%Y%m%d_%H%M%S"));
            info!("Exported {} submission(s) as CSV", submissions.len());
            Ok(HttpResponse::Ok()
                .append_header(("Content-Type", "text/csv; charset=utf-8"))
                .append_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", filename),
                ))
                .body(bytes))
        }
        Err(e) => {
            error!("CSV export failed: {}", e);
            Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::CsvGenerationError,
                "Failed to generate CSV",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SubmissionRequest {
        SubmissionRequest {
            kind: "contact".into(),
            name: " Jan Peeters ".into(),
            email: "Jan.Peeters@Example.be".into(),
            subject: Some("   ".into()),
            message: "Wanneer is het schoolfeest?".into(),
            recaptcha_token: None,
            metadata: None,
        }
    }

    #[test]
    fn test_validate_normalizes() {
        let new = validate_submission(&request()).unwrap();
        assert_eq!(new.kind, SubmissionKind::Contact);
        assert_eq!(new.name, "Jan Peeters");
        assert_eq!(new.email, "jan.peeters@example.be");
        assert!(new.subject.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let mut r = request();
        r.kind = "spam".into();
        assert!(validate_submission(&r).is_err());

        let mut r = request();
        r.email = "jan@localhost".into();
        assert!(validate_submission(&r).is_err());

        let mut r = request();
        r.message = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert!(validate_submission(&r).is_err());

        let mut r = request();
        r.metadata = Some(json!(["not", "an", "object"]));
        assert!(validate_submission(&r).is_err());
    }

    #[test]
    fn test_plausible_email() {
        assert!(is_plausible_email("a@b.be"));
        assert!(!is_plausible_email("a@b"));
        assert!(!is_plausible_email("@b.be"));
        assert!(!is_plausible_email("a b@c.be"));
        assert!(!is_plausible_email("a@@c.be"));
    }

    #[test]
    fn test_csv_export() {
        let submission = Submission {
            id: 7,
            kind: SubmissionKind::Volunteer,
            name: "Els".into(),
            email: "els@example.be".into(),
            subject: None,
            message: "Ik help graag, ook \"s avonds\"".into(),
            metadata: None,
            status: SubmissionStatus::New,
            created_at: Utc::now(),
        };
        let csv = String::from_utf8(submissions_to_csv(&[submission]).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,created_at,kind,status,name,email,subject,message"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("7,"));
        assert!(row.contains(",volunteer,new,Els,els@example.be,,"));
        assert!(row.contains("\"Ik help graag, ook \"\"s avonds\"\"\""));
    }
}
