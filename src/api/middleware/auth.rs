use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{Method, StatusCode, header::CONTENT_TYPE},
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, info, trace, warn};

use crate::api::services::{ApiResponse, ErrorCode};
use crate::api::session::SessionUser;
use crate::api::state::AppState;

/// Admin authentication middleware
///
/// Requires a valid session cookie (401 otherwise) of an allowlisted email
/// or a privileged `users` row (403 otherwise).
#[derive(Clone, Default)]
pub struct AdminAuth;

impl<S, B> Transform<S, ServiceRequest> for AdminAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AdminAuthMiddleware<S> {
    service: Rc<S>,
}

enum Rejection {
    Unauthorized(ErrorCode, &'static str),
    Forbidden,
    Internal,
}

impl<S, B> AdminAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    /// Handle OPTIONS requests for CORS preflight
    fn handle_options_request(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        req.into_response(HttpResponse::NoContent().finish().map_into_right_body())
    }

    fn reject(req: ServiceRequest, rejection: Rejection) -> ServiceResponse<EitherBody<B>> {
        let (status, code, message) = match rejection {
            Rejection::Unauthorized(code, message) => (StatusCode::UNAUTHORIZED, code, message),
            Rejection::Forbidden => (
                StatusCode::FORBIDDEN,
                ErrorCode::NotAdmin,
                "Forbidden: no admin access for this account",
            ),
            Rejection::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                "Could not verify admin access",
            ),
        };
        req.into_response(
            HttpResponse::build(status)
                .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
                .json(ApiResponse::<()> {
                    code: code as i32,
                    message: message.to_string(),
                    data: None,
                })
                .map_into_right_body(),
        )
    }

    async fn authenticate(req: &ServiceRequest) -> Result<SessionUser, Rejection> {
        let state = req
            .app_data::<web::Data<AppState>>()
            .ok_or(Rejection::Internal)?;
        let cookie_name = &state.config.auth.session_cookie;

        let token = req
            .cookie(cookie_name)
            .map(|c| c.value().to_string())
            .or_else(|| {
                req.headers()
                    .get("Authorization")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.strip_prefix("Bearer "))
                    .map(str::to_string)
            })
            .ok_or(Rejection::Unauthorized(
                ErrorCode::SessionMissing,
                "Unauthorized: no session",
            ))?;

        let claims = state.sessions.verify(&token).map_err(|e| {
            info!("Admin session rejected: {}", e.message());
            Rejection::Unauthorized(ErrorCode::SessionInvalid, "Unauthorized: invalid session")
        })?;

        let allowlisted = state.config.auth.is_allowlisted(&claims.email);
        let user = state
            .storage
            .find_user_by_email(&claims.email)
            .await
            .map_err(|e| {
                warn!("User lookup for admin check failed: {}", e);
                Rejection::Internal
            })?;
        let role = user.as_ref().map(|u| u.role);

        if !allowlisted && !role.is_some_and(|r| r.is_privileged()) {
            info!("Admin access denied for {}", claims.email);
            return Err(Rejection::Forbidden);
        }

        if user.is_some()
            && let Err(e) = state.storage.touch_user_login(&claims.email).await
        {
            debug!("Could not stamp last login of {}: {}", claims.email, e);
        }

        Ok(SessionUser {
            id: user.map(|u| u.id).unwrap_or(claims.sub),
            email: claims.email.trim().to_lowercase(),
            name: claims.name,
            role,
            allowlisted,
        })
    }
}

impl<S, B> Service<ServiceRequest> for AdminAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            // Handle CORS preflight requests
            if req.method() == Method::OPTIONS {
                return Ok(Self::handle_options_request(req));
            }

            match Self::authenticate(&req).await {
                Ok(user) => {
                    trace!("Admin request by {}", user.email);
                    req.extensions_mut().insert(user);
                    let response = srv.call(req).await?.map_into_left_body();
                    Ok(response)
                }
                Err(rejection) => Ok(Self::reject(req, rejection)),
            }
        })
    }
}
