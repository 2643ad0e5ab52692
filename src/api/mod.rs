//! HTTP API: handlers, middleware and shared state

pub mod constants;
pub mod middleware;
pub mod services;
pub mod session;
pub mod state;

use actix_web::web;

pub use state::AppState;

use constants::{ADMIN_SCOPE, API_PREFIX, JSON_LIMIT_BYTES};
use middleware::AdminAuth;
use services::{admin_routes, public_routes};

/// Mount everything under `/api`
///
/// The admin scope is registered before the public routes, otherwise
/// `/content/{model}` and friends would shadow it.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope(API_PREFIX)
            .app_data(web::JsonConfig::default().limit(JSON_LIMIT_BYTES))
            .service(web::scope(ADMIN_SCOPE).wrap(AdminAuth).service(admin_routes()))
            .configure(public_routes),
    );
}
