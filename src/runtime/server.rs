//! Server mode
//!
//! Builds the shared state, configures actix-web with CORS, compression and
//! request ids, and runs until Ctrl+C.

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    http::{Method, header},
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::Result;
use tracing::{error, info, warn};

use crate::api::{self, middleware::RequestIdMiddleware};
use crate::config::{CorsConfig, get_config};
use crate::runtime::{shutdown, startup};

const CORS_MAX_AGE_SECS: usize = 3600;

/// Validate CORS configuration at startup (runs once, not per worker)
fn validate_cors_config(cors_config: &CorsConfig) {
    if !cors_config.enabled {
        return;
    }

    if cors_config.allowed_origins.is_empty() {
        warn!(
            "CORS enabled but allowed_origins is empty. \
            No cross-origin requests will be allowed."
        );
    }

    if cors_config.allowed_origins.iter().any(|o| o == "*") {
        warn!(
            "CORS allows any origin; credentials (session and clap cookies) are not sent cross-origin"
        );
    }
}

/// Build CORS middleware from configuration
fn build_cors_middleware(cors_config: &CorsConfig) -> Cors {
    // Disabled: browsers fall back to same-origin
    if !cors_config.enabled {
        return Cors::default();
    }

    let mut cors = Cors::default()
        .allowed_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::HEAD,
        ])
        .allowed_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(CORS_MAX_AGE_SECS);

    let is_any_origin = cors_config.allowed_origins.iter().any(|o| o == "*");
    if is_any_origin {
        cors = cors.allow_any_origin();
    } else {
        for origin in &cors_config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
        // session and clap cookies need credentials
        cors = cors.supports_credentials();
    }

    cors
}

/// Run the HTTP server
///
/// **Note**: logging must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let config = get_config();

    let state = startup::prepare_server_startup(config.clone())
        .await
        .map_err(|e| {
            error!("Server startup failed: {}", e);
            e
        })?;
    let storage = state.storage.clone();
    let data = web::Data::new(state);

    validate_cors_config(&config.cors);
    if config.server.trusted_proxies.is_empty() {
        warn!(
            "Submission rate limiting: no trusted proxies configured, \
             X-Forwarded-For is only honoured from private addresses."
        );
    }

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    info!("Using {} worker(s) for the server", cpu_count);

    let cors_config = config.cors.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(build_cors_middleware(&cors_config))
            .wrap(Compress::default())
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .app_data(data.clone())
            .configure(api::configure)
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .disable_signals()
    .workers(cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server.bind(bind_address)?.run();
    let handle = server.handle();

    // Wait for server or shutdown signal
    tokio::select! {
        res = server => {
            res?;
        }
        _ = shutdown::listen_for_shutdown(handle, storage) => {
            warn!("Graceful shutdown complete");
        }
    }

    Ok(())
}
