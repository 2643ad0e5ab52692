//! API 路由配置
//!
//! 公共路由挂在 `/api` 下，管理路由挂在 `/api/admin` 下并由 `AdminAuth` 保护。

use actix_web::web;

use super::calendar::calendar_ics;
use super::claps::{get_claps, post_claps, top_claps};
use super::content::{
    admin_create, admin_delete, admin_get, admin_list, admin_replace, admin_save_fields,
    list_published,
};
use super::data::{export_data, import_data};
use super::health::health_check;
use super::push::{
    broadcast, latest_notification, notification_history, subscribe, unsubscribe,
    vapid_public_key,
};
use super::settings::{all_settings, public_settings, update_setting};
use super::submissions::{
    create_submission, delete_submission, export_submissions, list_submissions,
    submission_rate_limiter, update_submission_status,
};
use super::users::{create_user, delete_user, list_audit_logs, list_users, me, update_user};

/// 公共路由
///
/// 包含：
/// - GET/HEAD /health
/// - GET/POST /claps
/// - GET /push/vapid-public-key, POST /push/subscribe, POST /push/unsubscribe
/// - GET /notifications/latest
/// - POST /submissions（带限流）
/// - GET /settings/public
/// - GET /calendar.ics
/// - GET /content/{model}
pub fn public_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/health", web::head().to(health_check))
        .route("/claps", web::get().to(get_claps))
        .route("/claps", web::post().to(post_claps))
        .route("/push/vapid-public-key", web::get().to(vapid_public_key))
        .route("/push/subscribe", web::post().to(subscribe))
        .route("/push/unsubscribe", web::post().to(unsubscribe))
        .route("/notifications/latest", web::get().to(latest_notification))
        .route(
            "/submissions",
            web::post()
                .to(create_submission)
                .wrap(submission_rate_limiter()),
        )
        .route("/settings/public", web::get().to(public_settings))
        .route("/calendar.ics", web::get().to(calendar_ics))
        .route("/content/{model}", web::get().to(list_published));
}

/// 内容管理路由 `/content`
fn content_routes() -> actix_web::Scope {
    web::scope("/content")
        .route("/{model}", web::get().to(admin_list))
        .route("/{model}", web::post().to(admin_create))
        .route("/{model}/{id}", web::get().to(admin_get))
        .route("/{model}/{id}", web::post().to(admin_save_fields))
        .route("/{model}/{id}", web::put().to(admin_replace))
        .route("/{model}/{id}", web::delete().to(admin_delete))
}

/// 提交管理路由 `/submissions`
fn submission_routes() -> actix_web::Scope {
    web::scope("/submissions")
        .route("", web::get().to(list_submissions))
        // 必须在 /{id} 之前注册
        .route("/export", web::get().to(export_submissions))
        .route("/{id}", web::put().to(update_submission_status))
        .route("/{id}", web::delete().to(delete_submission))
}

fn user_routes() -> actix_web::Scope {
    web::scope("/users")
        .route("", web::get().to(list_users))
        .route("", web::post().to(create_user))
        .route("/{id}", web::put().to(update_user))
        .route("/{id}", web::delete().to(delete_user))
}

/// 管理路由，调用方负责包一层 `AdminAuth`
pub fn admin_routes() -> actix_web::Scope {
    web::scope("")
        .service(content_routes())
        .service(submission_routes())
        .service(user_routes())
        .route("/notifications", web::get().to(notification_history))
        .route("/notifications", web::post().to(broadcast))
        .route("/audit-logs", web::get().to(list_audit_logs))
        .route("/settings", web::get().to(all_settings))
        .route("/settings/{key}", web::put().to(update_setting))
        .route("/claps/top", web::get().to(top_claps))
        .route("/data/export", web::get().to(export_data))
        .route("/data/import", web::post().to(import_data))
        .route("/me", web::get().to(me))
}
