//! Admin API integration tests
//!
//! Authentication, content editing, users, settings and the audit trail.

mod common;

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use serde_json::{Value, json};

use common::{ADMIN_EMAIL, entry, news, setup};
use talentenraad::cms::ContentStore;
use talentenraad::storage::{AuditFilter, UserRole};

macro_rules! admin_req {
    ($env:expr, $builder:expr) => {{
        $builder.cookie(Cookie::new($env.session_cookie_name(), $env.admin_session()))
    }};
}

// =============================================================================
// Authentication
// =============================================================================

#[actix_rt::test]
async fn test_missing_session_is_401() {
    let env = setup().await;
    let app = api_app!(env);

    let resp = test::call_service(&app, TestRequest::get().uri("/api/admin/me").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 2000);
}

#[actix_rt::test]
async fn test_invalid_session_is_401() {
    let env = setup().await;
    let app = api_app!(env);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/admin/me")
            .cookie(Cookie::new(env.session_cookie_name(), "not-a-jwt"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 2001);
}

#[actix_rt::test]
async fn test_unknown_account_is_403() {
    let env = setup().await;
    let app = api_app!(env);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/admin/me")
            .cookie(Cookie::new(
                env.session_cookie_name(),
                env.session_for("ouder@example.com"),
            ))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 2002);
}

#[actix_rt::test]
async fn test_viewer_row_is_403_and_editor_row_is_allowed() {
    let env = setup().await;
    let storage = env.storage();
    let user = storage
        .create_user("secretaris@talentenraad.be", None, UserRole::Viewer)
        .await
        .unwrap();
    let app = api_app!(env);

    let request = || {
        TestRequest::get()
            .uri("/api/admin/me")
            .cookie(Cookie::new(
                env.session_cookie_name(),
                env.session_for("Secretaris@Talentenraad.be"),
            ))
            .to_request()
    };

    let resp = test::call_service(&app, request()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    storage
        .update_user(&user.id, None, Some(UserRole::Editor))
        .await
        .unwrap();
    let resp = test::call_service(&app, request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["email"], "secretaris@talentenraad.be");
    assert_eq!(body["data"]["role"], "editor");
    assert_eq!(body["data"]["allowlisted"], false);
}

#[actix_rt::test]
async fn test_bearer_header_is_accepted() {
    let env = setup().await;
    let app = api_app!(env);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/admin/me")
            .insert_header(("Authorization", format!("Bearer {}", env.admin_session())))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["email"], ADMIN_EMAIL);
    assert_eq!(body["data"]["allowlisted"], true);
}

// =============================================================================
// Content
// =============================================================================

#[actix_rt::test]
async fn test_public_listing_hides_drafts_admin_listing_shows_them() {
    let env = setup().await;
    env.content.insert(news("n1", "Schoolfeest"));
    env.content
        .insert(entry("nieuws", "n2", "Concept", false, json!({ "title": "Concept" })));
    let app = api_app!(env);

    let resp = test::call_service(&app, TestRequest::get().uri("/api/content/nieuws").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let resp = test::call_service(
        &app,
        admin_req!(env, TestRequest::get().uri("/api/admin/content/nieuws")).to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[actix_rt::test]
async fn test_unknown_model_is_404() {
    let env = setup().await;
    let app = api_app!(env);

    let resp = test::call_service(&app, TestRequest::get().uri("/api/content/secrets").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 3001);

    let resp = test::call_service(
        &app,
        admin_req!(env, TestRequest::delete().uri("/api/admin/content/secrets/x")).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_edit_mode_save_merges_fields_and_audits() {
    let env = setup().await;
    env.content.insert(news("n1", "Schoolfeest"));
    let app = api_app!(env);

    let resp = test::call_service(
        &app,
        admin_req!(
            env,
            TestRequest::post()
                .uri("/api/admin/content/nieuws/n1")
                .set_json(json!({ "model": "nieuws", "data": { "title": "Groot schoolfeest" } }))
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = env.content.get("nieuws", "n1").await.unwrap().unwrap();
    assert_eq!(stored.data["title"], "Groot schoolfeest");
    // fields left out of the save stay unchanged
    assert_eq!(stored.data["summary"], "Kort");

    let log = env
        .storage()
        .list_audit_logs(&AuditFilter::default(), 1, 20)
        .await
        .unwrap();
    assert_eq!(log.total, 1);
    assert_eq!(log.items[0].action, "content.update");
    assert_eq!(log.items[0].resource_id.as_deref(), Some("n1"));
    assert_eq!(log.items[0].details.as_ref().unwrap()["fields"], json!(["title"]));
}

#[actix_rt::test]
async fn test_edit_mode_save_rejects_mismatched_model() {
    let env = setup().await;
    env.content.insert(news("n1", "Schoolfeest"));
    let app = api_app!(env);

    let resp = test::call_service(
        &app,
        admin_req!(
            env,
            TestRequest::post()
                .uri("/api/admin/content/nieuws/n1")
                .set_json(json!({ "model": "page", "data": { "title": "x" } }))
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        admin_req!(
            env,
            TestRequest::post()
                .uri("/api/admin/content/nieuws/missing")
                .set_json(json!({ "data": { "title": "x" } }))
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 3000);
}

#[actix_rt::test]
async fn test_create_replace_delete_content() {
    let env = setup().await;
    let app = api_app!(env);

    let resp = test::call_service(
        &app,
        admin_req!(
            env,
            TestRequest::post()
                .uri("/api/admin/content/aankondiging")
                .set_json(json!({
                    "name": "Inschrijvingen",
                    "data": { "message": "Inschrijvingen open", "kind": "info" },
                    "published": true
                }))
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let resp = test::call_service(
        &app,
        admin_req!(
            env,
            TestRequest::put()
                .uri(&format!("/api/admin/content/aankondiging/{}", id))
                .set_json(json!({ "data": { "message": "Gesloten" } }))
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let stored = env.content.get("aankondiging", &id).await.unwrap().unwrap();
    assert_eq!(stored.data, json!({ "message": "Gesloten" }));

    let resp = test::call_service(
        &app,
        admin_req!(
            env,
            TestRequest::delete().uri(&format!("/api/admin/content/aankondiging/{}", id))
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(env.content.get("aankondiging", &id).await.unwrap().is_none());

    let actions: Vec<String> = env
        .storage()
        .list_audit_logs(&AuditFilter::default(), 1, 20)
        .await
        .unwrap()
        .items
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert!(actions.contains(&"content.create".to_string()));
    assert!(actions.contains(&"content.replace".to_string()));
    assert!(actions.contains(&"content.delete".to_string()));
}

// =============================================================================
// Users
// =============================================================================

#[actix_rt::test]
async fn test_user_management() {
    let env = setup().await;
    let app = api_app!(env);

    let resp = test::call_service(
        &app,
        admin_req!(
            env,
            TestRequest::post()
                .uri("/api/admin/users")
                .set_json(json!({ "email": "Penning@Talentenraad.be", "name": "Jan", "role": "editor" }))
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["email"], "penning@talentenraad.be");

    let resp = test::call_service(
        &app,
        admin_req!(
            env,
            TestRequest::post()
                .uri("/api/admin/users")
                .set_json(json!({ "email": "x@talentenraad.be", "role": "owner" }))
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        admin_req!(
            env,
            TestRequest::put()
                .uri(&format!("/api/admin/users/{}", id))
                .set_json(json!({ "role": "viewer" }))
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["role"], "viewer");

    let resp = test::call_service(
        &app,
        admin_req!(env, TestRequest::get().uri("/api/admin/users")).to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let resp = test::call_service(
        &app,
        admin_req!(env, TestRequest::delete().uri(&format!("/api/admin/users/{}", id))).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(env.storage().list_users().await.unwrap().is_empty());
}

// =============================================================================
// Settings & audit log
// =============================================================================

#[actix_rt::test]
async fn test_settings_update_is_public_and_audited() {
    let env = setup().await;
    let app = api_app!(env);

    let resp = test::call_service(
        &app,
        admin_req!(
            env,
            TestRequest::put()
                .uri("/api/admin/settings/feature.clap_button")
                .set_json(json!({ "value": true }))
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        admin_req!(
            env,
            TestRequest::put()
                .uri("/api/admin/settings/feature.newsletter")
                .set_json(json!({ "value": "yes" }))
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        admin_req!(
            env,
            TestRequest::put()
                .uri("/api/admin/settings/decorations")
                .set_json(json!({ "value": { "enabled": true, "season": "christmas" } }))
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, TestRequest::get().uri("/api/settings/public").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["features"]["clap_button"], true);
    assert!(body["data"]["features"].get("newsletter").is_none());
    assert_eq!(body["data"]["decorations"]["enabled"], true);
    assert_eq!(body["data"]["decorations"]["season"], "christmas");
    assert_eq!(body["data"]["decorations"]["automatic"], false);

    let resp = test::call_service(
        &app,
        admin_req!(
            env,
            TestRequest::get().uri("/api/admin/audit-logs?resourceType=setting")
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["items"][0]["actorEmail"], ADMIN_EMAIL);
}
