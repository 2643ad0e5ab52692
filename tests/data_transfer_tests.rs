//! Data export / import tests (admin API and storage)

mod common;

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use serde_json::{Value, json};

use common::setup;
use talentenraad::storage::{
    DataExport, ImportMode, NewSubmission, SubmissionKind, UserRole,
};

async fn seed(env: &common::TestEnv) {
    let storage = env.storage();
    storage
        .create_user("penning@talentenraad.be", Some("Jan".into()), UserRole::Editor)
        .await
        .unwrap();
    storage
        .insert_submission(NewSubmission {
            kind: SubmissionKind::Volunteer,
            name: "Els".into(),
            email: "els@example.com".into(),
            subject: None,
            message: "Ik help mee aan de bar".into(),
            metadata: Some(json!({ "activity": "schoolfeest" })),
        })
        .await
        .unwrap();
    storage
        .record_claps("session-1", "nieuws-1", "nieuws", 4, 50)
        .await
        .unwrap();
    env.state
        .settings
        .set("feature.calendar", json!(true), "test")
        .await
        .unwrap();
}

#[actix_rt::test]
async fn test_export_then_import_into_empty_database() {
    let source = setup().await;
    seed(&source).await;
    let app = api_app!(source);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/admin/data/export")
            .cookie(Cookie::new(source.session_cookie_name(), source.admin_session()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()
            .get("Content-Disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("talentenraad_export_")
    );
    let doc: DataExport = test::read_body_json(resp).await;
    assert_eq!(doc.users.len(), 1);
    assert_eq!(doc.submissions.len(), 1);
    assert_eq!(doc.content_claps.len(), 1);
    assert_eq!(doc.site_settings.len(), 1);

    let target = setup().await;
    let app = api_app!(target);
    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/admin/data/import?mode=skip")
            .cookie(Cookie::new(target.session_cookie_name(), target.admin_session()))
            .set_json(&doc)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["users"]["inserted"], 1);
    assert_eq!(body["data"]["submissions"]["inserted"], 1);

    let storage = target.storage();
    assert_eq!(storage.list_users().await.unwrap().len(), 1);
    assert_eq!(storage.content_total("nieuws-1").await.unwrap(), 4);
    // settings cache is reloaded after the import
    assert!(target.state.settings.feature_enabled("calendar"));
}

#[actix_rt::test]
async fn test_import_skip_and_overwrite() {
    let env = setup().await;
    seed(&env).await;
    let storage = env.storage();

    let mut doc = storage.export_data().await.unwrap();
    doc.users[0].name = Some("Jan Janssens".into());

    let summary = storage.import_data(&doc, ImportMode::Skip).await.unwrap();
    assert_eq!(summary.users.skipped, 1);
    assert_eq!(
        storage.list_users().await.unwrap()[0].name.as_deref(),
        Some("Jan")
    );

    let summary = storage.import_data(&doc, ImportMode::Overwrite).await.unwrap();
    assert_eq!(summary.users.updated, 1);
    assert_eq!(
        storage.list_users().await.unwrap()[0].name.as_deref(),
        Some("Jan Janssens")
    );
}

#[actix_rt::test]
async fn test_unknown_import_mode_is_rejected() {
    let env = setup().await;
    let app = api_app!(env);
    let doc = env.storage().export_data().await.unwrap();

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/admin/data/import?mode=merge")
            .cookie(Cookie::new(env.session_cookie_name(), env.admin_session()))
            .set_json(&doc)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 4000);
}
