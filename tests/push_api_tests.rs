//! Push subscription and broadcast integration tests

mod common;

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use serde_json::{Value, json};

use common::{ADMIN_EMAIL, setup, setup_with, test_config};

fn subscription(endpoint: &str) -> Value {
    json!({ "endpoint": endpoint, "keys": { "p256dh": "BNcRdreALRFXTkOOUHK1EtK2wtaz5Ry4YfYCA", "auth": "tBHItJI5svbpez7KI4CCXg" } })
}

#[actix_rt::test]
async fn test_subscribe_unsubscribe() {
    let env = setup().await;
    let app = api_app!(env);
    let endpoint = "https://fcm.googleapis.com/fcm/send/abc";

    for _ in 0..2 {
        // upsert: subscribing twice keeps one row
        let resp = test::call_service(
            &app,
            TestRequest::post()
                .uri("/api/push/subscribe")
                .insert_header(("User-Agent", "Mozilla/5.0 (test)"))
                .set_json(subscription(endpoint))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    let subs = env.storage().list_push_subscriptions().await.unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].user_agent.as_deref(), Some("Mozilla/5.0 (test)"));

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/push/subscribe")
            .set_json(subscription("ftp://example.com/x"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/push/unsubscribe")
            .set_json(json!({ "endpoint": endpoint }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(env.storage().list_push_subscriptions().await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_broadcast_delivers_and_prunes_gone_subscriptions() {
    let env = setup().await;
    let storage = env.storage();
    for endpoint in [
        "https://push.example.com/a",
        "https://push.example.com/b",
        "https://push.example.com/gone",
    ] {
        storage
            .upsert_push_subscription(endpoint, "p256dh", "auth", None)
            .await
            .unwrap();
    }
    env.gateway
        .gone
        .lock()
        .insert("https://push.example.com/gone".to_string());
    let app = api_app!(env);

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/admin/notifications")
            .cookie(Cookie::new(env.session_cookie_name(), env.admin_session()))
            .set_json(json!({ "title": "Schoolfeest", "body": "Zaterdag vanaf 14u", "url": "/activiteiten" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["sent"], 2);
    assert_eq!(body["data"]["removed"], 1);
    assert_eq!(body["data"]["notification"]["sentCount"], 2);

    assert_eq!(env.gateway.delivered.lock().len(), 2);
    assert_eq!(storage.list_push_subscriptions().await.unwrap().len(), 2);

    // the service worker reads the latest notification
    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/api/notifications/latest").to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["title"], "Schoolfeest");
    assert_eq!(body["data"]["url"], "/activiteiten");
    assert_eq!(body["data"]["sentBy"], ADMIN_EMAIL);

    let resp = test::call_service(
        &app,
        TestRequest::get()
            .uri("/api/admin/notifications?limit=5")
            .cookie(Cookie::new(env.session_cookie_name(), env.admin_session()))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[actix_rt::test]
async fn test_push_disabled_without_vapid_keys() {
    let env = setup_with(test_config(), false).await;
    let app = api_app!(env);

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/api/push/vapid-public-key").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let resp = test::call_service(
        &app,
        TestRequest::post()
            .uri("/api/admin/notifications")
            .cookie(Cookie::new(env.session_cookie_name(), env.admin_session()))
            .set_json(json!({ "title": "t", "body": "b" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 6000);
}

#[actix_rt::test]
async fn test_latest_is_null_before_any_broadcast() {
    let env = setup().await;
    let app = api_app!(env);

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/api/notifications/latest").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["data"].is_null());
}
