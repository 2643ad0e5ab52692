//! Storage layer tests against a temporary SQLite database

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use talentenraad::claps::ClapService;
use talentenraad::errors::TalentenraadError;
use talentenraad::settings::{Season, SiteSettings};
use talentenraad::storage::{
    AuditFilter, NewAuditEntry, NewSubmission, SeaOrmStorage, SubmissionFilter, SubmissionKind,
    SubmissionStatus, UserRole,
};

async fn create_storage() -> (TempDir, Arc<SeaOrmStorage>) {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("storage.db").display());
    let storage = SeaOrmStorage::new(&url, "sqlite").await.unwrap();
    (dir, Arc::new(storage))
}

#[tokio::test]
async fn test_record_claps_respects_ceiling() {
    let (_dir, storage) = create_storage().await;

    let first = storage
        .record_claps("s1", "nieuws-1", "nieuws", 8, 10)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.session_claps, 8);
    assert_eq!(first.total, 8);

    // nothing is written once the cap is reached
    assert!(
        storage
            .record_claps("s1", "nieuws-1", "nieuws", 3, 10)
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(storage.session_claps("s1", "nieuws-1").await.unwrap(), 8);
    assert_eq!(storage.content_total("nieuws-1").await.unwrap(), 8);

    let other = storage
        .record_claps("s2", "nieuws-1", "nieuws", 2, 10)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(other.session_claps, 2);
    assert_eq!(other.total, 10);
}

#[tokio::test]
async fn test_clap_service_clamps_to_remaining() {
    let (_dir, storage) = create_storage().await;
    let claps = ClapService::new(storage.clone(), 5);

    let status = claps.add_claps("s1", "page-home", "page", 3).await.unwrap();
    assert_eq!(status.remaining, 2);

    // 2 left: asking for 10 records 2
    let status = claps.add_claps("s1", "page-home", "page", 10).await.unwrap();
    assert_eq!(status.session_claps, 5);
    assert_eq!(status.total, 5);
    assert_eq!(status.remaining, 0);

    let err = claps.add_claps("s1", "page-home", "page", 1).await.unwrap_err();
    assert!(matches!(err, TalentenraadError::ClapLimit(_)));

    let top = claps.top_content(10).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].content_id, "page-home");
    assert_eq!(top[0].total_claps, 5);
}

#[tokio::test]
async fn test_concurrent_claps_never_exceed_ceiling() {
    let (_dir, storage) = create_storage().await;
    let claps = Arc::new(ClapService::new(storage.clone(), 10));

    let mut handles = Vec::new();
    for _ in 0..20 {
        let claps = claps.clone();
        handles.push(tokio::spawn(async move {
            claps.add_claps("same-session", "activiteit-1", "activiteit", 1).await
        }));
    }
    for h in handles {
        let _ = h.await.unwrap();
    }

    assert!(storage.session_claps("same-session", "activiteit-1").await.unwrap() <= 10);
    assert_eq!(
        storage.content_total("activiteit-1").await.unwrap(),
        storage.session_claps("same-session", "activiteit-1").await.unwrap() as i64
    );
}

#[tokio::test]
async fn test_users_crud_and_login_stamp() {
    let (_dir, storage) = create_storage().await;

    let user = storage
        .create_user(" Voorzitter@Talentenraad.be ", Some("An".into()), UserRole::Admin)
        .await
        .unwrap();
    assert_eq!(user.email, "voorzitter@talentenraad.be");
    assert!(user.last_login_at.is_none());

    assert!(
        storage
            .create_user("voorzitter@talentenraad.be", None, UserRole::Editor)
            .await
            .is_err()
    );

    storage
        .touch_user_login("VOORZITTER@talentenraad.be")
        .await
        .unwrap();
    let found = storage
        .find_user_by_email("voorzitter@talentenraad.be")
        .await
        .unwrap()
        .unwrap();
    assert!(found.last_login_at.is_some());

    let updated = storage
        .update_user(&user.id, None, Some(UserRole::Viewer))
        .await
        .unwrap();
    assert_eq!(updated.role, UserRole::Viewer);
    assert_eq!(updated.name.as_deref(), Some("An"));

    storage.delete_user(&user.id).await.unwrap();
    assert!(storage.find_user(&user.id).await.unwrap().is_none());
    assert!(matches!(
        storage.delete_user(&user.id).await,
        Err(TalentenraadError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_submission_filters_and_pagination() {
    let (_dir, storage) = create_storage().await;
    for i in 0..5 {
        storage
            .insert_submission(NewSubmission {
                kind: if i % 2 == 0 {
                    SubmissionKind::Contact
                } else {
                    SubmissionKind::Feedback
                },
                name: format!("Ouder {}", i),
                email: format!("ouder{}@example.com", i),
                subject: None,
                message: "Bericht".into(),
                metadata: None,
            })
            .await
            .unwrap();
    }

    let page = storage
        .list_submissions(&SubmissionFilter::default(), 1, 2)
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total_pages(), 3);

    let contact = SubmissionFilter {
        kind: Some(SubmissionKind::Contact),
        ..Default::default()
    };
    assert_eq!(storage.all_submissions(&contact).await.unwrap().len(), 3);

    let id = page.items[0].id;
    storage
        .update_submission_status(id, SubmissionStatus::Archived)
        .await
        .unwrap();
    assert_eq!(
        storage
            .count_submissions(Some(SubmissionStatus::Archived))
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        storage
            .count_submissions(Some(SubmissionStatus::New))
            .await
            .unwrap(),
        4
    );
}

#[tokio::test]
async fn test_audit_filter_by_actor() {
    let (_dir, storage) = create_storage().await;
    storage
        .record_audit(NewAuditEntry::new("a@talentenraad.be", "user.create", "user").resource("1"))
        .await
        .unwrap();
    storage
        .record_audit(NewAuditEntry::new("b@talentenraad.be", "settings.update", "setting"))
        .await
        .unwrap();

    let filter = AuditFilter {
        actor: Some("a@talentenraad.be".into()),
        resource_type: None,
    };
    let log = storage.list_audit_logs(&filter, 1, 20).await.unwrap();
    assert_eq!(log.total, 1);
    assert_eq!(log.items[0].action, "user.create");
}

#[tokio::test]
async fn test_site_settings_survive_reload() {
    let (_dir, storage) = create_storage().await;

    let settings = SiteSettings::load(storage.clone()).await.unwrap();
    settings
        .set(
            "decorations",
            json!({ "enabled": true, "season": "sinterklaas" }),
            "admin@talentenraad.be",
        )
        .await
        .unwrap();
    settings
        .set("feature.push", json!(false), "admin@talentenraad.be")
        .await
        .unwrap();
    assert!(settings.set("Bad Key", json!(1), "x").await.is_err());

    let reloaded = SiteSettings::load(storage.clone()).await.unwrap();
    let today = chrono::NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
    let decorations = reloaded.decorations(today);
    assert!(decorations.enabled);
    assert_eq!(decorations.season, Season::Sinterklaas);
    assert!(!reloaded.feature_enabled("push"));
    assert_eq!(reloaded.features().get("push"), Some(&false));
}
