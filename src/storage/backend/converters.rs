//! Entity model <-> domain record conversion

use sea_orm::ActiveValue::{NotSet, Set};
use serde_json::Value;
use tracing::warn;

use crate::storage::models::{
    AuditEntry, ContentClapTotal, NotificationRecord, PushSubscriptionRecord, SiteSettingRecord,
    Submission, SubmissionKind, SubmissionStatus, User, UserRole,
};
use migration::entities::{
    audit_log, content_clap, notification_history, push_subscription, site_setting, submission,
    user,
};

fn parse_json_column(column: &str, raw: Option<String>) -> Option<Value> {
    let raw = raw?;
    match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Stored {} is not valid JSON, keeping as string: {}", column, e);
            Some(Value::String(raw))
        }
    }
}

pub fn json_to_column(value: &Option<Value>) -> Option<String> {
    value.as_ref().map(|v| v.to_string())
}

pub fn model_to_user(model: user::Model) -> User {
    User {
        role: model.role.parse().unwrap_or(UserRole::Viewer),
        id: model.id,
        email: model.email,
        name: model.name,
        created_at: model.created_at,
        last_login_at: model.last_login_at,
    }
}

pub fn user_to_active_model(user: &User) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(user.id.clone()),
        email: Set(user.email.clone()),
        name: Set(user.name.clone()),
        role: Set(user.role.to_string()),
        created_at: Set(user.created_at),
        last_login_at: Set(user.last_login_at),
    }
}

pub fn model_to_submission(model: submission::Model) -> Submission {
    Submission {
        id: model.id,
        kind: model.kind.parse().unwrap_or(SubmissionKind::Contact),
        name: model.name,
        email: model.email,
        subject: model.subject,
        message: model.message,
        metadata: parse_json_column("submission metadata", model.metadata),
        status: model.status.parse().unwrap_or(SubmissionStatus::New),
        created_at: model.created_at,
    }
}

/// `keep_id == false` lets the database assign a fresh id
pub fn submission_to_active_model(s: &Submission, keep_id: bool) -> submission::ActiveModel {
    submission::ActiveModel {
        id: if keep_id { Set(s.id) } else { NotSet },
        kind: Set(s.kind.to_string()),
        name: Set(s.name.clone()),
        email: Set(s.email.clone()),
        subject: Set(s.subject.clone()),
        message: Set(s.message.clone()),
        metadata: Set(json_to_column(&s.metadata)),
        status: Set(s.status.to_string()),
        created_at: Set(s.created_at),
    }
}

pub fn model_to_audit(model: audit_log::Model) -> AuditEntry {
    AuditEntry {
        id: model.id,
        actor_email: model.actor_email,
        action: model.action,
        resource_type: model.resource_type,
        resource_id: model.resource_id,
        details: parse_json_column("audit details", model.details),
        created_at: model.created_at,
    }
}

pub fn model_to_push_subscription(model: push_subscription::Model) -> PushSubscriptionRecord {
    PushSubscriptionRecord {
        id: model.id,
        endpoint: model.endpoint,
        p256dh: model.p256dh,
        auth: model.auth,
        user_agent: model.user_agent,
        created_at: model.created_at,
        last_used_at: model.last_used_at,
    }
}

pub fn push_subscription_to_active_model(
    s: &PushSubscriptionRecord,
) -> push_subscription::ActiveModel {
    push_subscription::ActiveModel {
        id: NotSet,
        endpoint: Set(s.endpoint.clone()),
        p256dh: Set(s.p256dh.clone()),
        auth: Set(s.auth.clone()),
        user_agent: Set(s.user_agent.clone()),
        created_at: Set(s.created_at),
        last_used_at: Set(s.last_used_at),
    }
}

pub fn model_to_notification(model: notification_history::Model) -> NotificationRecord {
    NotificationRecord {
        id: model.id,
        title: model.title,
        body: model.body,
        url: model.url,
        sent_by: model.sent_by,
        sent_count: model.sent_count,
        failed_count: model.failed_count,
        created_at: model.created_at,
    }
}

pub fn notification_to_active_model(
    n: &NotificationRecord,
    keep_id: bool,
) -> notification_history::ActiveModel {
    notification_history::ActiveModel {
        id: if keep_id { Set(n.id) } else { NotSet },
        title: Set(n.title.clone()),
        body: Set(n.body.clone()),
        url: Set(n.url.clone()),
        sent_by: Set(n.sent_by.clone()),
        sent_count: Set(n.sent_count),
        failed_count: Set(n.failed_count),
        created_at: Set(n.created_at),
    }
}

pub fn model_to_content_clap(model: content_clap::Model) -> ContentClapTotal {
    ContentClapTotal {
        content_id: model.content_id,
        content_type: model.content_type,
        total_claps: model.total_claps,
        updated_at: model.updated_at,
    }
}

pub fn content_clap_to_active_model(c: &ContentClapTotal) -> content_clap::ActiveModel {
    content_clap::ActiveModel {
        content_id: Set(c.content_id.clone()),
        content_type: Set(c.content_type.clone()),
        total_claps: Set(c.total_claps),
        updated_at: Set(c.updated_at),
    }
}

pub fn model_to_setting(model: site_setting::Model) -> SiteSettingRecord {
    SiteSettingRecord {
        value: parse_json_column("site setting", Some(model.value)).unwrap_or(Value::Null),
        key: model.key,
        updated_at: model.updated_at,
        updated_by: model.updated_by,
    }
}

pub fn setting_to_active_model(s: &SiteSettingRecord) -> site_setting::ActiveModel {
    site_setting::ActiveModel {
        key: Set(s.key.clone()),
        value: Set(s.value.to_string()),
        updated_at: Set(s.updated_at),
        updated_by: Set(s.updated_by.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_unknown_role_is_not_privileged() {
        let user = model_to_user(user::Model {
            id: "u1".into(),
            email: "a@b.be".into(),
            name: None,
            role: "superuser".into(),
            created_at: Utc::now(),
            last_login_at: None,
        });
        assert_eq!(user.role, UserRole::Viewer);
    }

    #[test]
    fn test_invalid_json_metadata_is_preserved_as_string() {
        let s = model_to_submission(submission::Model {
            id: 1,
            kind: "feedback".into(),
            name: "An".into(),
            email: "an@example.com".into(),
            subject: None,
            message: "Top!".into(),
            metadata: Some("{not json".into()),
            status: "read".into(),
            created_at: Utc::now(),
        });
        assert_eq!(s.kind, SubmissionKind::Feedback);
        assert_eq!(s.status, SubmissionStatus::Read);
        assert_eq!(s.metadata, Some(Value::String("{not json".into())));
    }
}
