//! Domain records persisted in the relational database
//!
//! These are the shapes the services and API work with; the sea-orm entity
//! models live in the `migration` crate and are converted in
//! `backend::converters`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Role of a registered CMS user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    Admin,
    Editor,
    /// Known account without admin access
    Viewer,
}

impl UserRole {
    /// Admin and editor may use the admin API
    pub fn is_privileged(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Editor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubmissionKind {
    Contact,
    Feedback,
    Volunteer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubmissionStatus {
    New,
    Read,
    Archived,
}

/// Form submission sent from the public site
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: i64,
    pub kind: SubmissionKind,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub metadata: Option<Value>,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub kind: SubmissionKind,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub status: Option<SubmissionStatus>,
    pub kind: Option<SubmissionKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: i64,
    pub actor_email: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Audit log line to be written
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub actor_email: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub details: Option<Value>,
}

impl NewAuditEntry {
    pub fn new(
        actor_email: impl Into<String>,
        action: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            actor_email: actor_email.into(),
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: None,
            details: None,
        }
    }

    pub fn resource(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub actor: Option<String>,
    pub resource_type: Option<String>,
}

/// Browser push subscription
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscriptionRecord {
    pub id: i64,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub url: Option<String>,
    pub sent_by: String,
    pub sent_count: i32,
    pub failed_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentClapTotal {
    pub content_id: String,
    pub content_type: String,
    pub total_claps: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettingRecord {
    pub key: String,
    pub value: Value,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

/// Result of a successful clap write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClapWrite {
    pub total: i64,
    pub session_claps: i32,
}

/// One page of a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> Paginated<T> {
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            0
        } else {
            self.total.div_ceil(self.page_size)
        }
    }
}

/// Full dump of the side-state tables, used by export / import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataExport {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub submissions: Vec<Submission>,
    #[serde(default)]
    pub push_subscriptions: Vec<PushSubscriptionRecord>,
    #[serde(default)]
    pub notification_history: Vec<NotificationRecord>,
    #[serde(default)]
    pub content_claps: Vec<ContentClapTotal>,
    #[serde(default)]
    pub site_settings: Vec<SiteSettingRecord>,
}

pub const EXPORT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImportMode {
    /// Keep existing rows, only insert missing ones
    #[default]
    Skip,
    /// Replace existing rows with the imported ones
    Overwrite,
}

/// Rows inserted / overwritten / skipped for one table
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableImportCount {
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub users: TableImportCount,
    pub submissions: TableImportCount,
    pub push_subscriptions: TableImportCount,
    pub notification_history: TableImportCount,
    pub content_claps: TableImportCount,
    pub site_settings: TableImportCount,
}
