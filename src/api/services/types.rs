//! API request and response types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Common response envelope
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

// ---- claps ----

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ClapQuery {
    pub content_id: String,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ClapRequest {
    pub content_id: String,
    pub content_type: String,
    #[serde(default = "default_clap_count")]
    pub count: u32,
}

fn default_clap_count() -> u32 {
    1
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct LimitQuery {
    pub limit: Option<u64>,
}

// ---- push / notifications ----

#[derive(Deserialize, Clone, Debug)]
pub struct PushKeys {
    pub p256dh: String,
    pub auth: String,
}

/// `PushSubscription.toJSON()` as sent by the browser
#[derive(Deserialize, Clone, Debug)]
pub struct PushSubscribeRequest {
    pub endpoint: String,
    pub keys: PushKeys,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PushUnsubscribeRequest {
    pub endpoint: String,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VapidKeyResponse {
    pub public_key: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct BroadcastRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub url: Option<String>,
}

// ---- submissions ----

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub kind: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
    #[serde(default)]
    pub recaptcha_token: Option<String>,
    /// Form specific extras (e.g. the activity a volunteer signs up for)
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionListQuery {
    pub status: Option<String>,
    pub kind: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SubmissionStatusUpdate {
    pub status: String,
}

// ---- users / audit ----

#[derive(Deserialize, Clone, Debug)]
pub struct NewUserRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub role: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub actor: Option<String>,
    pub resource_type: Option<String>,
}

// ---- settings / data ----

#[derive(Deserialize, Clone, Debug)]
pub struct SettingUpdate {
    pub value: Value,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ImportQuery {
    pub mode: Option<String>,
}

// ---- content ----

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContentListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    /// Exact match on `data.url` (pages)
    pub url: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ContentCreateRequest {
    pub name: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub published: bool,
}

/// Edit-mode save: changed fields of one content item
#[derive(Deserialize, Clone, Debug)]
pub struct ContentSaveRequest {
    #[serde(default)]
    pub model: Option<String>,
    pub data: Map<String, Value>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ContentReplaceRequest {
    pub data: Map<String, Value>,
}
