use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::ChangeBatch;

/// Persists one content item's batch of field edits
#[async_trait]
pub trait ChangeSaver: Send + Sync {
    async fn save(&self, batch: &ChangeBatch) -> anyhow::Result<()>;
}

/// Saves through the admin API: `POST /api/admin/content/{model}/{id}`
pub struct HttpChangeSaver {
    base_url: String,
    cookie_name: String,
    session_token: String,
}

impl HttpChangeSaver {
    pub fn new(
        base_url: impl Into<String>,
        cookie_name: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cookie_name: cookie_name.into(),
            session_token: session_token.into(),
        }
    }

    pub fn endpoint(&self, batch: &ChangeBatch) -> String {
        format!(
            "{}/api/admin/content/{}/{}",
            self.base_url,
            urlencoding::encode(&batch.model),
            urlencoding::encode(&batch.content_id)
        )
    }
}

#[async_trait]
impl ChangeSaver for HttpChangeSaver {
    async fn save(&self, batch: &ChangeBatch) -> anyhow::Result<()> {
        let url = self.endpoint(batch);
        let cookie = format!("{}={}", self.cookie_name, self.session_token);
        let body = json!({ "model": batch.model, "data": batch.fields });

        debug!("Saving {} field(s) to {}", batch.fields.len(), url);
        crate::http::blocking(move || {
            let resp = crate::http::agent()
                .post(&url)
                .header("Cookie", &cookie)
                .send_json(&body)?;
            let status = resp.status().as_u16();
            if (200..300).contains(&status) {
                Ok(())
            } else {
                let text = resp.into_body().read_to_string().unwrap_or_default();
                Err(anyhow::anyhow!("save to {} failed with {}: {}", url, status, text))
            }
        })
        .await
    }
}
