use std::sync::Arc;

use tracing::debug;

use super::{ClapStatus, allowed_claps};
use crate::errors::{Result, TalentenraadError};
use crate::storage::{ContentClapTotal, SeaOrmStorage};

const MAX_ID_LEN: usize = 128;
const MAX_TYPE_LEN: usize = 64;

/// Server side clap bookkeeping
pub struct ClapService {
    storage: Arc<SeaOrmStorage>,
    max_per_session: u32,
}

impl ClapService {
    pub fn new(storage: Arc<SeaOrmStorage>, max_per_session: u32) -> Self {
        Self {
            storage,
            max_per_session: max_per_session.max(1),
        }
    }

    pub fn max_per_session(&self) -> u32 {
        self.max_per_session
    }

    fn validate(content_id: &str, content_type: &str) -> Result<()> {
        if content_id.trim().is_empty() || content_id.len() > MAX_ID_LEN {
            return Err(TalentenraadError::validation(
                "contentId is required (max 128 characters)".to_string(),
            ));
        }
        if content_type.trim().is_empty() || content_type.len() > MAX_TYPE_LEN {
            return Err(TalentenraadError::validation(
                "contentType is required (max 64 characters)".to_string(),
            ));
        }
        Ok(())
    }

    fn status(&self, content_id: &str, total: i64, session_claps: u32) -> ClapStatus {
        ClapStatus {
            content_id: content_id.to_string(),
            total,
            session_claps,
            remaining: self.max_per_session.saturating_sub(session_claps),
        }
    }

    /// Add up to `requested` claps for the session
    ///
    /// Returns `ClapLimit` when the session has no claps left for this item.
    pub async fn add_claps(
        &self,
        session_id: &str,
        content_id: &str,
        content_type: &str,
        requested: u32,
    ) -> Result<ClapStatus> {
        Self::validate(content_id, content_type)?;
        let requested = requested.clamp(1, self.max_per_session);

        let current = self.storage.session_claps(session_id, content_id).await?;
        let allowed = allowed_claps(requested, current.max(0) as u32, self.max_per_session);
        if allowed == 0 {
            return Err(self.limit_error(content_id, current).await);
        }

        let written = self
            .storage
            .record_claps(
                session_id,
                content_id,
                content_type,
                allowed as i32,
                self.max_per_session as i32,
            )
            .await?;

        match written {
            Some(w) => {
                debug!(
                    "Session added {} clap(s) to {} ({} requested)",
                    allowed, content_id, requested
                );
                Ok(self.status(content_id, w.total, w.session_claps.max(0) as u32))
            }
            // a concurrent request used up the remaining claps
            None => {
                let current = self.storage.session_claps(session_id, content_id).await?;
                Err(self.limit_error(content_id, current).await)
            }
        }
    }

    async fn limit_error(&self, content_id: &str, session_claps: i32) -> TalentenraadError {
        let total = self.storage.content_total(content_id).await.unwrap_or(0);
        TalentenraadError::clap_limit(format!(
            "Maximum of {} claps reached for {} (session {}, total {})",
            self.max_per_session, content_id, session_claps, total
        ))
    }

    /// Totals without writing; without a session only the public total is known
    pub async fn get_status(&self, session_id: Option<&str>, content_id: &str) -> Result<ClapStatus> {
        if content_id.trim().is_empty() {
            return Err(TalentenraadError::validation(
                "contentId is required".to_string(),
            ));
        }
        let total = self.storage.content_total(content_id).await?;
        let session_claps = match session_id {
            Some(sid) => self.storage.session_claps(sid, content_id).await?.max(0) as u32,
            None => 0,
        };
        Ok(self.status(content_id, total, session_claps))
    }

    pub async fn top_content(&self, limit: u64) -> Result<Vec<ContentClapTotal>> {
        self.storage.top_claps(limit).await
    }
}
