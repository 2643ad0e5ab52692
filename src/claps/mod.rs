//! Clap counter
//!
//! Visitors can "clap" for a news item or activity. The server caps the
//! claps of one browser session per content item; the client side batches
//! rapid clicks into a single request.

mod batcher;
mod service;

use serde::{Deserialize, Serialize};

pub use batcher::{ClapBatcher, ClapTransport, DEFAULT_DEBOUNCE, HttpClapTransport};
pub use service::ClapService;

/// Default ceiling of claps per session per content item
pub const MAX_CLAPS_PER_SESSION: u32 = 50;

/// Clap totals as seen by one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClapStatus {
    pub content_id: String,
    pub total: i64,
    pub session_claps: u32,
    pub remaining: u32,
}

impl ClapStatus {
    pub fn empty(content_id: impl Into<String>, max: u32) -> Self {
        Self {
            content_id: content_id.into(),
            total: 0,
            session_claps: 0,
            remaining: max,
        }
    }
}

/// How many of `requested` claps may still be given
pub fn allowed_claps(requested: u32, current: u32, max: u32) -> u32 {
    requested.min(max.saturating_sub(current))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_claps() {
        assert_eq!(allowed_claps(5, 0, 50), 5);
        assert_eq!(allowed_claps(5, 48, 50), 2);
        assert_eq!(allowed_claps(5, 50, 50), 0);
        assert_eq!(allowed_claps(1, 60, 50), 0);
        assert_eq!(allowed_claps(0, 10, 50), 0);
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let json = serde_json::to_value(ClapStatus::empty("n1", 50)).unwrap();
        assert_eq!(json["contentId"], "n1");
        assert_eq!(json["sessionClaps"], 0);
        assert_eq!(json["remaining"], 50);
    }
}
