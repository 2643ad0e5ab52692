//! Client side clap debouncing
//!
//! Claps are applied optimistically and sent in one request once the user
//! stops clicking for `debounce`. A failed request rolls the optimistic
//! increments of that batch back.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::ClapStatus;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Sends a batch of claps to the server
#[async_trait]
pub trait ClapTransport: Send + Sync {
    async fn send(&self, content_id: &str, count: u32) -> anyhow::Result<ClapStatus>;
}

struct BatchState {
    status: ClapStatus,
    pending: u32,
}

struct Inner {
    content_id: String,
    transport: Arc<dyn ClapTransport>,
    debounce: Duration,
    state: Mutex<BatchState>,
    notify: Notify,
    closed: AtomicBool,
    flush_lock: tokio::sync::Mutex<()>,
}

impl Inner {
    async fn flush(&self) -> anyhow::Result<ClapStatus> {
        let _guard = self.flush_lock.lock().await;

        let count = {
            let mut state = self.state.lock();
            std::mem::take(&mut state.pending)
        };
        if count == 0 {
            return Ok(self.state.lock().status.clone());
        }

        match self.transport.send(&self.content_id, count).await {
            Ok(server) => {
                let mut state = self.state.lock();
                // claps made while the request was in flight stay optimistic
                let in_flight = state.pending;
                state.status = server;
                state.status.total += in_flight as i64;
                state.status.session_claps += in_flight;
                state.status.remaining = state.status.remaining.saturating_sub(in_flight);
                debug!("Flushed {} clap(s) for {}", count, self.content_id);
                Ok(state.status.clone())
            }
            Err(e) => {
                let mut state = self.state.lock();
                state.status.total -= count as i64;
                state.status.session_claps = state.status.session_claps.saturating_sub(count);
                state.status.remaining += count;
                warn!(
                    "Sending {} clap(s) for {} failed, rolled back: {}",
                    count, self.content_id, e
                );
                Err(e)
            }
        }
    }
}

/// Debounced, optimistic clap counter for one content item
pub struct ClapBatcher {
    inner: Arc<Inner>,
    worker: Option<JoinHandle<()>>,
}

impl ClapBatcher {
    /// Must be created inside a tokio runtime
    pub fn new(
        content_id: impl Into<String>,
        transport: Arc<dyn ClapTransport>,
        debounce: Duration,
        initial: ClapStatus,
    ) -> Self {
        let inner = Arc::new(Inner {
            content_id: content_id.into(),
            transport,
            debounce,
            state: Mutex::new(BatchState {
                status: initial,
                pending: 0,
            }),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            flush_lock: tokio::sync::Mutex::new(()),
        });

        let worker = tokio::spawn(run_worker(inner.clone()));
        Self {
            inner,
            worker: Some(worker),
        }
    }

    /// Register one clap; `false` when the session has no claps left
    pub fn clap(&self) -> bool {
        {
            let mut state = self.inner.state.lock();
            if state.status.remaining == 0 {
                return false;
            }
            state.status.total += 1;
            state.status.session_claps += 1;
            state.status.remaining -= 1;
            state.pending += 1;
        }
        self.inner.notify.notify_one();
        true
    }

    /// Send pending claps now
    pub async fn flush(&self) -> anyhow::Result<ClapStatus> {
        self.inner.flush().await
    }

    /// Current optimistic view
    pub fn snapshot(&self) -> ClapStatus {
        self.inner.state.lock().status.clone()
    }

    pub fn pending(&self) -> u32 {
        self.inner.state.lock().pending
    }

    /// Flush remaining claps and stop the background task
    pub async fn close(mut self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.notify.notify_one();
        if let Some(worker) = self.worker.take()
            && let Err(e) = worker.await
        {
            warn!("Clap batcher task ended abnormally: {}", e);
        }
    }
}

impl Drop for ClapBatcher {
    fn drop(&mut self) {
        // the worker performs a final flush before exiting
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.notify.notify_one();
    }
}

async fn run_worker(inner: Arc<Inner>) {
    loop {
        inner.notify.notified().await;

        // every new clap restarts the quiet period
        while !inner.closed.load(Ordering::SeqCst) {
            tokio::select! {
                _ = inner.notify.notified() => continue,
                _ = tokio::time::sleep(inner.debounce) => break,
            }
        }

        let _ = inner.flush().await;

        if inner.closed.load(Ordering::SeqCst) {
            break;
        }
    }
}

/// Posts claps to `{base_url}/api/claps`, keeping the session cookie the
/// server hands out on the first clap
pub struct HttpClapTransport {
    base_url: String,
    content_type: String,
    cookie_name: String,
    session: Mutex<Option<String>>,
}

impl HttpClapTransport {
    pub fn new(
        base_url: impl Into<String>,
        content_type: impl Into<String>,
        cookie_name: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            content_type: content_type.into(),
            cookie_name: cookie_name.into(),
            session: Mutex::new(None),
        }
    }

    pub fn with_session(self, session_id: impl Into<String>) -> Self {
        *self.session.lock() = Some(session_id.into());
        self
    }

    pub fn session_id(&self) -> Option<String> {
        self.session.lock().clone()
    }
}

/// Value of `name` in a `Set-Cookie` header
fn cookie_value(set_cookie: &str, name: &str) -> Option<String> {
    let first = set_cookie.split(';').next()?.trim();
    let (k, v) = first.split_once('=')?;
    (k.trim() == name).then(|| v.trim().to_string())
}

#[async_trait]
impl ClapTransport for HttpClapTransport {
    async fn send(&self, content_id: &str, count: u32) -> anyhow::Result<ClapStatus> {
        let url = format!("{}/api/claps", self.base_url);
        let body = json!({
            "contentId": content_id,
            "contentType": self.content_type,
            "count": count,
        });
        let cookie = self
            .session_id()
            .map(|sid| format!("{}={}", self.cookie_name, sid));
        let cookie_name = self.cookie_name.clone();

        let (status, new_session) = crate::http::blocking(move || {
            let mut request = crate::http::agent().post(&url);
            if let Some(cookie) = &cookie {
                request = request.header("Cookie", cookie);
            }
            let resp = request.send_json(&body)?;
            let code = resp.status().as_u16();
            let new_session = resp
                .headers()
                .get_all("set-cookie")
                .iter()
                .filter_map(|h| h.to_str().ok())
                .find_map(|h| cookie_value(h, &cookie_name));
            let envelope: serde_json::Value = resp.into_body().read_json()?;

            if !(200..300).contains(&code) {
                anyhow::bail!(
                    "clap request rejected ({}): {}",
                    code,
                    envelope["message"].as_str().unwrap_or("unknown error")
                );
            }
            let status: ClapStatus = serde_json::from_value(envelope["data"].clone())?;
            Ok((status, new_session))
        })
        .await?;

        if let Some(sid) = new_session {
            *self.session.lock() = Some(sid);
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    struct MockTransport {
        calls: AtomicU32,
        counts: Mutex<Vec<u32>>,
        fail: AtomicBool,
        server_total: Mutex<i64>,
        session: Mutex<u32>,
    }

    impl MockTransport {
        fn new(total: i64) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                counts: Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
                server_total: Mutex::new(total),
                session: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl ClapTransport for MockTransport {
        async fn send(&self, content_id: &str, count: u32) -> anyhow::Result<ClapStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.counts.lock().push(count);
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("offline");
            }
            let mut total = self.server_total.lock();
            let mut session = self.session.lock();
            *total += count as i64;
            *session += count;
            Ok(ClapStatus {
                content_id: content_id.to_string(),
                total: *total,
                session_claps: *session,
                remaining: 50 - *session,
            })
        }
    }

    fn initial(total: i64) -> ClapStatus {
        ClapStatus {
            content_id: "n1".into(),
            total,
            session_claps: 0,
            remaining: 50,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_claps_are_sent_in_one_request() {
        let transport = MockTransport::new(10);
        let batcher = ClapBatcher::new("n1", transport.clone(), DEFAULT_DEBOUNCE, initial(10));

        for _ in 0..5 {
            assert!(batcher.clap());
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(batcher.snapshot().total, 15);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*transport.counts.lock(), vec![5]);
        assert_eq!(batcher.snapshot().total, 15);
        assert_eq!(batcher.pending(), 0);
        batcher.close().await;
    }

    #[tokio::test]
    async fn test_failed_flush_rolls_back() {
        let transport = MockTransport::new(3);
        transport.fail.store(true, Ordering::SeqCst);
        let batcher = ClapBatcher::new(
            "n1",
            transport.clone(),
            Duration::from_secs(60),
            initial(3),
        );

        batcher.clap();
        batcher.clap();
        assert_eq!(batcher.snapshot().total, 5);

        assert!(batcher.flush().await.is_err());
        let snapshot = batcher.snapshot();
        assert_eq!(snapshot.total, 3);
        assert_eq!(snapshot.session_claps, 0);
        assert_eq!(snapshot.remaining, 50);
        batcher.close().await;
    }

    /// Holds every request until released, then answers like the mock
    struct GatedTransport {
        inner: Arc<MockTransport>,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ClapTransport for GatedTransport {
        async fn send(&self, content_id: &str, count: u32) -> anyhow::Result<ClapStatus> {
            self.entered.notify_one();
            self.release.notified().await;
            self.inner.send(content_id, count).await
        }
    }

    #[tokio::test]
    async fn test_claps_during_failed_request_stay_pending() {
        let mock = MockTransport::new(3);
        mock.fail.store(true, Ordering::SeqCst);
        let transport = Arc::new(GatedTransport {
            inner: mock.clone(),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let batcher = ClapBatcher::new(
            "n1",
            transport.clone(),
            Duration::from_secs(60),
            initial(3),
        );

        batcher.clap();
        batcher.clap();

        let clap_while_in_flight = async {
            transport.entered.notified().await;
            assert!(batcher.clap());
            transport.release.notify_one();
        };
        let (result, ()) = tokio::join!(batcher.flush(), clap_while_in_flight);
        assert!(result.is_err());

        // only the failed batch of two is rolled back
        let snapshot = batcher.snapshot();
        assert_eq!(snapshot.total, 4);
        assert_eq!(snapshot.session_claps, 1);
        assert_eq!(snapshot.remaining, 49);
        assert_eq!(batcher.pending(), 1);

        mock.fail.store(false, Ordering::SeqCst);
        transport.release.notify_one();
        let status = batcher.flush().await.unwrap();
        assert_eq!(*mock.counts.lock(), vec![2, 1]);
        assert_eq!(status.total, 4);
        assert_eq!(batcher.pending(), 0);
        batcher.close().await;
    }

    #[tokio::test]
    async fn test_clap_refused_at_cap() {
        let transport = MockTransport::new(0);
        let status = ClapStatus {
            content_id: "n1".into(),
            total: 100,
            session_claps: 49,
            remaining: 1,
        };
        let batcher = ClapBatcher::new("n1", transport, Duration::from_secs(60), status);
        assert!(batcher.clap());
        assert!(!batcher.clap());
        assert_eq!(batcher.snapshot().session_claps, 50);
        batcher.close().await;
    }

    #[tokio::test]
    async fn test_close_flushes_pending() {
        let transport = MockTransport::new(0);
        let batcher = ClapBatcher::new(
            "n1",
            transport.clone(),
            Duration::from_secs(60),
            initial(0),
        );
        batcher.clap();
        batcher.clap();
        batcher.clap();
        batcher.close().await;
        assert_eq!(*transport.counts.lock(), vec![3]);
    }

    #[test]
    fn test_cookie_value() {
        assert_eq!(
            cookie_value("tr_clap_session=abc-123; Path=/; HttpOnly", "tr_clap_session"),
            Some("abc-123".to_string())
        );
        assert_eq!(cookie_value("other=1; Path=/", "tr_clap_session"), None);
    }
}
