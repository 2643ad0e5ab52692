use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::ServerHandle;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::storage::SeaOrmStorage;

/// 关闭超时时间（秒）
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// 等待 Ctrl+C，然后停止服务器并关闭数据库连接池
pub async fn listen_for_shutdown(handle: ServerHandle, storage: Arc<SeaOrmStorage>) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, stopping server...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }

    // 等待进行中的请求完成
    match timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), handle.stop(true)).await {
        Ok(()) => info!("HTTP server stopped"),
        Err(_) => error!(
            "Server did not stop within {} seconds, forcing shutdown",
            SHUTDOWN_TIMEOUT_SECS
        ),
    }

    if let Err(e) = storage.get_db().clone().close().await {
        warn!("Closing database pool failed: {}", e);
    }
}
