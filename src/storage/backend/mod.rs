//! SeaORM storage backend
//!
//! Persistence for every side-state table of the site (users, submissions,
//! audit logs, push subscriptions, notification history, claps, settings),
//! on SQLite, MySQL/MariaDB or PostgreSQL.

mod audit;
mod claps;
mod connection;
mod converters;
mod notifications;
mod push;
mod settings;
mod submissions;
mod transfer;
mod users;
pub mod retry;

use sea_orm::DatabaseConnection;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::{Result, TalentenraadError};

pub use connection::{connect_generic, connect_sqlite, run_migrations};

/// Infer the database kind from its URL
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(TalentenraadError::database_config(format!(
            "Cannot infer database type from URL: {}. Supported: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// Clamp user supplied paging parameters
pub(crate) fn normalize_page(page: u64, page_size: u64) -> (u64, u64) {
    (page.max(1), page_size.clamp(1, 200))
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    /// Connect and run migrations
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        Self::with_config(database_url, backend_name, &DatabaseConfig::default()).await
    }

    pub async fn with_config(
        database_url: &str,
        backend_name: &str,
        config: &DatabaseConfig,
    ) -> Result<Self> {
        if database_url.is_empty() {
            return Err(TalentenraadError::database_config(
                "database_url is not set".to_string(),
            ));
        }

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name, config).await?
        };

        run_migrations(&db).await?;

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
            retry_config: retry::RetryConfig::from(config),
        };

        info!("{} storage initialized", storage.backend_name.to_uppercase());
        Ok(storage)
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// Underlying database connection
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Cheap liveness probe for the health endpoint
    pub async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| TalentenraadError::database_connection(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_backend_from_url() {
        assert_eq!(infer_backend_from_url("talentenraad.db").unwrap(), "sqlite");
        assert_eq!(
            infer_backend_from_url("sqlite://data/site.db?mode=rwc").unwrap(),
            "sqlite"
        );
        assert_eq!(
            infer_backend_from_url("mariadb://u:p@localhost/site").unwrap(),
            "mysql"
        );
        assert_eq!(
            infer_backend_from_url("postgresql://localhost/site").unwrap(),
            "postgres"
        );
        assert!(infer_backend_from_url("redis://localhost").is_err());
    }

    #[test]
    fn test_normalize_page() {
        assert_eq!(normalize_page(0, 0), (1, 1));
        assert_eq!(normalize_page(3, 1000), (3, 200));
    }
}
