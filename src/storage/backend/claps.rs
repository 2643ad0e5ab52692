//! Clap counters
//!
//! `clap_sessions` holds the per (session, content) count that enforces the
//! session ceiling; `content_claps` holds the public total.

use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseBackend, DbErr, EntityTrait, ExprTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use tracing::debug;

use super::converters::model_to_content_clap;
use super::{SeaOrmStorage, retry};
use crate::errors::{Result, TalentenraadError};
use crate::storage::models::{ClapWrite, ContentClapTotal};

use migration::entities::{clap_session, content_clap};

fn total_upsert_conflict(backend: DatabaseBackend) -> OnConflict {
    // SQLite/PostgreSQL: excluded.total_claps, MySQL: VALUES(total_claps)
    let incoming = match backend {
        DatabaseBackend::MySql => Expr::cust("VALUES(total_claps)"),
        _ => Expr::cust("excluded.total_claps"),
    };
    OnConflict::column(content_clap::Column::ContentId)
        .value(
            content_clap::Column::TotalClaps,
            Expr::col(content_clap::Column::TotalClaps).add(incoming),
        )
        .value(content_clap::Column::UpdatedAt, Expr::val(Utc::now()))
        .to_owned()
}

impl SeaOrmStorage {
    /// Claps this session already gave to the content item
    pub async fn session_claps(&self, session_id: &str, content_id: &str) -> Result<i32> {
        let db = &self.db;
        let row = retry::with_retry("session_claps", self.retry_config, || async {
            clap_session::Entity::find_by_id((session_id.to_string(), content_id.to_string()))
                .one(db)
                .await
        })
        .await?;
        Ok(row.map(|r| r.clap_count).unwrap_or(0))
    }

    /// Public total for one content item
    pub async fn content_total(&self, content_id: &str) -> Result<i64> {
        let db = &self.db;
        let row = retry::with_retry("content_total", self.retry_config, || async {
            content_clap::Entity::find_by_id(content_id.to_string())
                .one(db)
                .await
        })
        .await?;
        Ok(row.map(|r| r.total_claps).unwrap_or(0))
    }

    /// Add `amount` claps in one transaction
    ///
    /// The session row is only bumped while `clap_count + amount <= max`;
    /// when that guard matches no row nothing is written and `Ok(None)` is
    /// returned.
    pub async fn record_claps(
        &self,
        session_id: &str,
        content_id: &str,
        content_type: &str,
        amount: i32,
        max: i32,
    ) -> Result<Option<ClapWrite>> {
        if amount <= 0 {
            return Err(TalentenraadError::validation(
                "clap amount must be positive".to_string(),
            ));
        }

        let db = &self.db;
        let backend = db.get_database_backend();

        let outcome = retry::with_retry("record_claps", self.retry_config, || async {
            let txn = db.begin().await?;
            let now = Utc::now();

            clap_session::Entity::insert(clap_session::ActiveModel {
                session_id: Set(session_id.to_string()),
                content_id: Set(content_id.to_string()),
                clap_count: Set(0),
                created_at: Set(now),
                updated_at: Set(now),
            })
            .on_conflict(
                OnConflict::columns([
                    clap_session::Column::SessionId,
                    clap_session::Column::ContentId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .do_nothing()
            .exec(&txn)
            .await?;

            let guarded = clap_session::Entity::update_many()
                .col_expr(
                    clap_session::Column::ClapCount,
                    Expr::col(clap_session::Column::ClapCount).add(Expr::val(amount)),
                )
                .col_expr(clap_session::Column::UpdatedAt, Expr::val(now))
                .filter(clap_session::Column::SessionId.eq(session_id))
                .filter(clap_session::Column::ContentId.eq(content_id))
                .filter(clap_session::Column::ClapCount.lte(max - amount))
                .exec(&txn)
                .await?;

            if guarded.rows_affected == 0 {
                txn.rollback().await?;
                return Ok::<_, DbErr>(None);
            }

            content_clap::Entity::insert(content_clap::ActiveModel {
                content_id: Set(content_id.to_string()),
                content_type: Set(content_type.to_string()),
                total_claps: Set(amount as i64),
                updated_at: Set(now),
            })
            .on_conflict(total_upsert_conflict(backend))
            .exec_without_returning(&txn)
            .await?;

            let session_claps = clap_session::Entity::find_by_id((
                session_id.to_string(),
                content_id.to_string(),
            ))
            .one(&txn)
            .await?
            .map(|r| r.clap_count)
            .unwrap_or(amount);
            let total = content_clap::Entity::find_by_id(content_id.to_string())
                .one(&txn)
                .await?
                .map(|r| r.total_claps)
                .unwrap_or(amount as i64);

            txn.commit().await?;
            Ok(Some(ClapWrite {
                total,
                session_claps,
            }))
        })
        .await?;

        if let Some(write) = &outcome {
            debug!(
                "Recorded {} claps for {} (total {}, session {})",
                amount, content_id, write.total, write.session_claps
            );
        }
        Ok(outcome)
    }

    /// Most clapped content first
    pub async fn top_claps(&self, limit: u64) -> Result<Vec<ContentClapTotal>> {
        let db = &self.db;
        let rows = retry::with_retry("top_claps", self.retry_config, || async {
            content_clap::Entity::find()
                .filter(content_clap::Column::TotalClaps.gt(0))
                .order_by_desc(content_clap::Column::TotalClaps)
                .order_by_asc(content_clap::Column::ContentId)
                .limit(limit.clamp(1, 100))
                .all(db)
                .await
        })
        .await?;
        Ok(rows.into_iter().map(model_to_content_clap).collect())
    }

    pub async fn all_content_claps(&self) -> Result<Vec<ContentClapTotal>> {
        let rows = content_clap::Entity::find()
            .order_by_asc(content_clap::Column::ContentId)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(model_to_content_clap).collect())
    }
}
