//! Sent notification history

use chrono::Utc;
use sea_orm::{
    ActiveValue::{NotSet, Set}, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::Expr,
};

use super::converters::model_to_notification;
use super::{SeaOrmStorage, retry};
use crate::errors::Result;
use crate::storage::models::NotificationRecord;

use migration::entities::notification_history;

impl SeaOrmStorage {
    pub async fn insert_notification(
        &self,
        title: &str,
        body: &str,
        url: Option<String>,
        sent_by: &str,
        sent_count: i32,
        failed_count: i32,
    ) -> Result<NotificationRecord> {
        let db = &self.db;
        let now = Utc::now();
        let active = notification_history::ActiveModel {
            id: NotSet,
            title: Set(title.to_string()),
            body: Set(body.to_string()),
            url: Set(url.clone()),
            sent_by: Set(sent_by.to_string()),
            sent_count: Set(sent_count),
            failed_count: Set(failed_count),
            created_at: Set(now),
        };

        let result = retry::with_retry("insert_notification", self.retry_config, || async {
            notification_history::Entity::insert(active.clone())
                .exec(db)
                .await
        })
        .await?;

        Ok(NotificationRecord {
            id: result.last_insert_id,
            title: title.to_string(),
            body: body.to_string(),
            url,
            sent_by: sent_by.to_string(),
            sent_count,
            failed_count,
            created_at: now,
        })
    }

    pub async fn update_notification_counts(
        &self,
        id: i64,
        sent_count: i32,
        failed_count: i32,
    ) -> Result<()> {
        notification_history::Entity::update_many()
            .col_expr(
                notification_history::Column::SentCount,
                Expr::val(sent_count),
            )
            .col_expr(
                notification_history::Column::FailedCount,
                Expr::val(failed_count),
            )
            .filter(notification_history::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Newest first
    pub async fn notification_history(&self, limit: u64) -> Result<Vec<NotificationRecord>> {
        let db = &self.db;
        let rows = retry::with_retry("notification_history", self.retry_config, || async {
            notification_history::Entity::find()
                .order_by_desc(notification_history::Column::CreatedAt)
                .order_by_desc(notification_history::Column::Id)
                .limit(limit)
                .all(db)
                .await
        })
        .await?;
        Ok(rows.into_iter().map(model_to_notification).collect())
    }

    pub async fn latest_notification(&self) -> Result<Option<NotificationRecord>> {
        Ok(self.notification_history(1).await?.into_iter().next())
    }
}
