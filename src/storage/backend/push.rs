//! Web push subscriptions

use chrono::Utc;
use sea_orm::{
    ActiveValue::{NotSet, Set}, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    sea_query::{Expr, OnConflict},
};
use tracing::info;

use super::converters::model_to_push_subscription;
use super::{SeaOrmStorage, retry};
use crate::errors::Result;
use crate::storage::models::PushSubscriptionRecord;

use migration::entities::push_subscription;

impl SeaOrmStorage {
    /// Insert or refresh the keys of a subscription (unique on endpoint)
    pub async fn upsert_push_subscription(
        &self,
        endpoint: &str,
        p256dh: &str,
        auth: &str,
        user_agent: Option<String>,
    ) -> Result<()> {
        let db = &self.db;
        let active = push_subscription::ActiveModel {
            id: NotSet,
            endpoint: Set(endpoint.to_string()),
            p256dh: Set(p256dh.to_string()),
            auth: Set(auth.to_string()),
            user_agent: Set(user_agent),
            created_at: Set(Utc::now()),
            last_used_at: Set(None),
        };

        retry::with_retry("upsert_push_subscription", self.retry_config, || async {
            push_subscription::Entity::insert(active.clone())
                .on_conflict(
                    OnConflict::column(push_subscription::Column::Endpoint)
                        .update_columns([
                            push_subscription::Column::P256dh,
                            push_subscription::Column::Auth,
                            push_subscription::Column::UserAgent,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(db)
                .await
        })
        .await?;

        info!("Push subscription registered");
        Ok(())
    }

    /// Returns whether a row was removed
    pub async fn delete_push_subscription(&self, endpoint: &str) -> Result<bool> {
        let result = push_subscription::Entity::delete_many()
            .filter(push_subscription::Column::Endpoint.eq(endpoint))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn list_push_subscriptions(&self) -> Result<Vec<PushSubscriptionRecord>> {
        let rows = push_subscription::Entity::find()
            .order_by_asc(push_subscription::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(model_to_push_subscription).collect())
    }

    pub async fn delete_push_subscriptions(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = push_subscription::Entity::delete_many()
            .filter(push_subscription::Column::Id.is_in(ids.iter().copied()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn mark_push_subscriptions_used(&self, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        push_subscription::Entity::update_many()
            .col_expr(
                push_subscription::Column::LastUsedAt,
                Expr::val(Utc::now()),
            )
            .filter(push_subscription::Column::Id.is_in(ids.iter().copied()))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
