//! Audit log of admin mutations

use chrono::Utc;
use sea_orm::{
    ActiveValue::{NotSet, Set}, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use tracing::debug;

use super::converters::{json_to_column, model_to_audit};
use super::{SeaOrmStorage, normalize_page, retry};
use crate::errors::Result;
use crate::storage::models::{AuditEntry, AuditFilter, NewAuditEntry, Paginated};

use migration::entities::audit_log;

impl SeaOrmStorage {
    pub async fn record_audit(&self, entry: NewAuditEntry) -> Result<()> {
        let db = &self.db;
        let active = audit_log::ActiveModel {
            id: NotSet,
            actor_email: Set(entry.actor_email.clone()),
            action: Set(entry.action.clone()),
            resource_type: Set(entry.resource_type.clone()),
            resource_id: Set(entry.resource_id.clone()),
            details: Set(json_to_column(&entry.details)),
            created_at: Set(Utc::now()),
        };

        retry::with_retry("record_audit", self.retry_config, || async {
            audit_log::Entity::insert(active.clone())
                .exec_without_returning(db)
                .await
        })
        .await?;

        debug!(
            "Audit: {} {} {} {:?}",
            entry.actor_email, entry.action, entry.resource_type, entry.resource_id
        );
        Ok(())
    }

    /// Newest first
    pub async fn list_audit_logs(
        &self,
        filter: &AuditFilter,
        page: u64,
        page_size: u64,
    ) -> Result<Paginated<AuditEntry>> {
        let (page, page_size) = normalize_page(page, page_size);

        let mut condition = Condition::all();
        if let Some(actor) = &filter.actor {
            condition = condition.add(audit_log::Column::ActorEmail.eq(actor.trim().to_lowercase()));
        }
        if let Some(resource_type) = &filter.resource_type {
            condition = condition.add(audit_log::Column::ResourceType.eq(resource_type.as_str()));
        }

        let paginator = audit_log::Entity::find()
            .filter(condition)
            .order_by_desc(audit_log::Column::CreatedAt)
            .order_by_desc(audit_log::Column::Id)
            .paginate(&self.db, page_size);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;

        Ok(Paginated {
            items: items.into_iter().map(model_to_audit).collect(),
            total,
            page,
            page_size,
        })
    }
}
