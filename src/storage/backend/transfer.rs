//! Export / import of all side-state tables
//!
//! Rows are matched on natural keys so a dump can be moved between
//! database backends: users by email, submissions by (email, created_at),
//! push subscriptions by endpoint, notifications by (title, created_at),
//! clap totals by content id and settings by key.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseTransaction, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::{
    content_clap_to_active_model, json_to_column, model_to_notification,
    model_to_push_subscription, model_to_setting, model_to_submission, model_to_user,
    notification_to_active_model, push_subscription_to_active_model, setting_to_active_model,
    submission_to_active_model, user_to_active_model,
};
use crate::errors::{Result, TalentenraadError};
use crate::storage::models::{
    DataExport, EXPORT_FORMAT_VERSION, ImportMode, ImportSummary, TableImportCount,
};

use migration::entities::{
    content_clap, notification_history, push_subscription, site_setting, submission, user,
};

impl SeaOrmStorage {
    pub async fn export_data(&self) -> Result<DataExport> {
        let db = &self.db;

        let users = user::Entity::find()
            .order_by_asc(user::Column::Email)
            .all(db)
            .await?
            .into_iter()
            .map(model_to_user)
            .collect();
        let submissions = submission::Entity::find()
            .order_by_asc(submission::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(model_to_submission)
            .collect();
        let push_subscriptions = push_subscription::Entity::find()
            .order_by_asc(push_subscription::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(model_to_push_subscription)
            .collect();
        let notification_history = notification_history::Entity::find()
            .order_by_asc(notification_history::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(model_to_notification)
            .collect();
        let site_settings = site_setting::Entity::find()
            .order_by_asc(site_setting::Column::Key)
            .all(db)
            .await?
            .into_iter()
            .map(model_to_setting)
            .collect();

        Ok(DataExport {
            version: EXPORT_FORMAT_VERSION,
            exported_at: Utc::now(),
            users,
            submissions,
            push_subscriptions,
            notification_history,
            content_claps: self.all_content_claps().await?,
            site_settings,
        })
    }

    /// Import a dump in a single transaction
    pub async fn import_data(&self, doc: &DataExport, mode: ImportMode) -> Result<ImportSummary> {
        if doc.version > EXPORT_FORMAT_VERSION {
            return Err(TalentenraadError::validation(format!(
                "Unsupported export version {} (max {})",
                doc.version, EXPORT_FORMAT_VERSION
            )));
        }

        let txn = self.db.begin().await?;
        let summary = match import_all(&txn, doc, mode).await {
            Ok(summary) => summary,
            Err(e) => {
                txn.rollback().await?;
                return Err(e);
            }
        };
        txn.commit().await?;

        info!("Import finished ({}): {:?}", mode, summary);
        Ok(summary)
    }
}

async fn import_all(
    txn: &DatabaseTransaction,
    doc: &DataExport,
    mode: ImportMode,
) -> Result<ImportSummary> {
    let overwrite = mode == ImportMode::Overwrite;
    let mut summary = ImportSummary::default();

    for u in &doc.users {
        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(u.email.trim().to_lowercase()))
            .one(txn)
            .await?;
        match existing {
            Some(row) if overwrite => {
                let mut active = row.into_active_model();
                active.name = Set(u.name.clone());
                active.role = Set(u.role.to_string());
                active.last_login_at = Set(u.last_login_at);
                active.update(txn).await?;
                summary.users.updated += 1;
            }
            Some(_) => summary.users.skipped += 1,
            None => {
                let mut u = u.clone();
                u.email = u.email.trim().to_lowercase();
                user::Entity::insert(user_to_active_model(&u))
                    .exec_without_returning(txn)
                    .await?;
                summary.users.inserted += 1;
            }
        }
    }

    for s in &doc.submissions {
        let existing = submission::Entity::find()
            .filter(submission::Column::Email.eq(s.email.as_str()))
            .filter(submission::Column::CreatedAt.eq(s.created_at))
            .one(txn)
            .await?;
        match existing {
            Some(row) if overwrite => {
                let mut active = row.into_active_model();
                active.kind = Set(s.kind.to_string());
                active.name = Set(s.name.clone());
                active.subject = Set(s.subject.clone());
                active.message = Set(s.message.clone());
                active.metadata = Set(json_to_column(&s.metadata));
                active.status = Set(s.status.to_string());
                active.update(txn).await?;
                summary.submissions.updated += 1;
            }
            Some(_) => summary.submissions.skipped += 1,
            None => {
                submission::Entity::insert(submission_to_active_model(s, false))
                    .exec_without_returning(txn)
                    .await?;
                summary.submissions.inserted += 1;
            }
        }
    }

    for p in &doc.push_subscriptions {
        let existing = push_subscription::Entity::find()
            .filter(push_subscription::Column::Endpoint.eq(p.endpoint.as_str()))
            .one(txn)
            .await?;
        match existing {
            Some(row) if overwrite => {
                let mut active = row.into_active_model();
                active.p256dh = Set(p.p256dh.clone());
                active.auth = Set(p.auth.clone());
                active.user_agent = Set(p.user_agent.clone());
                active.update(txn).await?;
                summary.push_subscriptions.updated += 1;
            }
            Some(_) => summary.push_subscriptions.skipped += 1,
            None => {
                push_subscription::Entity::insert(push_subscription_to_active_model(p))
                    .exec_without_returning(txn)
                    .await?;
                summary.push_subscriptions.inserted += 1;
            }
        }
    }

    for n in &doc.notification_history {
        let existing = notification_history::Entity::find()
            .filter(notification_history::Column::Title.eq(n.title.as_str()))
            .filter(notification_history::Column::CreatedAt.eq(n.created_at))
            .one(txn)
            .await?;
        match existing {
            Some(row) if overwrite => {
                let mut active = row.into_active_model();
                active.body = Set(n.body.clone());
                active.url = Set(n.url.clone());
                active.sent_by = Set(n.sent_by.clone());
                active.sent_count = Set(n.sent_count);
                active.failed_count = Set(n.failed_count);
                active.update(txn).await?;
                summary.notification_history.updated += 1;
            }
            Some(_) => summary.notification_history.skipped += 1,
            None => {
                notification_history::Entity::insert(notification_to_active_model(n, false))
                    .exec_without_returning(txn)
                    .await?;
                summary.notification_history.inserted += 1;
            }
        }
    }

    for c in &doc.content_claps {
        let existing = content_clap::Entity::find_by_id(c.content_id.clone())
            .one(txn)
            .await?;
        count_keyed(
            &mut summary.content_claps,
            existing.is_some(),
            overwrite,
            || async {
                if existing.is_some() {
                    content_clap_to_active_model(c).update(txn).await.map(|_| ())
                } else {
                    content_clap::Entity::insert(content_clap_to_active_model(c))
                        .exec_without_returning(txn)
                        .await
                        .map(|_| ())
                }
            },
        )
        .await?;
    }

    for s in &doc.site_settings {
        let existing = site_setting::Entity::find_by_id(s.key.clone())
            .one(txn)
            .await?;
        count_keyed(
            &mut summary.site_settings,
            existing.is_some(),
            overwrite,
            || async {
                if existing.is_some() {
                    setting_to_active_model(s).update(txn).await.map(|_| ())
                } else {
                    site_setting::Entity::insert(setting_to_active_model(s))
                        .exec_without_returning(txn)
                        .await
                        .map(|_| ())
                }
            },
        )
        .await?;
    }

    Ok(summary)
}

/// Shared skip/overwrite bookkeeping for tables keyed by their primary key
async fn count_keyed<F, Fut>(
    count: &mut TableImportCount,
    exists: bool,
    overwrite: bool,
    write: F,
) -> Result<()>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<(), sea_orm::DbErr>>,
{
    match (exists, overwrite) {
        (true, false) => count.skipped += 1,
        (true, true) => {
            write().await?;
            count.updated += 1;
        }
        (false, _) => {
            write().await?;
            count.inserted += 1;
        }
    }
    Ok(())
}
