//! Form submissions

use chrono::Utc;
use sea_orm::{
    ActiveValue::{NotSet, Set}, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use tracing::info;

use super::converters::{json_to_column, model_to_submission};
use super::{SeaOrmStorage, normalize_page, retry};
use crate::errors::{Result, TalentenraadError};
use crate::storage::models::{
    NewSubmission, Paginated, Submission, SubmissionFilter, SubmissionStatus,
};

use migration::entities::submission;

fn filter_condition(filter: &SubmissionFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(status) = filter.status {
        condition = condition.add(submission::Column::Status.eq(status.to_string()));
    }
    if let Some(kind) = filter.kind {
        condition = condition.add(submission::Column::Kind.eq(kind.to_string()));
    }
    condition
}

impl SeaOrmStorage {
    pub async fn insert_submission(&self, new: NewSubmission) -> Result<Submission> {
        let db = &self.db;
        let now = Utc::now();
        let active = submission::ActiveModel {
            id: NotSet,
            kind: Set(new.kind.to_string()),
            name: Set(new.name.clone()),
            email: Set(new.email.clone()),
            subject: Set(new.subject.clone()),
            message: Set(new.message.clone()),
            metadata: Set(json_to_column(&new.metadata)),
            status: Set(SubmissionStatus::New.to_string()),
            created_at: Set(now),
        };

        let result = retry::with_retry("insert_submission", self.retry_config, || async {
            submission::Entity::insert(active.clone()).exec(db).await
        })
        .await?;

        info!("Submission {} stored ({})", result.last_insert_id, new.kind);
        Ok(Submission {
            id: result.last_insert_id,
            kind: new.kind,
            name: new.name,
            email: new.email,
            subject: new.subject,
            message: new.message,
            metadata: new.metadata,
            status: SubmissionStatus::New,
            created_at: now,
        })
    }

    /// Newest first
    pub async fn list_submissions(
        &self,
        filter: &SubmissionFilter,
        page: u64,
        page_size: u64,
    ) -> Result<Paginated<Submission>> {
        let (page, page_size) = normalize_page(page, page_size);
        let paginator = submission::Entity::find()
            .filter(filter_condition(filter))
            .order_by_desc(submission::Column::CreatedAt)
            .order_by_desc(submission::Column::Id)
            .paginate(&self.db, page_size);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;

        Ok(Paginated {
            items: items.into_iter().map(model_to_submission).collect(),
            total,
            page,
            page_size,
        })
    }

    /// Unpaginated listing for the CSV export
    pub async fn all_submissions(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>> {
        let rows = submission::Entity::find()
            .filter(filter_condition(filter))
            .order_by_asc(submission::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(model_to_submission).collect())
    }

    pub async fn update_submission_status(
        &self,
        id: i64,
        status: SubmissionStatus,
    ) -> Result<Submission> {
        let result = submission::Entity::update_many()
            .col_expr(
                submission::Column::Status,
                sea_orm::sea_query::Expr::val(status.to_string()),
            )
            .filter(submission::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(TalentenraadError::not_found(format!(
                "Submission not found: {}",
                id
            )));
        }

        let row = submission::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| TalentenraadError::not_found(format!("Submission not found: {}", id)))?;
        Ok(model_to_submission(row))
    }

    pub async fn delete_submission(&self, id: i64) -> Result<()> {
        let result = submission::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(TalentenraadError::not_found(format!(
                "Submission not found: {}",
                id
            )));
        }
        Ok(())
    }

    pub async fn count_submissions(&self, status: Option<SubmissionStatus>) -> Result<u64> {
        let filter = SubmissionFilter { status, kind: None };
        Ok(submission::Entity::find()
            .filter(filter_condition(&filter))
            .count(&self.db)
            .await?)
    }
}
