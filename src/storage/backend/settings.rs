//! Key/value site settings

use chrono::Utc;
use sea_orm::{EntityTrait, QueryOrder, sea_query::OnConflict};
use serde_json::Value;

use super::converters::{model_to_setting, setting_to_active_model};
use super::{SeaOrmStorage, retry};
use crate::errors::Result;
use crate::storage::models::SiteSettingRecord;

use migration::entities::site_setting;

impl SeaOrmStorage {
    pub async fn load_settings(&self) -> Result<Vec<SiteSettingRecord>> {
        let db = &self.db;
        let rows = retry::with_retry("load_settings", self.retry_config, || async {
            site_setting::Entity::find()
                .order_by_asc(site_setting::Column::Key)
                .all(db)
                .await
        })
        .await?;
        Ok(rows.into_iter().map(model_to_setting).collect())
    }

    pub async fn upsert_setting(
        &self,
        key: &str,
        value: Value,
        updated_by: Option<String>,
    ) -> Result<SiteSettingRecord> {
        let db = &self.db;
        let record = SiteSettingRecord {
            key: key.to_string(),
            value,
            updated_at: Utc::now(),
            updated_by,
        };
        let active = setting_to_active_model(&record);

        retry::with_retry("upsert_setting", self.retry_config, || async {
            site_setting::Entity::insert(active.clone())
                .on_conflict(
                    OnConflict::column(site_setting::Column::Key)
                        .update_columns([
                            site_setting::Column::Value,
                            site_setting::Column::UpdatedAt,
                            site_setting::Column::UpdatedBy,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(db)
                .await
        })
        .await?;

        Ok(record)
    }
}
