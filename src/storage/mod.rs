use std::sync::Arc;

use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::SeaOrmStorage;
pub use models::*;

pub struct StorageFactory;

impl StorageFactory {
    /// Connect using `[database]` of the global config
    pub async fn create() -> Result<Arc<SeaOrmStorage>> {
        let config = crate::config::get_config();
        let database_url = &config.database.database_url;

        // database kind is inferred from the URL
        let backend_type = backend::infer_backend_from_url(database_url)?;

        let storage =
            SeaOrmStorage::with_config(database_url, &backend_type, &config.database).await?;
        Ok(Arc::new(storage))
    }
}
