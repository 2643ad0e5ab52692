pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20250901_000001_initial_tables;
mod m20250915_000001_claps;
mod m20251001_000001_push_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_initial_tables::Migration),
            Box::new(m20250915_000001_claps::Migration),
            Box::new(m20251001_000001_push_notifications::Migration),
        ]
    }
}
