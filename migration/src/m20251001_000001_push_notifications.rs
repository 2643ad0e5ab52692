use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PushSubscription::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PushSubscription::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    // MySQL 索引长度限制，endpoint 使用 varchar(700)
                    .col(
                        ColumnDef::new(PushSubscription::Endpoint)
                            .string_len(700)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PushSubscription::P256dh).string().not_null())
                    .col(ColumnDef::new(PushSubscription::Auth).string().not_null())
                    .col(ColumnDef::new(PushSubscription::UserAgent).string().null())
                    .col(
                        ColumnDef::new(PushSubscription::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PushSubscription::LastUsedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(NotificationHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NotificationHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NotificationHistory::Title).string().not_null())
                    .col(ColumnDef::new(NotificationHistory::Body).text().not_null())
                    .col(ColumnDef::new(NotificationHistory::Url).string().null())
                    .col(ColumnDef::new(NotificationHistory::SentBy).string().not_null())
                    .col(
                        ColumnDef::new(NotificationHistory::SentCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(NotificationHistory::FailedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(NotificationHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_notification_history_created_at")
                    .table(NotificationHistory::Table)
                    .col(NotificationHistory::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NotificationHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PushSubscription::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PushSubscription {
    #[sea_orm(iden = "push_subscriptions")]
    Table,
    Id,
    Endpoint,
    P256dh,
    Auth,
    UserAgent,
    CreatedAt,
    LastUsedAt,
}

#[derive(DeriveIden)]
enum NotificationHistory {
    #[sea_orm(iden = "notification_history")]
    Table,
    Id,
    Title,
    Body,
    Url,
    SentBy,
    SentCount,
    FailedCount,
    CreatedAt,
}
