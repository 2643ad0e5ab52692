use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ContentClap::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContentClap::ContentId)
                            .string_len(128)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ContentClap::ContentType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContentClap::TotalClaps)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ContentClap::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 每个浏览器会话对每条内容的鼓掌次数，主键 (session_id, content_id)
        manager
            .create_table(
                Table::create()
                    .table(ClapSession::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClapSession::SessionId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClapSession::ContentId)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClapSession::ClapCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ClapSession::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClapSession::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ClapSession::SessionId)
                            .col(ClapSession::ContentId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_content_claps_total")
                    .table(ContentClap::Table)
                    .col(ContentClap::TotalClaps)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClapSession::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ContentClap::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ContentClap {
    #[sea_orm(iden = "content_claps")]
    Table,
    ContentId,
    ContentType,
    TotalClaps,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ClapSession {
    #[sea_orm(iden = "clap_sessions")]
    Table,
    SessionId,
    ContentId,
    ClapCount,
    CreatedAt,
    UpdatedAt,
}
