//! Create gallery table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Gallery::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Gallery::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Gallery::UploaderName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Gallery::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_gallery_created_at")
                    .table(Gallery::Table)
                    .col(Gallery::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Gallery::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Gallery {
    Table,
    Id,
    UploaderName,
    CreatedAt,
}
