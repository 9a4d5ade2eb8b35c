//! Create image_like table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ImageLike::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ImageLike::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ImageLike::ImageId).string().not_null())
                    .col(
                        ColumnDef::new(ImageLike::VoterToken)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ImageLike::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_image_like_image")
                            .from(ImageLike::Table, ImageLike::ImageId)
                            .to(Image::Table, Image::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One like per image and voter token
        manager
            .create_index(
                Index::create()
                    .name("idx_image_like_unique")
                    .table(ImageLike::Table)
                    .col(ImageLike::ImageId)
                    .col(ImageLike::VoterToken)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ImageLike::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ImageLike {
    Table,
    Id,
    ImageId,
    VoterToken,
    CreatedAt,
}

#[derive(Iden)]
enum Image {
    Table,
    Id,
}
