//! Create image table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Image::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Image::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Image::GalleryId).string().not_null())
                    .col(ColumnDef::new(Image::ImageUrl).text().not_null())
                    .col(ColumnDef::new(Image::FilePath).string_len(512).not_null())
                    .col(
                        ColumnDef::new(Image::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_image_gallery")
                            .from(Image::Table, Image::GalleryId)
                            .to(Gallery::Table, Gallery::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_image_gallery_id_created_at")
                    .table(Image::Table)
                    .col(Image::GalleryId)
                    .col(Image::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_image_file_path")
                    .table(Image::Table)
                    .col(Image::FilePath)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Image::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Image {
    Table,
    Id,
    GalleryId,
    ImageUrl,
    FilePath,
    CreatedAt,
}

#[derive(Iden)]
enum Gallery {
    Table,
    Id,
}
