//! Database migrations.
//!
//! Schema migrations for the database. Foreign keys cascade
//! gallery → image → comment/image_like so deleting a gallery row removes
//! everything hanging off it.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_gallery_table;
mod m20250101_000002_create_image_table;
mod m20250101_000003_create_comment_table;
mod m20250101_000004_create_image_like_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_gallery_table::Migration),
            Box::new(m20250101_000002_create_image_table::Migration),
            Box::new(m20250101_000003_create_comment_table::Migration),
            Box::new(m20250101_000004_create_image_like_table::Migration),
        ]
    }
}
