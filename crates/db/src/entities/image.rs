//! Image entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Image record - one stored object of a gallery.
///
/// The object at `file_path` is kept in the object store, not the database.
/// Nothing here enforces that it exists; the lifecycle manager pairs them.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning gallery.
    #[sea_orm(indexed)]
    pub gallery_id: String,

    /// Public retrieval URL of the stored object.
    pub image_url: String,

    /// Object store key.
    pub file_path: String,

    /// When the record was created.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::gallery::Entity",
        from = "Column::GalleryId",
        to = "super::gallery::Column::Id",
        on_delete = "Cascade"
    )]
    Gallery,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
    #[sea_orm(has_many = "super::image_like::Entity")]
    Likes,
}

impl Related<super::gallery::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Gallery.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::image_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Likes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
