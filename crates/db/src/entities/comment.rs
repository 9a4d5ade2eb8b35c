//! Comment entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Name stored for comments posted anonymously.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Comment on an image.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Image commented on.
    #[sea_orm(indexed)]
    pub image_id: String,

    /// Author name, or [`ANONYMOUS_NAME`].
    pub commenter_name: String,

    /// Comment body.
    #[sea_orm(column_type = "Text")]
    pub comment_text: String,

    /// Whether the author chose to stay anonymous.
    #[sea_orm(default_value = false)]
    pub is_anonymous: bool,

    /// When the comment was posted.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::image::Entity",
        from = "Column::ImageId",
        to = "super::image::Column::Id",
        on_delete = "Cascade"
    )]
    Image,
}

impl Related<super::image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Image.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
