//! Image like entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Image like - a record of a client liking an image.
///
/// `voter_token` is a random string the client generated for itself. It is
/// not authenticated; anyone can send any token.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image_like")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Image that was liked.
    #[sea_orm(indexed)]
    pub image_id: String,

    /// Client pseudo-identity.
    pub voter_token: String,

    /// When the like was created.
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
