//! Post entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owner of the post, immutable after creation
    #[sea_orm(indexed)]
    pub user_id: String,

    /// Image URL, always present
    pub image_url: String,

    /// Caption text, may be empty
    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,

    #[sea_orm(has_many = "super::post_like::Entity")]
    Likes,

    #[sea_orm(has_many = "super::saved_post::Entity")]
    Saves,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
