//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Lowercased username for case-insensitive uniqueness
    #[sea_orm(unique)]
    pub username_lower: String,

    pub email: String,

    /// Lowercased email for case-insensitive uniqueness
    #[sea_orm(unique)]
    pub email_lower: String,

    /// Argon2 password hash, never the raw password
    pub password_hash: String,

    /// Display name
    #[sea_orm(nullable)]
    pub name: Option<String>,

    /// Profile description
    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    /// Profile photo URL
    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Posts,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
