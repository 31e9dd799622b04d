//! Friendship entity.
//!
//! Friendship is a single undirected edge: one row per unordered user
//! pair, stored with `user_low_id < user_high_id`. Symmetry holds by
//! construction and removing the row clears both directions at once.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "friendship")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Lexicographically smaller user ID of the pair
    #[sea_orm(indexed)]
    pub user_low_id: String,

    /// Lexicographically larger user ID of the pair
    #[sea_orm(indexed)]
    pub user_high_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserLowId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    UserLow,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserHighId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    UserHigh,
}

impl ActiveModelBehavior for ActiveModel {}
