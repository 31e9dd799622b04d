//! Notification entity.
//!
//! Append-only except for the `is_read` flag. Rows are created only as
//! a side effect of another action, never with sender == receiver.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user whose action triggered the notification
    #[sea_orm(indexed)]
    pub sender_id: String,

    /// The user receiving the notification
    #[sea_orm(indexed)]
    pub receiver_id: String,

    /// Human-readable notification text
    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// Optional link to the subject of the notification
    #[sea_orm(nullable)]
    pub link: Option<String>,

    /// Has this notification been read?
    #[sea_orm(default_value = false)]
    pub is_read: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SenderId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Sender,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReceiverId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Receiver,
}

impl ActiveModelBehavior for ActiveModel {}
