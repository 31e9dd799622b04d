//! Direct message entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "message")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Sender user ID
    #[sea_orm(indexed)]
    pub sender_id: String,

    /// Receiver user ID
    #[sea_orm(indexed)]
    pub receiver_id: String,

    /// Message text; at least one of text and attachment is present
    #[sea_orm(column_type = "Text", nullable)]
    pub text: Option<String>,

    /// Attachment URL
    #[sea_orm(nullable)]
    pub attachment_url: Option<String>,

    /// Has the receiver read this message?
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
