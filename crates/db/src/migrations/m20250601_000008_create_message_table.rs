//! Create message table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Message::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Message::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Message::SenderId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Message::ReceiverId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Message::Text).text())
                    .col(ColumnDef::new(Message::AttachmentUrl).string_len(1024))
                    .col(
                        ColumnDef::new(Message::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Message::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_sender")
                            .from(Message::Table, Message::SenderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_receiver")
                            .from(Message::Table, Message::ReceiverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (receiver_id, sender_id, is_read) - unread counts per thread
        manager
            .create_index(
                Index::create()
                    .name("idx_message_receiver_sender_is_read")
                    .table(Message::Table)
                    .col(Message::ReceiverId)
                    .col(Message::SenderId)
                    .col(Message::IsRead)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (thread ordering)
        manager
            .create_index(
                Index::create()
                    .name("idx_message_created_at")
                    .table(Message::Table)
                    .col(Message::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Message::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Message {
    Table,
    Id,
    SenderId,
    ReceiverId,
    Text,
    AttachmentUrl,
    IsRead,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
