//! Create notification table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notification::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Notification::SenderId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::ReceiverId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notification::Body).text().not_null())
                    .col(ColumnDef::new(Notification::Link).string_len(1024))
                    .col(
                        ColumnDef::new(Notification::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notification::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_sender")
                            .from(Notification::Table, Notification::SenderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_receiver")
                            .from(Notification::Table, Notification::ReceiverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (receiver_id, is_read) - inbox and unread count queries
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_receiver_is_read")
                    .table(Notification::Table)
                    .col(Notification::ReceiverId)
                    .col(Notification::IsRead)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Notification {
    Table,
    Id,
    SenderId,
    ReceiverId,
    Body,
    Link,
    IsRead,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
