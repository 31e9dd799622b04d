//! Create friendship table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Friendship::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Friendship::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Friendship::UserLowId)
                            .string_len(32)
                            .not_null(),
                    )
                    // One row per unordered pair, user_low_id < user_high_id
                    .col(
                        ColumnDef::new(Friendship::UserHighId)
                            .string_len(32)
                            .not_null()
                            .check(
                                Expr::col(Friendship::UserLowId)
                                    .lt(Expr::col(Friendship::UserHighId)),
                            ),
                    )
                    .col(
                        ColumnDef::new(Friendship::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friendship_user_low")
                            .from(Friendship::Table, Friendship::UserLowId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friendship_user_high")
                            .from(Friendship::Table, Friendship::UserHighId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_low_id, user_high_id) - at most one edge per pair
        manager
            .create_index(
                Index::create()
                    .name("idx_friendship_pair")
                    .table(Friendship::Table)
                    .col(Friendship::UserLowId)
                    .col(Friendship::UserHighId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_high_id (membership queries from the high side)
        manager
            .create_index(
                Index::create()
                    .name("idx_friendship_user_high_id")
                    .table(Friendship::Table)
                    .col(Friendship::UserHighId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Friendship::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Friendship {
    Table,
    Id,
    UserLowId,
    UserHighId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
