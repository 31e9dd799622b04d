//! Create saved_post table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SavedPost::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SavedPost::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SavedPost::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(SavedPost::PostId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(SavedPost::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_saved_post_user")
                            .from(SavedPost::Table, SavedPost::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_saved_post_post")
                            .from(SavedPost::Table, SavedPost::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, post_id) - save is a set membership
        manager
            .create_index(
                Index::create()
                    .name("idx_saved_post_user_post")
                    .table(SavedPost::Table)
                    .col(SavedPost::UserId)
                    .col(SavedPost::PostId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SavedPost::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SavedPost {
    Table,
    Id,
    UserId,
    PostId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
}
