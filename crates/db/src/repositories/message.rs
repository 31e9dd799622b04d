//! Message repository.

use std::sync::Arc;

use crate::entities::{Message, message};
use snapcircle_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

/// Message repository for database operations.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new message.
    pub async fn create(&self, model: message::ActiveModel) -> AppResult<message::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a message by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<message::Model>> {
        Message::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Condition matching both directions of a two-user thread.
    fn thread_condition(a: &str, b: &str) -> Condition {
        Condition::any()
            .add(
                Condition::all()
                    .add(message::Column::SenderId.eq(a))
                    .add(message::Column::ReceiverId.eq(b)),
            )
            .add(
                Condition::all()
                    .add(message::Column::SenderId.eq(b))
                    .add(message::Column::ReceiverId.eq(a)),
            )
    }

    /// Get the messages exchanged between two users, oldest first
    /// (paginated forward with `after_id`).
    pub async fn find_thread(
        &self,
        a: &str,
        b: &str,
        limit: u64,
        after_id: Option<&str>,
    ) -> AppResult<Vec<message::Model>> {
        let mut query = Message::find()
            .filter(Self::thread_condition(a, b))
            .order_by_asc(message::Column::Id);

        if let Some(id) = after_id {
            query = query.filter(message::Column::Id.gt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the latest message in a thread.
    pub async fn find_latest_in_thread(
        &self,
        a: &str,
        b: &str,
    ) -> AppResult<Option<message::Model>> {
        Message::find()
            .filter(Self::thread_condition(a, b))
            .order_by_desc(message::Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count unread messages addressed to a user from one counterpart.
    pub async fn count_unread_from(&self, user_id: &str, counterpart_id: &str) -> AppResult<u64> {
        Message::find()
            .filter(message::Column::SenderId.eq(counterpart_id))
            .filter(message::Column::ReceiverId.eq(user_id))
            .filter(message::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all unread messages addressed to a user.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        Message::find()
            .filter(message::Column::ReceiverId.eq(user_id))
            .filter(message::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark every unread message addressed to `user_id` from
    /// `counterpart_id` as read. One bulk update, idempotent; returns the
    /// number of rows that flipped.
    pub async fn mark_thread_read(&self, user_id: &str, counterpart_id: &str) -> AppResult<u64> {
        let result = Message::update_many()
            .col_expr(message::Column::IsRead, Expr::value(true))
            .filter(message::Column::SenderId.eq(counterpart_id))
            .filter(message::Column::ReceiverId.eq(user_id))
            .filter(message::Column::IsRead.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_message(id: &str, sender: &str, receiver: &str, text: &str) -> message::Model {
        message::Model {
            id: id.to_string(),
            sender_id: sender.to_string(),
            receiver_id: receiver.to_string(),
            text: Some(text.to_string()),
            attachment_url: None,
            is_read: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_thread_both_directions() {
        let m1 = create_test_message("m1", "alice", "bob", "hello");
        let m2 = create_test_message("m2", "bob", "alice", "hi");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[m1, m2]])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let result = repo.find_thread("alice", "bob", 50, None).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "m1");
    }

    #[tokio::test]
    async fn test_mark_thread_read_reports_flipped_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let flipped = repo.mark_thread_read("bob", "alice").await.unwrap();

        assert_eq!(flipped, 2);
    }

    #[tokio::test]
    async fn test_mark_thread_read_idempotent_when_nothing_unread() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let flipped = repo.mark_thread_read("bob", "alice").await.unwrap();

        assert_eq!(flipped, 0);
    }

    #[tokio::test]
    async fn test_count_unread_from() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(2)]])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let count = repo.count_unread_from("bob", "alice").await.unwrap();

        assert_eq!(count, 2);
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        let mut row = std::collections::BTreeMap::new();
        row.insert("num_items", sea_orm::Value::BigInt(Some(n)));
        row
    }
}
