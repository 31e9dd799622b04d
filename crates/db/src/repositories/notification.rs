//! Notification repository.

use std::sync::Arc;

use crate::entities::{Notification, notification};
use snapcircle_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<notification::Model>> {
        Notification::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new notification.
    pub async fn create(
        &self,
        model: notification::ActiveModel,
    ) -> AppResult<notification::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get notifications for a receiver, newest first (paginated).
    pub async fn find_by_receiver(
        &self,
        receiver_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<notification::Model>> {
        let mut query = Notification::find()
            .filter(notification::Column::ReceiverId.eq(receiver_id))
            .order_by_desc(notification::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(notification::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a notification as read. Idempotent.
    pub async fn mark_as_read(&self, id: &str) -> AppResult<()> {
        Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Mark all of a receiver's notifications as read. Returns the number
    /// of rows that actually flipped.
    pub async fn mark_all_as_read(&self, receiver_id: &str) -> AppResult<u64> {
        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::ReceiverId.eq(receiver_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Count unread notifications for a receiver.
    pub async fn count_unread(&self, receiver_id: &str) -> AppResult<u64> {
        Notification::find()
            .filter(notification::Column::ReceiverId.eq(receiver_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
