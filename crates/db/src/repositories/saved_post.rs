//! Saved post repository.

use std::sync::Arc;

use crate::entities::{SavedPost, saved_post};
use snapcircle_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Saved post repository for database operations.
#[derive(Clone)]
pub struct SavedPostRepository {
    db: Arc<DatabaseConnection>,
}

impl SavedPostRepository {
    /// Create a new saved post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a save by user and post.
    pub async fn find_by_user_and_post(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> AppResult<Option<saved_post::Model>> {
        SavedPost::find()
            .filter(saved_post::Column::UserId.eq(user_id))
            .filter(saved_post::Column::PostId.eq(post_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user has saved a post.
    pub async fn has_saved(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        Ok(self
            .find_by_user_and_post(user_id, post_id)
            .await?
            .is_some())
    }

    /// Create a new save. The unique `(user_id, post_id)` index rejects
    /// a concurrent duplicate instead of storing it.
    pub async fn create(&self, model: saved_post::ActiveModel) -> AppResult<saved_post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete the save of a user on a post, if present. Returns the
    /// number of rows removed.
    pub async fn delete_by_user_and_post(&self, user_id: &str, post_id: &str) -> AppResult<u64> {
        let result = SavedPost::delete_many()
            .filter(saved_post::Column::UserId.eq(user_id))
            .filter(saved_post::Column::PostId.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Get the post IDs a user has saved, most recently saved first.
    pub async fn find_post_ids_by_user(&self, user_id: &str) -> AppResult<Vec<String>> {
        let saves = SavedPost::find()
            .filter(saved_post::Column::UserId.eq(user_id))
            .order_by_desc(saved_post::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(saves.into_iter().map(|s| s.post_id).collect())
    }
}
