//! Post like repository.

use std::sync::Arc;

use crate::entities::{PostLike, post_like};
use snapcircle_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

/// Post like repository for database operations.
#[derive(Clone)]
pub struct PostLikeRepository {
    db: Arc<DatabaseConnection>,
}

impl PostLikeRepository {
    /// Create a new post like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a like by user and post.
    pub async fn find_by_user_and_post(
        &self,
        user_id: &str,
        post_id: &str,
    ) -> AppResult<Option<post_like::Model>> {
        PostLike::find()
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.eq(post_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user has liked a post.
    pub async fn has_liked(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        Ok(self
            .find_by_user_and_post(user_id, post_id)
            .await?
            .is_some())
    }

    /// Create a new like. The unique `(user_id, post_id)` index rejects
    /// a concurrent duplicate instead of storing it.
    pub async fn create(&self, model: post_like::ActiveModel) -> AppResult<post_like::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete the like of a user on a post, if present. One conditional
    /// statement; returns the number of rows removed, so the caller can
    /// tell which side of a toggle it landed on.
    pub async fn delete_by_user_and_post(&self, user_id: &str, post_id: &str) -> AppResult<u64> {
        let result = PostLike::delete_many()
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Count likes on a post.
    pub async fn count_by_post(&self, post_id: &str) -> AppResult<u64> {
        PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
