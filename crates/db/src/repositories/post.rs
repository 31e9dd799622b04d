//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, post};
use snapcircle_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a post by ID, failing when absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a post. Comments, likes and saves go with it (FK cascade).
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get the global feed, newest first (paginated).
    pub async fn find_all(&self, limit: u64, until_id: Option<&str>) -> AppResult<Vec<post::Model>> {
        let mut query = Post::find().order_by_desc(post::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(post::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get posts by a user, newest first (paginated).
    pub async fn find_by_user(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<post::Model>> {
        let mut query = Post::find()
            .filter(post::Column::UserId.eq(user_id))
            .order_by_desc(post::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(post::Column::Id.lt(id));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find posts by a set of IDs, newest first.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<post::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Post::find()
            .filter(post::Column::Id.is_in(ids.iter().map(String::as_str)))
            .order_by_desc(post::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count posts by a user.
    pub async fn count_by_user(&self, user_id: &str) -> AppResult<u64> {
        Post::find()
            .filter(post::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
