//! Friendship repository.
//!
//! All operations address the undirected edge through its canonical
//! ordered pair, so there is never a reverse edge to forget.

use std::sync::Arc;

use crate::entities::{Friendship, friendship};
use snapcircle_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};

/// Order two user IDs canonically (low, high).
#[must_use]
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Friendship repository for database operations.
#[derive(Clone)]
pub struct FriendshipRepository {
    db: Arc<DatabaseConnection>,
}

impl FriendshipRepository {
    /// Create a new friendship repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the edge between two users, if any.
    pub async fn find_by_pair(&self, a: &str, b: &str) -> AppResult<Option<friendship::Model>> {
        let (low, high) = canonical_pair(a, b);

        Friendship::find()
            .filter(friendship::Column::UserLowId.eq(low))
            .filter(friendship::Column::UserHighId.eq(high))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether two users are friends. Symmetric by construction.
    pub async fn are_friends(&self, a: &str, b: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(a, b).await?.is_some())
    }

    /// Create a new friendship edge.
    pub async fn create(&self, model: friendship::ActiveModel) -> AppResult<friendship::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete the edge between two users. Returns the number of rows
    /// removed (0 when the users were not friends). A single conditional
    /// delete, so both "directions" disappear together.
    pub async fn delete_by_pair(&self, a: &str, b: &str) -> AppResult<u64> {
        let (low, high) = canonical_pair(a, b);

        let result = Friendship::delete_many()
            .filter(friendship::Column::UserLowId.eq(low))
            .filter(friendship::Column::UserHighId.eq(high))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Get all edges touching a user, newest first.
    pub async fn find_for_user(&self, user_id: &str) -> AppResult<Vec<friendship::Model>> {
        Friendship::find()
            .filter(
                Condition::any()
                    .add(friendship::Column::UserLowId.eq(user_id))
                    .add(friendship::Column::UserHighId.eq(user_id)),
            )
            .order_by_desc(friendship::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the IDs of a user's friends, newest friendship first.
    pub async fn find_friend_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        let edges = self.find_for_user(user_id).await?;

        Ok(edges
            .into_iter()
            .map(|edge| {
                if edge.user_low_id == user_id {
                    edge.user_high_id
                } else {
                    edge.user_low_id
                }
            })
            .collect())
    }

    /// Count a user's friends.
    pub async fn count_for_user(&self, user_id: &str) -> AppResult<u64> {
        Friendship::find()
            .filter(
                Condition::any()
                    .add(friendship::Column::UserLowId.eq(user_id))
                    .add(friendship::Column::UserHighId.eq(user_id)),
            )
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_friendship(id: &str, a: &str, b: &str) -> friendship::Model {
        let (low, high) = canonical_pair(a, b);
        friendship::Model {
            id: id.to_string(),
            user_low_id: low.to_string(),
            user_high_id: high.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_canonical_pair_orders_both_ways() {
        assert_eq!(canonical_pair("u1", "u2"), ("u1", "u2"));
        assert_eq!(canonical_pair("u2", "u1"), ("u1", "u2"));
    }

    #[tokio::test]
    async fn test_are_friends_symmetric() {
        let edge = create_test_friendship("f1", "u2", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[edge.clone()], [edge.clone()]])
                .into_connection(),
        );

        let repo = FriendshipRepository::new(db);
        assert!(repo.are_friends("u1", "u2").await.unwrap());
        assert!(repo.are_friends("u2", "u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_are_friends_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<friendship::Model>::new()])
                .into_connection(),
        );

        let repo = FriendshipRepository::new(db);
        assert!(!repo.are_friends("u1", "u3").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_pair_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = FriendshipRepository::new(db);
        let removed = repo.delete_by_pair("u2", "u1").await.unwrap();

        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_find_friend_ids_maps_other_side() {
        let e1 = create_test_friendship("f1", "u1", "u2");
        let e2 = create_test_friendship("f2", "u3", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[e1, e2]])
                .into_connection(),
        );

        let repo = FriendshipRepository::new(db);
        let ids = repo.find_friend_ids("u1").await.unwrap();

        assert_eq!(ids, vec!["u2".to_string(), "u3".to_string()]);
    }
}
